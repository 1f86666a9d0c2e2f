//! Property test: the literal representation is a two-way-consistent encoding.
//!
//! For any input whose transformed form does not contain both triple-quote
//! styles, rendering the replacement literal, splicing it into a source line,
//! locating it again, and canonicalizing the located body must recover the
//! transformed text exactly.

use baseliner::canon;
use baseliner::patch::locate_literal_region;
use baseliner::reprs::{self, Flavor, DOUBLE, SINGLE};
use proptest::prelude::*;

fn representable(text: &str) -> bool {
    let transformed = Flavor::Plain.apply(text);
    !(transformed.contains(DOUBLE) && transformed.contains(SINGLE))
}

proptest! {
    #[test]
    fn representation_round_trips(input in ".{0,80}") {
        prop_assume!(representable(&input));

        let transformed = Flavor::Plain.apply(&input);
        let rep = reprs::delimiter_safe(transformed.clone()).unwrap();
        let literal = reprs::render_literal(&rep, false);

        // Embed the literal the way a flush would: after a prefix, before a
        // suffix, on whatever lines the block form needs.
        let source = format!("let value = check({literal});");
        let lines: Vec<String> = source.split('\n').map(String::from).collect();

        let region = locate_literal_region(&lines, lines.len() as u32)
            .expect("generated literal must be locatable");
        prop_assert_eq!(region.delim, rep.delim);

        let canonical = canon::dedent(&region.body)
            .expect("generated literal must canonicalize");
        prop_assert_eq!(canonical.text, transformed);
    }

    #[test]
    fn transforms_are_idempotent(input in ".{0,80}") {
        let once = Flavor::Plain.apply(&input);
        let twice = Flavor::Plain.apply(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn stripped_transform_is_idempotent(input in ".{0,80}") {
        let once = Flavor::Stripped.apply(&input);
        let twice = Flavor::Stripped.apply(&once);
        prop_assert_eq!(once, twice);
    }
}
