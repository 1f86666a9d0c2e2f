//! Baseliner: self-updating baselined text assertions
//!
//! Baselined expectations are multi-line strings embedded in source files as
//! raw triple-quoted literals. Comparing a candidate string against one is an
//! ordinary boolean test; when it mismatches, the observed value is recorded
//! and a flush step regenerates the literal and splices it back into the file
//! that declared it (in place, or beside it as a `.update` proposal for
//! review).
//!
//! # Architecture
//!
//! Three components: the [`Registry`] binds each call site to a single
//! [`Baseline`] expectation, the comparator turns candidates into
//! delimiter-safe representations and tests exact equality, and the
//! [`patch`] engine locates the literal region at the recorded location and
//! rewrites the file. Comparison mismatches are plain `false` results; only
//! structural errors (malformed literals, identity conflicts, unrepresentable
//! text, stale locations) raise.
//!
//! # Example
//!
//! ```no_run
//! use baseliner::{baseline, patch::Mode, Registry};
//!
//! let greeting = baseline!(r#"Hello, world!"#);
//! assert!(greeting == "Hello, world!");
//!
//! // End of suite: write .update proposals for any mismatches.
//! for notice in Registry::global().flush_and_write(Mode::Copy)? {
//!     println!("UPDATE: {notice}");
//! }
//! # Ok::<(), baseliner::FlushError>(())
//! ```

pub mod baseline;
pub mod canon;
pub mod patch;
pub mod registry;
pub mod reprs;

// Re-exports
pub use baseline::Baseline;
pub use canon::{dedent, Canonical, FormatError};
pub use patch::{Mode, PatchError, Script, UpdateNotice};
pub use registry::{FlushError, FlushGuard, Location, Registry, RegistryError};
pub use reprs::{Flavor, ReprError};
