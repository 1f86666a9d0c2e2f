//! Patch engine: locate triple-quoted literal regions and rewrite files.

pub mod errors;
pub mod locate;
pub mod script;

pub use errors::PatchError;
pub use locate::{apply_update, locate_literal_region, Region};
pub use script::{showpath, Mode, Script, UpdateNotice};
