//! Record extraction from experiment logs.
//!
//! Parsing is two-phase:
//! - `split_sections`: locate the family headers named by a `LogSchema`
//! - `RecordExtractor`: scan one section for record lines of its family
//!
//! `LogParser` ties the two together and is the only entry point callers
//! normally need. It never reads files; callers hand it text.

mod parser;
mod records;
mod sections;

pub use parser::{parse, LogParser};
pub use records::RecordExtractor;
pub use sections::{split_sections, Section, Sections};
