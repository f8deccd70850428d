//! Log parser: section splitting followed by per-family record extraction.

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use super::records::RecordExtractor;
use super::sections::split_sections;
use crate::error::FormatError;
use crate::types::{DuplicatePolicy, FamilyDataset, LogSchema, ParsedLog};

/// Parser for one log layout. Stateless between calls.
#[derive(Debug, Clone)]
pub struct LogParser {
    schema: LogSchema,
    duplicates: DuplicatePolicy,
    first: RecordExtractor,
    second: RecordExtractor,
}

impl LogParser {
    pub fn new(schema: LogSchema) -> Result<Self, regex::Error> {
        let first = RecordExtractor::new(&schema.first)?;
        let second = RecordExtractor::new(&schema.second)?;
        Ok(Self {
            schema,
            duplicates: DuplicatePolicy::default(),
            first,
            second,
        })
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn schema(&self) -> &LogSchema {
        &self.schema
    }

    /// Parse a whole log into its two family datasets.
    ///
    /// Any malformed record fails the entire call.
    pub fn parse(&self, text: &str) -> Result<ParsedLog, FormatError> {
        let sections = split_sections(text, &self.schema)?;

        let first = self.first.extract(&sections.first, self.duplicates)?;
        let second = self.second.extract(&sections.second, self.duplicates)?;

        let log = ParsedLog { first, second };
        for family in log.families() {
            debug!(family = %family.family, records = family.len(), "parsed family section");
        }
        for warning in log.warnings() {
            warn!(family = %warning.family, "{}", warning);
        }
        Ok(log)
    }
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new(LogSchema::default()).expect("Invalid default record regex")
    }
}

static DEFAULT_PARSER: Lazy<LogParser> = Lazy::new(LogParser::default);

/// Parse a log with the default Delta/Epsilon layout.
pub fn parse(text: &str) -> Result<(FamilyDataset, FamilyDataset), FormatError> {
    DEFAULT_PARSER.parse(text).map(ParsedLog::into_pair)
}
