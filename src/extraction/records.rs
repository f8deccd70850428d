//! Per-family record extraction.
//!
//! Record lines look like
//!
//! ```text
//! delta_min=1, delta_max=2: 平均值=0.50, 标准差=0.10, 值=[0.4, 0.5, 0.6]
//! ```
//!
//! The pattern captures loose tokens and the numbers are parsed afterwards,
//! so that `delta_min=abc, ...` is reported as an error rather than being
//! silently skipped.

use regex::Regex;
use tracing::debug;

use super::sections::Section;
use crate::error::FormatError;
use crate::types::{DuplicatePolicy, FamilyDataset, FamilySchema, ParamKey, Record, ReportedStats};

const MEAN_FIELD: &str = "平均值";
const STD_FIELD: &str = "标准差";
const TRIALS_FIELD: &str = "值";

/// Extracts records for one family from its section text.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    family: String,
    key1: String,
    key2: String,
    pattern: Regex,
}

/// Build the record regex for a pair of key names.
fn record_pattern(key1: &str, key2: &str) -> Result<Regex, regex::Error> {
    // ASCII-only boundary: a key directly after CJK text still matches.
    let boundary = |key: &str| {
        if key.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
            r"(?-u:\b)"
        } else {
            ""
        }
    };
    let pattern = format!(
        r"{b1}{k1}=(?P<axis1>[^,:\s]+),\s*{k2}=(?P<axis2>[^,:\s]+):\s*{mean}=(?P<mean>[^,\s]+),\s*{std}=(?P<std>[^,\s]+),\s*{trials}=\[(?P<trials>[^\]\n]*)\]",
        b1 = boundary(key1),
        k1 = regex::escape(key1),
        k2 = regex::escape(key2),
        mean = MEAN_FIELD,
        std = STD_FIELD,
        trials = TRIALS_FIELD,
    );
    Regex::new(&pattern)
}

impl RecordExtractor {
    pub fn new(schema: &FamilySchema) -> Result<Self, regex::Error> {
        Ok(Self {
            family: schema.name.clone(),
            key1: schema.key1.clone(),
            key2: schema.key2.clone(),
            pattern: record_pattern(&schema.key1, &schema.key2)?,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Scan a section left to right and collect every record.
    ///
    /// Zero matches yields an empty dataset. The first malformed number
    /// aborts the whole extraction.
    pub fn extract(
        &self,
        section: &Section<'_>,
        duplicates: DuplicatePolicy,
    ) -> Result<FamilyDataset, FormatError> {
        let mut dataset = FamilyDataset::new(self.family.clone());

        for cap in self.pattern.captures_iter(section.text) {
            let start = cap.get(0).map(|m| m.start()).unwrap_or(0);
            let line = section.line_of(start);

            let axis1 = self.number(&cap["axis1"], &self.key1, line)?;
            let axis2 = self.number(&cap["axis2"], &self.key2, line)?;
            let mean = self.number(&cap["mean"], MEAN_FIELD, line)?;
            let std_dev = self.number(&cap["std"], STD_FIELD, line)?;
            let trials = self.trial_values(&cap["trials"], line)?;

            let record = Record::new(
                ParamKey::new(axis1, axis2),
                trials,
                ReportedStats { mean, std_dev },
                line,
            );

            if let Some(previous) = dataset.insert(record, duplicates) {
                debug!(
                    family = %self.family,
                    axis1,
                    axis2,
                    previous_line = previous,
                    line,
                    policy = ?duplicates,
                    "duplicate record key"
                );
            }
        }

        Ok(dataset)
    }

    fn number(&self, token: &str, field: &str, line: usize) -> Result<f64, FormatError> {
        token
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| FormatError::InvalidNumber {
                family: self.family.clone(),
                line,
                field: field.to_string(),
                token: token.to_string(),
            })
    }

    fn trial_values(&self, list: &str, line: usize) -> Result<Vec<f64>, FormatError> {
        if list.trim().is_empty() {
            return Err(FormatError::EmptyTrialList {
                family: self.family.clone(),
                line,
            });
        }
        list.split(',')
            .map(|token| self.number(token, TRIALS_FIELD, line))
            .collect()
    }
}
