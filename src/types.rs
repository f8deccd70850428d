//! Core types for sweepmap.
//!
//! The data flows through three shapes:
//! - `Record`: one parsed result line, keyed by its two swept parameters
//! - `FamilyDataset`: all records of one section of the log, unique per key
//! - `ParsedLog`: the two family datasets produced from one input text
//!
//! Parameter values are stored as `OrderedFloat<f64>` so that keys sort by
//! numeric value (`2 < 10`) and can live in ordered maps.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::EmptyResultWarning;

/// Composite key of a record: the two swept parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParamKey {
    pub axis1: OrderedFloat<f64>,
    pub axis2: OrderedFloat<f64>,
}

impl ParamKey {
    pub fn new(axis1: f64, axis2: f64) -> Self {
        Self {
            axis1: OrderedFloat(axis1),
            axis2: OrderedFloat(axis2),
        }
    }

    /// Key as a plain `(axis1, axis2)` tuple.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.axis1.into_inner(), self.axis2.into_inner())
    }
}

impl From<(f64, f64)> for ParamKey {
    fn from((axis1, axis2): (f64, f64)) -> Self {
        Self::new(axis1, axis2)
    }
}

/// Summary statistics as printed by the experiment producer.
///
/// Kept for diagnostics only. Aggregation always recomputes from the trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportedStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// One log line that contributed trial values to a record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceLine {
    /// 1-based line in the parsed input.
    pub line: usize,
    pub reported: ReportedStats,
    /// Number of trial values this line contributed.
    pub trials: usize,
}

/// One observed outcome: a parameter pair and its repeated trial values.
///
/// A record normally comes from a single line. Under
/// `DuplicatePolicy::Concatenate` it can span several; `sources` keeps one
/// entry per line, in the same order as their values in `trials`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: ParamKey,
    /// Repeated-run outcomes, in source order. Never empty.
    pub trials: Vec<f64>,
    pub sources: Vec<SourceLine>,
}

impl Record {
    /// A record read from a single line.
    pub fn new(key: ParamKey, trials: Vec<f64>, reported: ReportedStats, line: usize) -> Self {
        let sources = vec![SourceLine {
            line,
            reported,
            trials: trials.len(),
        }];
        Self {
            key,
            trials,
            sources,
        }
    }

    /// Line of the most recent contributing source.
    pub fn line(&self) -> usize {
        self.sources.last().map(|s| s.line).unwrap_or(0)
    }

    /// Each source line with the slice of `trials` it contributed.
    pub fn by_source(&self) -> impl Iterator<Item = (&SourceLine, &[f64])> {
        let mut start = 0;
        self.sources.iter().map(move |source| {
            let end = (start + source.trials).min(self.trials.len());
            let slice = &self.trials[start.min(end)..end];
            start = end;
            (source, slice)
        })
    }

    pub fn axis1(&self) -> f64 {
        self.key.axis1.into_inner()
    }

    pub fn axis2(&self) -> f64 {
        self.key.axis2.into_inner()
    }
}

/// What to do when a family section contains the same key twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later record replaces the earlier one entirely.
    #[default]
    LastWins,
    /// Trial values of the later record are appended to the earlier one.
    Concatenate,
}

/// All records of one family, unique by `ParamKey`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyDataset {
    /// Family name, e.g. "Delta".
    pub family: String,
    records: BTreeMap<ParamKey, Record>,
}

impl FamilyDataset {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            records: BTreeMap::new(),
        }
    }

    /// Insert a record under the given duplicate policy.
    ///
    /// Returns the line of the record that was already stored under the same
    /// key, if any.
    pub fn insert(&mut self, record: Record, policy: DuplicatePolicy) -> Option<usize> {
        match self.records.get_mut(&record.key) {
            Some(existing) => {
                let previous_line = existing.line();
                match policy {
                    DuplicatePolicy::LastWins => *existing = record,
                    DuplicatePolicy::Concatenate => {
                        existing.trials.extend(record.trials);
                        existing.sources.extend(record.sources);
                    }
                }
                Some(previous_line)
            }
            None => {
                self.records.insert(record.key, record);
                None
            }
        }
    }

    pub fn get(&self, key: &ParamKey) -> Option<&Record> {
        self.records.get(key)
    }

    /// Trial values stored for `(axis1, axis2)`.
    pub fn trials(&self, axis1: f64, axis2: f64) -> Option<&[f64]> {
        self.records
            .get(&ParamKey::new(axis1, axis2))
            .map(|r| r.trials.as_slice())
    }

    /// Records in ascending key order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ParamKey> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Schema of one family section in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FamilySchema {
    /// Display name ("Delta").
    pub name: String,
    /// Literal header line that opens the section ("Delta实验结果:").
    pub header: String,
    /// Record key for the row axis ("delta_min").
    pub key1: String,
    /// Record key for the column axis ("delta_max").
    pub key2: String,
    /// Figure title handed to the renderer.
    pub title: String,
    /// Column axis label, may contain TeX math.
    pub x_label: String,
    /// Row axis label, may contain TeX math.
    pub y_label: String,
}

impl FamilySchema {
    pub fn delta() -> Self {
        Self {
            name: "Delta".to_string(),
            header: "Delta实验结果:".to_string(),
            key1: "delta_min".to_string(),
            key2: "delta_max".to_string(),
            title: "Delta Parameter Sensitivity".to_string(),
            x_label: r"$\boldsymbol{\delta_{max}}$".to_string(),
            y_label: r"$\boldsymbol{\delta_{min}}$".to_string(),
        }
    }

    pub fn epsilon() -> Self {
        Self {
            name: "Epsilon".to_string(),
            header: "Epsilon实验结果:".to_string(),
            key1: "eps_min".to_string(),
            key2: "eps_max".to_string(),
            title: "Epsilon Parameter Sensitivity".to_string(),
            x_label: r"$\boldsymbol{\varepsilon_{max}}$".to_string(),
            y_label: r"$\boldsymbol{\varepsilon_{min}}$".to_string(),
        }
    }

    /// Variant of this schema for logs that sweep `<prefix>_step` instead of
    /// `<prefix>_max` on the column axis.
    pub fn with_step_axis(mut self) -> Self {
        if let Some(prefix) = self.key2.strip_suffix("_max") {
            self.key2 = format!("{prefix}_step");
        }
        self.x_label = self.x_label.replace("{max}", "{step}");
        self
    }
}

/// The pair of families a log file is split into, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSchema {
    pub first: FamilySchema,
    pub second: FamilySchema,
}

impl Default for LogSchema {
    fn default() -> Self {
        Self {
            first: FamilySchema::delta(),
            second: FamilySchema::epsilon(),
        }
    }
}

/// Result of parsing one log: one dataset per family.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    pub first: FamilyDataset,
    pub second: FamilyDataset,
}

impl ParsedLog {
    /// One warning per family section that yielded no records.
    pub fn warnings(&self) -> Vec<EmptyResultWarning> {
        [&self.first, &self.second]
            .into_iter()
            .filter(|d| d.is_empty())
            .map(|d| EmptyResultWarning {
                family: d.family.clone(),
            })
            .collect()
    }

    pub fn families(&self) -> [&FamilyDataset; 2] {
        [&self.first, &self.second]
    }

    pub fn into_pair(self) -> (FamilyDataset, FamilyDataset) {
        (self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(axis1: f64, axis2: f64, trials: &[f64], line: usize) -> Record {
        Record::new(
            ParamKey::new(axis1, axis2),
            trials.to_vec(),
            ReportedStats { mean: 0.0, std_dev: 0.0 },
            line,
        )
    }

    #[test]
    fn test_param_key_orders_numerically() {
        let mut keys = vec![
            ParamKey::new(10.0, 1.0),
            ParamKey::new(2.0, 1.0),
            ParamKey::new(1.0, 1.0),
        ];
        keys.sort();
        let axis1: Vec<f64> = keys.iter().map(|k| k.as_tuple().0).collect();
        assert_eq!(axis1, vec![1.0, 2.0, 10.0]);
    }

    #[test]
    fn test_insert_last_wins() {
        let mut ds = FamilyDataset::new("Delta");
        assert_eq!(ds.insert(record(1.0, 2.0, &[0.1], 2), DuplicatePolicy::LastWins), None);
        assert_eq!(
            ds.insert(record(1.0, 2.0, &[0.9, 0.8], 5), DuplicatePolicy::LastWins),
            Some(2)
        );
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.trials(1.0, 2.0), Some(&[0.9, 0.8][..]));
        assert_eq!(ds.get(&ParamKey::new(1.0, 2.0)).unwrap().line(), 5);
    }

    #[test]
    fn test_insert_concatenate() {
        let mut ds = FamilyDataset::new("Delta");
        ds.insert(record(1.0, 2.0, &[0.1], 2), DuplicatePolicy::Concatenate);
        ds.insert(record(1.0, 2.0, &[0.3], 3), DuplicatePolicy::Concatenate);
        assert_eq!(ds.trials(1.0, 2.0), Some(&[0.1, 0.3][..]));

        let rec = ds.get(&ParamKey::new(1.0, 2.0)).unwrap();
        let lines: Vec<usize> = rec.sources.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 3]);
        let slices: Vec<&[f64]> = rec.by_source().map(|(_, t)| t).collect();
        assert_eq!(slices, vec![&[0.1][..], &[0.3][..]]);
    }

    #[test]
    fn test_last_wins_drops_earlier_sources() {
        let mut ds = FamilyDataset::new("Delta");
        ds.insert(record(1.0, 2.0, &[0.1], 2), DuplicatePolicy::LastWins);
        ds.insert(record(1.0, 2.0, &[0.3, 0.4], 6), DuplicatePolicy::LastWins);
        let rec = ds.get(&ParamKey::new(1.0, 2.0)).unwrap();
        assert_eq!(rec.sources.len(), 1);
        assert_eq!(rec.sources[0].trials, 2);
    }

    #[test]
    fn test_with_step_axis() {
        let schema = FamilySchema::delta().with_step_axis();
        assert_eq!(schema.key2, "delta_step");
        assert!(schema.x_label.contains("{step}"));
    }

    #[test]
    fn test_warnings_for_empty_families() {
        let mut first = FamilyDataset::new("Delta");
        first.insert(record(1.0, 1.0, &[1.0], 1), DuplicatePolicy::LastWins);
        let log = ParsedLog {
            first,
            second: FamilyDataset::new("Epsilon"),
        };
        let warnings = log.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].family, "Epsilon");
    }
}
