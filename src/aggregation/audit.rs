//! Cross-check of producer-reported statistics against the trial values.
//!
//! The log producer prints its own mean and standard deviation next to each
//! trial list. Those numbers are never used for plotting, but a mismatch
//! usually means the list was truncated or edited by hand, so the summary
//! command reports them.

use serde::Serialize;

use super::stats::{mean, std_dev};
use crate::types::{FamilyDataset, Record};

/// Producers print two decimals, so anything within half a unit agrees.
pub const DEFAULT_TOLERANCE: f64 = 5e-3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    pub axis1: f64,
    pub axis2: f64,
    pub line: usize,
    pub statistic: Statistic,
    pub reported: f64,
    pub recomputed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Statistic {
    Mean,
    StdDev,
}

impl Discrepancy {
    pub fn delta(&self) -> f64 {
        (self.reported - self.recomputed).abs()
    }
}

/// Source lines whose reported mean or (population) std dev differ from the
/// values recomputed over that line's own trials by more than `tolerance`.
pub fn audit(dataset: &FamilyDataset, tolerance: f64) -> Vec<Discrepancy> {
    dataset
        .records()
        .flat_map(|record| check(record, tolerance))
        .collect()
}

fn check(record: &Record, tolerance: f64) -> Vec<Discrepancy> {
    let mut found = Vec::new();
    for (source, trials) in record.by_source() {
        let checks = [
            (Statistic::Mean, source.reported.mean, mean(trials)),
            (Statistic::StdDev, source.reported.std_dev, std_dev(trials)),
        ];
        for (statistic, reported, recomputed) in checks {
            let Some(recomputed) = recomputed else { continue };
            if (reported - recomputed).abs() > tolerance {
                found.push(Discrepancy {
                    axis1: record.axis1(),
                    axis2: record.axis2(),
                    line: source.line,
                    statistic,
                    reported,
                    recomputed,
                });
            }
        }
    }
    found
}
