//! Time-series tables for line charts.
//!
//! Training runs dump per-step metrics as CSV (`epoch,L_t,dot_L,delta`).
//! The row index is the x axis; each selected column becomes one line.
//! Empty cells are gaps, not zeros.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Column that holds the epoch counter; never plotted by default.
pub const EPOCH_COLUMN: &str = "epoch";

/// Rows kept by default when charting a series.
pub const DEFAULT_ROW_LIMIT: usize = 400;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    /// `(row_index, value)` points, skipping gaps.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
    }

    /// Contiguous runs of present values, one line segment each.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (i, v) in self.values.iter().enumerate() {
            match v {
                Some(v) => current.push((i as f64, *v)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// Named numeric columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesTable {
    columns: Vec<Column>,
    rows: usize,
}

impl SeriesTable {
    /// Load a CSV with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = rdr.headers().context("reading CSV header")?.clone();
        if headers.is_empty() {
            bail!("CSV has no header row");
        }
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|name| Column {
                name: name.to_string(),
                values: Vec::new(),
            })
            .collect();

        let mut rows = 0;
        for (row, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("reading CSV row {}", row + 1))?;
            for (col, field) in record.iter().enumerate() {
                let value = if field.is_empty() {
                    None
                } else {
                    match field.parse::<f64>() {
                        Ok(v) => Some(v),
                        Err(_) => bail!(
                            "row {}, column {:?}: {:?} is not a number",
                            row + 1,
                            columns[col].name,
                            field
                        ),
                    }
                };
                columns[col].values.push(value);
            }
            rows += 1;
        }

        Ok(Self { columns, rows })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Keep only the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        for column in &mut self.columns {
            column.values.truncate(n);
        }
        self.rows = self.rows.min(n);
    }

    /// Requested columns in the requested order. Unknown names are skipped.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Vec<&Column> {
        names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let column = self.column(name);
                if column.is_none() {
                    warn!(column = name, "column not present in series table, skipping");
                }
                column
            })
            .collect()
    }

    /// Every column except the epoch counter.
    pub fn plottable(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.name != EPOCH_COLUMN).collect()
    }
}

/// Which columns to chart and how to label them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SeriesSpec {
    /// Rows to keep from the start of the table.
    pub limit: Option<usize>,
    /// Columns to plot, in legend order.
    pub columns: Vec<String>,
    /// Legend label per column, may contain TeX math.
    pub labels: BTreeMap<String, String>,
    pub x_label: String,
}

impl Default for SeriesSpec {
    fn default() -> Self {
        let labels = [("L_t", r"$L_t$"), ("dot_L", r"$\dot{L}$"), ("delta", r"$\delta$")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            limit: Some(DEFAULT_ROW_LIMIT),
            columns: vec!["L_t".into(), "dot_L".into(), "delta".into()],
            labels,
            x_label: "Step".to_string(),
        }
    }
}

impl SeriesSpec {
    /// Legend label for a column; falls back to the column name.
    pub fn label_for<'a>(&'a self, column: &'a str) -> &'a str {
        self.labels.get(column).map(String::as_str).unwrap_or(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "epoch,L_t,dot_L,delta\n0,1.0,0.5,0.1\n0,0.9,,0.2\n1,0.8,0.3,0.3\n";

    #[test]
    fn test_load_csv() {
        let table = SeriesTable::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["epoch", "L_t", "dot_L", "delta"]);
        assert_eq!(table.column("dot_L").unwrap().values, vec![Some(0.5), None, Some(0.3)]);
    }

    #[test]
    fn test_non_numeric_cell_is_error() {
        let err = SeriesTable::from_reader("a,b\n1,x\n".as_bytes()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("row 1"));
        assert!(msg.contains("\"b\""));
    }

    #[test]
    fn test_truncate_and_select() {
        let mut table = SeriesTable::from_reader(CSV.as_bytes()).unwrap();
        table.truncate(2);
        assert_eq!(table.len(), 2);
        let cols = table.select(&["delta", "missing", "L_t"]);
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["delta", "L_t"]);
        assert_eq!(cols[0].values, vec![Some(0.1), Some(0.2)]);
    }

    #[test]
    fn test_plottable_excludes_epoch() {
        let table = SeriesTable::from_reader(CSV.as_bytes()).unwrap();
        assert!(table.plottable().iter().all(|c| c.name != EPOCH_COLUMN));
        assert_eq!(table.plottable().len(), 3);
    }

    #[test]
    fn test_segments_split_on_gaps() {
        let column = Column {
            name: "x".into(),
            values: vec![Some(1.0), None, Some(2.0), Some(3.0), None],
        };
        assert_eq!(
            column.segments(),
            vec![vec![(0.0, 1.0)], vec![(2.0, 2.0), (3.0, 3.0)]]
        );
        assert_eq!(column.points().count(), 3);
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let table = SeriesTable::from_path(file.path()).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_default_spec_labels() {
        let spec = SeriesSpec::default();
        assert_eq!(spec.label_for("dot_L"), r"$\dot{L}$");
        assert_eq!(spec.label_for("other"), "other");
        assert_eq!(spec.limit, Some(400));
    }
}
