//! Dense grid of per-configuration means.
//!
//! Rows are the distinct `axis1` values of a dataset, columns the distinct
//! `axis2` values, both ascending by numeric value. A cell with no record is
//! `Cell::Missing`; it is never defaulted to zero.

use std::collections::BTreeSet;

use ordered_float::OrderedFloat;
use serde::Serialize;

use super::stats::mean;
use crate::types::FamilyDataset;

/// State of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum Cell {
    /// Mean of the trial values recorded for this configuration.
    Present(f64),
    /// No record exists for this configuration.
    Missing,
}

impl Cell {
    pub fn value(self) -> Option<f64> {
        match self {
            Cell::Present(v) => Some(v),
            Cell::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, Cell::Missing)
    }
}

/// One cell together with its position and axis keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub row_key: f64,
    pub col_key: f64,
    pub cell: Cell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    family: String,
    rows: Vec<f64>,
    cols: Vec<f64>,
    /// Row-major, `rows.len() * cols.len()` entries.
    cells: Vec<Cell>,
}

/// Aggregate a family dataset into a dense grid.
///
/// Pure and deterministic: the same dataset always yields an identical grid.
/// An empty dataset yields an empty grid.
pub fn build_grid(dataset: &FamilyDataset) -> Grid {
    let rows: BTreeSet<OrderedFloat<f64>> = dataset.keys().map(|k| k.axis1).collect();
    let cols: BTreeSet<OrderedFloat<f64>> = dataset.keys().map(|k| k.axis2).collect();
    let rows: Vec<f64> = rows.into_iter().map(OrderedFloat::into_inner).collect();
    let cols: Vec<f64> = cols.into_iter().map(OrderedFloat::into_inner).collect();

    let mut grid = Grid {
        family: dataset.family.clone(),
        cells: vec![Cell::Missing; rows.len() * cols.len()],
        rows,
        cols,
    };

    for record in dataset.records() {
        // Records always carry at least one trial.
        let Some(avg) = mean(&record.trials) else {
            continue;
        };
        if let (Some(r), Some(c)) = (grid.row_index(record.axis1()), grid.col_index(record.axis2())) {
            let idx = r * grid.cols.len() + c;
            grid.cells[idx] = Cell::Present(avg);
        }
    }

    grid
}

fn position(keys: &[f64], key: f64) -> Option<usize> {
    keys.binary_search_by(|k| OrderedFloat(*k).cmp(&OrderedFloat(key)))
        .ok()
}

impl Grid {
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Sorted distinct `axis1` values.
    pub fn row_keys(&self) -> &[f64] {
        &self.rows
    }

    /// Sorted distinct `axis2` values.
    pub fn col_keys(&self) -> &[f64] {
        &self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn row_index(&self, row: f64) -> Option<usize> {
        position(&self.rows, row)
    }

    pub fn col_index(&self, col: f64) -> Option<usize> {
        position(&self.cols, col)
    }

    /// Cell for the `(row, col)` parameter pair. Keys outside the axes are
    /// reported as missing.
    pub fn value_at(&self, row: f64, col: f64) -> Cell {
        match (self.row_index(row), self.col_index(col)) {
            (Some(r), Some(c)) => self.cell(r, c),
            _ => Cell::Missing,
        }
    }

    /// Cell by index. Out-of-range indices are reported as missing.
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        if row >= self.rows.len() || col >= self.cols.len() {
            return Cell::Missing;
        }
        self.cells[row * self.cols.len() + col]
    }

    /// All cells in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        let ncols = self.cols.len();
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let (row, col) = (i / ncols, i % ncols);
            GridCell {
                row,
                col,
                row_key: self.rows[row],
                col_key: self.cols[col],
                cell: *cell,
            }
        })
    }

    /// Min and max over present cells.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .filter_map(|c| c.value())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn present_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_missing()).count()
    }

    /// Fraction of cells that are present. 0.0 for an empty grid.
    pub fn coverage(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.present_count() as f64 / self.cells.len() as f64
    }

    /// Rows of optional values, `None` where a cell is missing.
    pub fn to_matrix(&self) -> Vec<Vec<Option<f64>>> {
        (0..self.rows.len())
            .map(|r| (0..self.cols.len()).map(|c| self.cell(r, c).value()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DuplicatePolicy, ParamKey, Record, ReportedStats};

    fn dataset(entries: &[((f64, f64), &[f64])]) -> FamilyDataset {
        let mut ds = FamilyDataset::new("Delta");
        for (i, ((a1, a2), trials)) in entries.iter().enumerate() {
            ds.insert(
                Record::new(
                    ParamKey::new(*a1, *a2),
                    trials.to_vec(),
                    ReportedStats { mean: 0.0, std_dev: 0.0 },
                    i + 1,
                ),
                DuplicatePolicy::LastWins,
            );
        }
        ds
    }

    #[test]
    fn test_mean_cell() {
        let grid = build_grid(&dataset(&[((1.0, 1.0), &[1.0, 2.0, 3.0])]));
        let v = grid.value_at(1.0, 1.0).value().unwrap();
        assert!((v - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_axis_order() {
        let grid = build_grid(&dataset(&[
            ((10.0, 10.0), &[1.0]),
            ((1.0, 2.0), &[1.0]),
            ((2.0, 1.0), &[1.0]),
        ]));
        assert_eq!(grid.row_keys(), &[1.0, 2.0, 10.0]);
        assert_eq!(grid.col_keys(), &[1.0, 2.0, 10.0]);
    }

    #[test]
    fn test_missing_cell_is_not_zero() {
        let grid = build_grid(&dataset(&[
            ((1.0, 1.0), &[0.5]),
            ((1.0, 2.0), &[0.5]),
            ((2.0, 1.0), &[0.5]),
        ]));
        assert_eq!(grid.shape(), (2, 2));
        assert_eq!(grid.value_at(2.0, 2.0), Cell::Missing);
        assert_ne!(grid.value_at(2.0, 2.0), Cell::Present(0.0));
        assert_eq!(grid.present_count(), 3);
        assert!((grid.coverage() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_keys_are_missing() {
        let grid = build_grid(&dataset(&[((1.0, 1.0), &[0.5])]));
        assert_eq!(grid.value_at(7.0, 1.0), Cell::Missing);
        assert_eq!(grid.cell(3, 3), Cell::Missing);
    }

    #[test]
    fn test_empty_dataset_gives_empty_grid() {
        let grid = build_grid(&FamilyDataset::new("Epsilon"));
        assert!(grid.is_empty());
        assert_eq!(grid.shape(), (0, 0));
        assert!(grid.row_keys().is_empty());
        assert!(grid.col_keys().is_empty());
        assert_eq!(grid.value_range(), None);
        assert_eq!(grid.coverage(), 0.0);
        assert_eq!(grid.iter_cells().count(), 0);
    }

    #[test]
    fn test_build_grid_is_idempotent() {
        let ds = dataset(&[
            ((1.0, 2.0), &[0.1, 0.2]),
            ((3.0, 4.0), &[0.7]),
            ((0.5, 2.0), &[0.33, 0.34, 0.35]),
        ]);
        let a = build_grid(&ds);
        let b = build_grid(&ds);
        assert_eq!(a, b);
        let bits = |g: &Grid| -> Vec<Option<u64>> {
            g.iter_cells().map(|c| c.cell.value().map(f64::to_bits)).collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_value_range_and_iteration() {
        let grid = build_grid(&dataset(&[((1.0, 1.0), &[0.2]), ((2.0, 2.0), &[0.8])]));
        assert_eq!(grid.value_range(), Some((0.2, 0.8)));
        let cells: Vec<_> = grid.iter_cells().collect();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[1].row_key, 1.0);
        assert_eq!(cells[1].col_key, 2.0);
        assert!(cells[1].cell.is_missing());
        assert_eq!(
            grid.to_matrix(),
            vec![vec![Some(0.2), None], vec![None, Some(0.8)]]
        );
    }

    #[test]
    fn test_scenario_grid() {
        let (delta, _) = crate::extraction::parse(
            "Delta实验结果:
delta_min=1, delta_max=2: 平均值=0.50, 标准差=0.10, 值=[0.4, 0.5, 0.6]
Epsilon实验结果:
eps_min=0.1, eps_max=0.2: 平均值=0.05, 标准差=0.01, 值=[0.04, 0.05, 0.06]
",
        )
        .unwrap();
        let grid = build_grid(&delta);
        assert_eq!(grid.shape(), (1, 1));
        let v = grid.value_at(1.0, 2.0).value().unwrap();
        assert!((v - 0.5).abs() < 1e-9);
    }
}
