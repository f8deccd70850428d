//! Aggregation of family datasets into dense grids.

pub mod audit;
mod grid;
pub mod stats;

pub use audit::{audit, Discrepancy, Statistic};
pub use grid::{build_grid, Cell, Grid, GridCell};
