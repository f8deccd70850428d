//! sweepmap - parameter-sweep logs to sensitivity heatmaps
//!
//! Reads the plain-text result logs of two-parameter sensitivity sweeps,
//! groups the trial values per configuration, and renders one heatmap per
//! parameter family. Also charts per-step training metrics from CSV.
//!
//! # Architecture
//!
//! ```text
//! Log text → Section Split → Record Extraction → Grid Aggregation → Rendering
//!     ↓            ↓                ↓                   ↓               ↓
//!  UTF-8      two headers      regex + strict       mean per cell   plotters PNG
//!  string     in order         f64 parsing          Missing ≠ 0     or ANSI table
//! ```
//!
//! Parsing is all-or-nothing per input: any malformed record fails the whole
//! log with a typed [`FormatError`]. An empty family is a warning, not an
//! error.
//!
//! ```
//! let log = "Delta实验结果:\n\
//!            delta_min=1, delta_max=2: 平均值=0.5, 标准差=0.25, 值=[0.25, 0.75]\n\
//!            Epsilon实验结果:\n";
//! let (delta, epsilon) = sweepmap::parse(log).unwrap();
//! let grid = sweepmap::build_grid(&delta);
//! assert_eq!(grid.value_at(1.0, 2.0).value(), Some(0.5));
//! assert!(epsilon.is_empty());
//! ```

pub mod aggregation;
pub mod config;
pub mod error;
pub mod extraction;
pub mod rendering;
pub mod series;
pub mod types;

// Re-export core types
pub use types::{
    DuplicatePolicy, FamilyDataset, FamilySchema, LogSchema, ParamKey, ParsedLog, Record,
    ReportedStats, SourceLine,
};

pub use aggregation::{build_grid, Cell, Grid, GridCell};
pub use config::Config;
pub use error::{EmptyResultWarning, FormatError};
pub use extraction::{parse, LogParser};
pub use rendering::{FigureLabels, RenderConfig, TerminalRenderer};
pub use series::{SeriesSpec, SeriesTable};
