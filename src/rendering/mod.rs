//! Output rendering - from grids and series to figures and text.
//!
//! Supports three outputs:
//! - Terminal tables: a grid as aligned, optionally colored text
//! - Heatmaps: annotated PNG of a grid (plotters feature)
//! - Line charts: PNG of selected series columns (plotters feature)
//!
//! Every renderer takes a `RenderConfig` argument; there is no process-wide
//! rendering state.

mod colors;
#[cfg(feature = "plotters")]
mod fonts;
mod heatmap;
mod label;
mod lines;
mod terminal;

use serde::{Deserialize, Serialize};

use crate::types::FamilySchema;

pub use colors::{heat, line_color, normalize, Colorizer, Rgb, LINE_PALETTE, MISSING_FILL};
pub use heatmap::render_heatmap;
pub use label::typeset;
pub use lines::render_series;
pub use terminal::TerminalRenderer;

/// Figure appearance, passed explicitly to every renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    /// Generic family used when no fallback font is usable ("serif").
    pub font_family: String,
    /// Preferred fonts, tried in order.
    pub serif_fallback_chain: Vec<String>,
    /// Flatten TeX math in labels to Unicode.
    pub use_math_typesetting: bool,
    /// Bold text for titles, labels and annotations.
    pub bold_weight: bool,
    pub heatmap_width: u32,
    pub heatmap_height: u32,
    pub lines_width: u32,
    pub lines_height: u32,
    /// Print the value inside each heatmap cell.
    pub annotate: bool,
    /// Decimal places for annotations and table values.
    pub precision: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_family: "serif".to_string(),
            serif_fallback_chain: [
                "Linux Libertine",
                "Palatino",
                "Charter",
                "Georgia",
                "Garamond",
                "DejaVu Serif",
                "serif",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            use_math_typesetting: true,
            bold_weight: true,
            heatmap_width: 1800,
            heatmap_height: 1400,
            lines_width: 1600,
            lines_height: 800,
            annotate: true,
            precision: 2,
        }
    }
}

impl RenderConfig {
    /// Typeset a label according to this config.
    pub fn label(&self, raw: &str) -> String {
        typeset(raw, self.use_math_typesetting)
    }

    /// Format a value with the configured precision.
    pub fn format_value(&self, value: f64) -> String {
        format!("{:.*}", self.precision, value)
    }

    /// Font candidates in preference order, ending with the generic family.
    pub fn font_candidates(&self) -> impl Iterator<Item = &str> {
        self.serif_fallback_chain
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.font_family.as_str()))
    }
}

/// Title and axis labels for one figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureLabels {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl From<&FamilySchema> for FigureLabels {
    fn from(schema: &FamilySchema) -> Self {
        Self {
            title: schema.title.clone(),
            x_label: schema.x_label.clone(),
            y_label: schema.y_label.clone(),
        }
    }
}

/// Output file name for a figure title: lowercased, spaces to underscores.
pub fn figure_file_name(title: &str, extension: &str) -> String {
    format!("{}.{}", title.to_lowercase().replace(' ', "_"), extension)
}

/// Format an axis key without trailing zeros (`2`, `0.25`).
pub fn format_key(key: f64) -> String {
    format!("{key}")
}
