//! Grid rendering as an aligned text table.
//!
//! ```text
//! Delta Parameter Sensitivity
//! δₘᵢₙ \ δₘₐₓ       2      3
//!           1    0.50   0.61
//!           2       ·   0.72
//! ```

use owo_colors::OwoColorize;

use super::colors::{normalize, Colorizer};
use super::{format_key, FigureLabels, RenderConfig};
use crate::aggregation::{Cell, Grid};

const MISSING_MARK: &str = "·";

pub struct TerminalRenderer {
    config: RenderConfig,
    color: bool,
}

impl TerminalRenderer {
    pub fn new(config: RenderConfig, color: bool) -> Self {
        Self { config, color }
    }

    /// Render `grid` as a table. An empty grid renders a one-line notice.
    pub fn render(&self, grid: &Grid, labels: &FigureLabels) -> String {
        let title = if self.color {
            Colorizer::header(&labels.title)
        } else {
            labels.title.clone()
        };
        let mut lines = vec![title];

        if grid.is_empty() {
            lines.push(format!("  (no data for {})", grid.family()));
            return lines.join("\n");
        }

        let corner = format!(
            "{} \\ {}",
            self.config.label(&labels.y_label),
            self.config.label(&labels.x_label)
        );
        let col_heads: Vec<String> = grid.col_keys().iter().map(|k| format_key(*k)).collect();
        let row_heads: Vec<String> = grid.row_keys().iter().map(|k| format_key(*k)).collect();

        let mut values: Vec<Vec<String>> = Vec::with_capacity(row_heads.len());
        for r in 0..row_heads.len() {
            values.push(
                (0..col_heads.len())
                    .map(|c| match grid.cell(r, c) {
                        Cell::Present(v) => self.config.format_value(v),
                        Cell::Missing => MISSING_MARK.to_string(),
                    })
                    .collect(),
            );
        }

        let head_width = row_heads
            .iter()
            .map(|s| s.chars().count())
            .chain(std::iter::once(corner.chars().count()))
            .max()
            .unwrap_or(0);
        let cell_width = col_heads
            .iter()
            .chain(values.iter().flatten())
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0);

        let mut header = pad_left(&corner, head_width);
        for head in &col_heads {
            header.push_str("  ");
            let padded = pad_left(head, cell_width);
            header.push_str(&self.paint(&padded, |s| Colorizer::axis_key(s)));
        }
        lines.push(header);

        let (lo, hi) = grid.value_range().unwrap_or((0.0, 0.0));
        for (r, row_head) in row_heads.iter().enumerate() {
            let padded = pad_left(row_head, head_width);
            let mut line = self.paint(&padded, |s| Colorizer::axis_key(s));
            for (c, text) in values[r].iter().enumerate() {
                line.push_str("  ");
                let padded = pad_left(text, cell_width);
                let painted = match grid.cell(r, c) {
                    Cell::Present(v) => {
                        let style = Colorizer::value_style(normalize(v, lo, hi));
                        self.paint(&padded, |s| s.style(style).to_string())
                    }
                    Cell::Missing => self.paint(&padded, |s| Colorizer::missing(s)),
                };
                line.push_str(&painted);
            }
            lines.push(line);
        }

        lines.push(format!(
            "  {}×{} grid, {} of {} cells measured",
            row_heads.len(),
            col_heads.len(),
            grid.present_count(),
            row_heads.len() * col_heads.len()
        ));

        lines.join("\n")
    }

    fn paint(&self, s: &str, f: impl Fn(&str) -> String) -> String {
        if self.color {
            f(s)
        } else {
            s.to_string()
        }
    }
}

fn pad_left(s: &str, width: usize) -> String {
    let len = s.chars().count();
    format!("{}{}", " ".repeat(width.saturating_sub(len)), s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::build_grid;
    use crate::types::{DuplicatePolicy, FamilyDataset, FamilySchema, ParamKey, Record, ReportedStats};

    fn grid() -> Grid {
        let mut ds = FamilyDataset::new("Delta");
        for (a1, a2, v) in [(1.0, 2.0, 0.5), (1.0, 10.0, 0.25), (2.0, 10.0, 0.75)] {
            ds.insert(
                Record::new(
                    ParamKey::new(a1, a2),
                    vec![v],
                    ReportedStats { mean: v, std_dev: 0.0 },
                    1,
                ),
                DuplicatePolicy::LastWins,
            );
        }
        build_grid(&ds)
    }

    #[test]
    fn test_plain_table() {
        let renderer = TerminalRenderer::new(RenderConfig::default(), false);
        let out = renderer.render(&grid(), &FigureLabels::from(&FamilySchema::delta()));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Delta Parameter Sensitivity");
        assert!(lines[1].contains("δₘᵢₙ \\ δₘₐₓ"));
        assert!(lines[1].trim_end().ends_with("10"));
        assert!(lines[2].contains("0.50"));
        assert!(lines[2].contains("0.25"));
        assert!(lines[3].contains(MISSING_MARK));
        assert!(lines[3].contains("0.75"));
        assert!(!out.contains('\x1b'));
        assert!(out.contains("3 of 4 cells measured"));
    }

    #[test]
    fn test_missing_is_not_rendered_as_zero() {
        let renderer = TerminalRenderer::new(RenderConfig::default(), false);
        let out = renderer.render(&grid(), &FigureLabels::from(&FamilySchema::delta()));
        assert!(!out.contains("0.00"));
    }

    #[test]
    fn test_empty_grid_notice() {
        let renderer = TerminalRenderer::new(RenderConfig::default(), false);
        let empty = build_grid(&FamilyDataset::new("Epsilon"));
        let out = renderer.render(&empty, &FigureLabels::from(&FamilySchema::epsilon()));
        assert!(out.contains("no data for Epsilon"));
    }

    #[test]
    fn test_colored_table_has_ansi() {
        let renderer = TerminalRenderer::new(RenderConfig::default(), true);
        let out = renderer.render(&grid(), &FigureLabels::from(&FamilySchema::delta()));
        assert!(out.contains('\x1b'));
    }
}
