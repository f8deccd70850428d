//! Annotated heatmap of a grid.
//!
//! Layout: the grid fills the left of the canvas with row 0 at the top, a
//! vertical colorbar sits on the right. Every cell is annotated with its mean
//! at the configured precision; missing cells are gray and read "n/a".

use std::path::Path;

use anyhow::Result;

use super::{FigureLabels, RenderConfig};
use crate::aggregation::Grid;

#[cfg(feature = "plotters")]
use {
    super::colors::{heat, normalize, Rgb, MISSING_FILL},
    super::fonts::FigureFonts,
    super::format_key,
    crate::aggregation::Cell,
    anyhow::{bail, Context},
    plotters::coord::types::RangedCoordf64,
    plotters::prelude::*,
    plotters::style::text_anchor::{HPos, Pos, VPos},
    tracing::debug,
};

/// Steps in the colorbar gradient.
#[cfg(feature = "plotters")]
const COLORBAR_STEPS: usize = 100;

#[cfg(feature = "plotters")]
fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

/// Render `grid` to a PNG at `output`.
///
/// Fails on an empty grid; callers decide whether that is worth reporting.
#[cfg(feature = "plotters")]
pub fn render_heatmap(
    grid: &Grid,
    labels: &FigureLabels,
    config: &RenderConfig,
    output: &Path,
) -> Result<()> {
    if grid.is_empty() {
        bail!("no data to plot for family {}", grid.family());
    }

    let (nrows, ncols) = grid.shape();
    let (lo, hi) = grid
        .value_range()
        .context("grid has cells but no measured values")?;
    debug!(
        family = grid.family(),
        rows = nrows,
        cols = ncols,
        lo,
        hi,
        output = %output.display(),
        "rendering heatmap"
    );

    let fonts = FigureFonts::resolve(config);
    let title = config.label(&labels.title);
    let x_desc = config.label(&labels.x_label);
    let y_desc = config.label(&labels.y_label);

    let (width, height) = (config.heatmap_width, config.heatmap_height);
    let root = BitMapBackend::new(output, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&title, fonts.sized(44.0))?;
    let (main, bar) = root.split_horizontally(width * 86 / 100);

    let scale = (width.min(height) as f64 / 1400.0).max(0.5);
    let cols = grid.col_keys().to_vec();
    let rows = grid.row_keys().to_vec();

    let mut chart = ChartBuilder::on(&main)
        .margin(20)
        .x_label_area_size((110.0 * scale) as u32)
        .y_label_area_size((130.0 * scale) as u32)
        .build_cartesian_2d(axis_range(ncols), axis_range(nrows))?;

    let col_label = |v: &f64| {
        center_index(*v, ncols)
            .map(|c| format_key(cols[c]))
            .unwrap_or_default()
    };
    let row_label = |v: &f64| {
        center_index(*v, nrows)
            .map(|y| format_key(rows[nrows - 1 - y]))
            .unwrap_or_default()
    };

    // Tick hint above the cell count keeps the step at 1; off-center ticks
    // get an empty label.
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(ncols + 2)
        .y_labels(nrows + 2)
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(fonts.sized(36.0 * scale))
        .label_style(fonts.regular(28.0 * scale))
        .x_label_formatter(&col_label)
        .y_label_formatter(&row_label)
        .draw()?;

    draw_cells(&mut chart, grid, lo, hi)?;

    if config.annotate {
        let centered = Pos::new(HPos::Center, VPos::Center);
        let annotation = fonts.sized(26.0 * scale);
        chart.draw_series(grid.iter_cells().map(|gc| {
            let center = (gc.col as f64, (nrows - 1 - gc.row) as f64);
            let (text, fill) = match gc.cell {
                Cell::Present(v) => (config.format_value(v), heat(normalize(v, lo, hi))),
                Cell::Missing => ("n/a".to_string(), MISSING_FILL),
            };
            let ink = if fill.luminance() < 0.5 { WHITE } else { BLACK };
            Text::new(
                text,
                center,
                annotation.clone().color(&ink).pos(centered),
            )
        }))?;
    }

    draw_colorbar(&bar, lo, hi, &fonts, scale)?;

    root.present()
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

/// Plot range for `n` cells centered on the integers `0..n`.
#[cfg(feature = "plotters")]
fn axis_range(n: usize) -> std::ops::Range<f64> {
    -0.5..(n as f64 - 0.5)
}

/// Cell index for a tick at `v`, or `None` when the tick falls between
/// cell centers or outside the grid.
#[cfg(feature = "plotters")]
fn center_index(v: f64, n: usize) -> Option<usize> {
    let rounded = v.round();
    if (v - rounded).abs() > 1e-6 || rounded < 0.0 || rounded >= n as f64 {
        return None;
    }
    Some(rounded as usize)
}

/// Fill one unit square per cell. Row 0 is drawn at the top.
#[cfg(feature = "plotters")]
fn draw_cells<DB>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    grid: &Grid,
    lo: f64,
    hi: f64,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (nrows, _) = grid.shape();
    chart.draw_series(grid.iter_cells().map(|gc| {
        let x = gc.col as f64;
        let y = (nrows - 1 - gc.row) as f64;
        let fill = match gc.cell {
            Cell::Present(v) => rgb(heat(normalize(v, lo, hi))),
            Cell::Missing => rgb(MISSING_FILL),
        };
        Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], fill.filled())
    }))?;
    Ok(())
}

#[cfg(feature = "plotters")]
fn draw_colorbar<DB>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    lo: f64,
    hi: f64,
    fonts: &FigureFonts<'_>,
    scale: f64,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    // A constant grid still gets a readable bar around its single value.
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let (_, height) = area.dim_in_pixel();
    let pad = height as i32 / 4;
    let area = area.margin(pad, pad, 10, 20);

    let mut chart = ChartBuilder::on(&area)
        .y_label_area_size((90.0 * scale) as u32)
        .build_cartesian_2d(0.0..1.0, lo..hi)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(6)
        .label_style(fonts.regular(24.0 * scale))
        .draw()?;

    let step = (hi - lo) / COLORBAR_STEPS as f64;
    chart.draw_series((0..COLORBAR_STEPS).map(|i| {
        let y0 = lo + step * i as f64;
        let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        Rectangle::new([(0.0, y0), (1.0, y0 + step)], rgb(heat(t)).filled())
    }))?;

    Ok(())
}

/// Stub when plotters feature is disabled.
#[cfg(not(feature = "plotters"))]
pub fn render_heatmap(
    _grid: &Grid,
    _labels: &FigureLabels,
    _config: &RenderConfig,
    _output: &Path,
) -> Result<()> {
    anyhow::bail!("heatmap rendering requires the `plotters` feature")
}

#[cfg(all(test, feature = "plotters"))]
mod tests {
    use super::*;
    use crate::aggregation::build_grid;
    use crate::types::{DuplicatePolicy, FamilyDataset, FamilySchema, ParamKey, Record, ReportedStats};

    fn dataset(points: &[(f64, f64, f64)]) -> FamilyDataset {
        let mut ds = FamilyDataset::new("Delta");
        for &(a1, a2, v) in points {
            ds.insert(
                Record::new(
                    ParamKey::new(a1, a2),
                    vec![v, v],
                    ReportedStats { mean: v, std_dev: 0.0 },
                    1,
                ),
                DuplicatePolicy::LastWins,
            );
        }
        ds
    }

    fn small_config() -> RenderConfig {
        RenderConfig {
            heatmap_width: 400,
            heatmap_height: 300,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_grid_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let grid = build_grid(&FamilyDataset::new("Delta"));
        let labels = FigureLabels::from(&FamilySchema::delta());
        let out = dir.path().join("empty.png");
        assert!(render_heatmap(&grid, &labels, &small_config(), &out).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_center_index_labels_only_cell_centers() {
        assert_eq!(center_index(0.0, 3), Some(0));
        assert_eq!(center_index(2.0, 3), Some(2));
        assert_eq!(center_index(0.5, 3), None);
        assert_eq!(center_index(-0.5, 3), None);
        assert_eq!(center_index(3.0, 3), None);
        assert_eq!(center_index(1.0 + 1e-9, 3), Some(1));
    }

    #[test]
    fn test_axis_range_centers_cells() {
        let r = axis_range(4);
        assert_eq!(r.start, -0.5);
        assert_eq!(r.end, 3.5);
    }

    #[test]
    fn test_cells_drawn_with_first_row_on_top() {
        // 2x2 grid, (2.0, 3.0) missing: rows [1, 2], cols [2, 3].
        let grid = build_grid(&dataset(&[(1.0, 2.0, 0.2), (1.0, 3.0, 0.8), (2.0, 2.0, 0.5)]));
        let (lo, hi) = grid.value_range().unwrap();
        let (w, h) = (200u32, 200u32);
        let mut buf = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
            root.fill(&WHITE).unwrap();
            let mut chart = ChartBuilder::on(&root)
                .build_cartesian_2d(axis_range(2), axis_range(2))
                .unwrap();
            draw_cells(&mut chart, &grid, lo, hi).unwrap();
            root.present().unwrap();
        }
        let pixel = |x: u32, y: u32| {
            let i = ((y * w + x) * 3) as usize;
            Rgb(buf[i], buf[i + 1], buf[i + 2])
        };
        assert_eq!(pixel(50, 50), heat(normalize(0.2, lo, hi)));
        assert_eq!(pixel(150, 50), heat(normalize(0.8, lo, hi)));
        assert_eq!(pixel(50, 150), heat(normalize(0.5, lo, hi)));
        assert_eq!(pixel(150, 150), MISSING_FILL);
    }

    #[test]
    #[ignore = "needs a system serif font"]
    fn test_writes_png_with_missing_cell() {
        let dir = tempfile::tempdir().unwrap();
        let grid = build_grid(&dataset(&[(1.0, 2.0, 0.5), (1.0, 3.0, 0.6), (2.0, 3.0, 0.7)]));
        let labels = FigureLabels::from(&FamilySchema::delta());
        let out = dir.path().join("delta.png");
        render_heatmap(&grid, &labels, &small_config(), &out).unwrap();
        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    #[ignore = "needs a system serif font"]
    fn test_single_value_grid() {
        let dir = tempfile::tempdir().unwrap();
        let grid = build_grid(&dataset(&[(1.0, 1.0, 0.4)]));
        let labels = FigureLabels::from(&FamilySchema::epsilon());
        let out = dir.path().join("eps.png");
        render_heatmap(&grid, &labels, &small_config(), &out).unwrap();
        assert!(out.exists());
    }
}
