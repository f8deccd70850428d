//! Line chart of time-series columns.
//!
//! x is the row index, one colored line per column. Gaps in a column break
//! its line instead of dropping to zero.

use std::path::Path;

use anyhow::Result;

use super::RenderConfig;
use crate::series::{Column, SeriesSpec};

#[cfg(feature = "plotters")]
use {
    super::colors::line_color,
    super::fonts::FigureFonts,
    anyhow::{bail, Context},
    plotters::prelude::*,
    tracing::{debug, warn},
};

/// Render `columns` to a PNG at `output`, labelled per `spec`.
#[cfg(feature = "plotters")]
pub fn render_series(
    columns: &[&Column],
    spec: &SeriesSpec,
    config: &RenderConfig,
    output: &Path,
) -> Result<()> {
    let drawable: Vec<&Column> = columns
        .iter()
        .copied()
        .filter(|c| {
            let any = c.points().next().is_some();
            if !any {
                warn!(column = %c.name, "column has no values, leaving it out of the chart");
            }
            any
        })
        .collect();
    if drawable.is_empty() {
        bail!("no series with values to plot");
    }

    let x_max = drawable
        .iter()
        .map(|c| c.values.len())
        .max()
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1) as f64;
    let (mut y_min, mut y_max) = drawable
        .iter()
        .flat_map(|c| c.points())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, y)| {
            (lo.min(y), hi.max(y))
        });
    if y_max <= y_min {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let pad = (y_max - y_min) * 0.05;
    debug!(
        series = drawable.len(),
        x_max,
        y_min,
        y_max,
        output = %output.display(),
        "rendering line chart"
    );

    let fonts = FigureFonts::resolve(config);
    let root = BitMapBackend::new(output, (config.lines_width, config.lines_height))
        .into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(25)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(0.0..x_max, (y_min - pad)..(y_max + pad))?;

    chart
        .configure_mesh()
        .x_desc(config.label(&spec.x_label))
        .axis_desc_style(fonts.sized(26.0))
        .label_style(fonts.regular(20.0))
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.15))
        .draw()?;

    for (i, column) in drawable.iter().enumerate() {
        let c = line_color(i);
        let color = RGBColor(c.0, c.1, c.2);
        let style = color.stroke_width(2);
        let mut segments = column.segments().into_iter();

        // Only the first segment carries the legend entry.
        if let Some(first) = segments.next() {
            chart
                .draw_series(LineSeries::new(first, style))?
                .label(config.label(spec.label_for(&column.name)))
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(3))
                });
        }
        for segment in segments {
            chart.draw_series(LineSeries::new(segment, style))?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .label_font(fonts.regular(22.0))
        .draw()?;

    root.present()
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

/// Stub when plotters feature is disabled.
#[cfg(not(feature = "plotters"))]
pub fn render_series(
    _columns: &[&Column],
    _spec: &SeriesSpec,
    _config: &RenderConfig,
    _output: &Path,
) -> Result<()> {
    anyhow::bail!("line charts require the `plotters` feature")
}
