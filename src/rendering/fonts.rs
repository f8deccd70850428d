//! Font resolution for plotters figures.

use plotters::style::{FontDesc, FontFamily, FontStyle};
use tracing::debug;

use super::RenderConfig;

/// Probe text used to check that a face can actually lay out glyphs.
const PROBE: &str = "Ag0.5";

/// Fonts for one figure, resolved once from the fallback chain.
pub struct FigureFonts<'a> {
    family: FontFamily<'a>,
    style: FontStyle,
}

impl<'a> FigureFonts<'a> {
    /// First candidate in the chain that the backend can load. Falls back to
    /// the generic serif family, which plotters always maps to something.
    pub fn resolve(config: &'a RenderConfig) -> Self {
        let style = if config.bold_weight {
            FontStyle::Bold
        } else {
            FontStyle::Normal
        };

        for name in config.font_candidates() {
            let family = FontFamily::from(name);
            match FontDesc::new(family, 12.0, style).box_size(PROBE) {
                Ok(_) => {
                    debug!(font = name, "resolved figure font");
                    return Self { family, style };
                }
                Err(err) => debug!(font = name, error = ?err, "font unavailable, trying next"),
            }
        }

        Self {
            family: FontFamily::Serif,
            style,
        }
    }

    pub fn sized(&self, size: f64) -> FontDesc<'a> {
        FontDesc::new(self.family, size, self.style)
    }

    /// Same face at normal weight, for tick labels.
    pub fn regular(&self, size: f64) -> FontDesc<'a> {
        FontDesc::new(self.family, size, FontStyle::Normal)
    }
}
