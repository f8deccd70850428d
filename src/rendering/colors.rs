//! Color scales for figures and terminal output.
//!
//! - Heatmaps use a sequential yellow → green → blue ramp (the YlGnBu stops),
//!   so low values are light and high values are dark.
//! - Line charts cycle a fixed qualitative palette by series position.
//! - Terminal tables color values by tertile of the grid's range.

use owo_colors::{OwoColorize, Style};

/// An sRGB color, independent of any drawing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Relative luminance in [0, 1], used to pick readable annotation text.
    pub fn luminance(self) -> f64 {
        (0.2126 * self.0 as f64 + 0.7152 * self.1 as f64 + 0.0722 * self.2 as f64) / 255.0
    }
}

const HEAT_STOPS: [Rgb; 9] = [
    Rgb(255, 255, 217),
    Rgb(237, 248, 177),
    Rgb(199, 233, 180),
    Rgb(127, 205, 187),
    Rgb(65, 182, 196),
    Rgb(29, 145, 192),
    Rgb(34, 94, 168),
    Rgb(37, 52, 148),
    Rgb(8, 29, 88),
];

/// Fill for cells with no data. Deliberately outside the heat ramp.
pub const MISSING_FILL: Rgb = Rgb(215, 215, 215);

/// Line colors, assigned by series position.
pub const LINE_PALETTE: [&str; 7] = [
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628",
];

/// Color of the heat ramp at `t` in [0, 1] (clamped).
pub fn heat(t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (HEAT_STOPS.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(HEAT_STOPS.len() - 1);
    let frac = scaled - lo as f64;
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (HEAT_STOPS[lo], HEAT_STOPS[hi]);
    Rgb(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

/// Position of `value` within `[lo, hi]`. A degenerate range maps to 0.5.
pub fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Line color for the series at `index`.
pub fn line_color(index: usize) -> Rgb {
    Rgb::from_hex(LINE_PALETTE[index % LINE_PALETTE.len()]).unwrap_or(Rgb(0, 0, 0))
}

/// Terminal styles for table output.
pub struct Colorizer;

impl Colorizer {
    /// Style for a normalized value: low dim, mid default, high bold green.
    pub fn value_style(t: f64) -> Style {
        if t < 1.0 / 3.0 {
            Style::new().cyan()
        } else if t < 2.0 / 3.0 {
            Style::new()
        } else {
            Style::new().bright_green().bold()
        }
    }

    pub fn header(s: &str) -> String {
        s.bright_blue().bold().to_string()
    }

    pub fn axis_key(s: &str) -> String {
        s.yellow().to_string()
    }

    pub fn missing(s: &str) -> String {
        s.dimmed().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_endpoints() {
        assert_eq!(heat(0.0), HEAT_STOPS[0]);
        assert_eq!(heat(1.0), HEAT_STOPS[8]);
        assert_eq!(heat(-3.0), HEAT_STOPS[0]);
        assert_eq!(heat(f64::NAN), HEAT_STOPS[0]);
    }

    #[test]
    fn test_heat_gets_darker() {
        assert!(heat(0.1).luminance() > heat(0.9).luminance());
        assert!(MISSING_FILL != heat(0.0));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(5.0, 0.0, 10.0), 0.5);
        assert_eq!(normalize(3.0, 3.0, 3.0), 0.5);
        assert_eq!(normalize(20.0, 0.0, 10.0), 1.0);
    }

    #[test]
    fn test_line_palette() {
        assert_eq!(line_color(0), Rgb(0xe4, 0x1a, 0x1c));
        assert_eq!(line_color(7), line_color(0));
        assert_eq!(Rgb::from_hex("e41a1c"), None);
        assert_eq!(Rgb::from_hex("#zz0000"), None);
    }
}
