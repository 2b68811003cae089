//! Glyph advance tables used to lay out template text.
//!
//! Widths are the standard PostScript core-font advances in 1/1000 em for ASCII
//! 0x20..=0x7E; index = `(char as usize) - 32`. Georgia has no core-font table and is
//! approximated as a widened Times.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    Sans,
    Georgia,
    Times,
}

impl FontFamily {
    /// Maps a CSS `font-family` stack to the closest table.
    pub fn from_css(stack: &str) -> Self {
        let lower = stack.to_ascii_lowercase();
        if lower.contains("georgia") {
            FontFamily::Georgia
        } else if lower.contains("times") || (lower.contains("serif") && !lower.contains("sans")) {
            FontFamily::Times
        } else {
            FontFamily::Sans
        }
    }

    pub fn css_stack(&self) -> &'static str {
        match self {
            FontFamily::Sans => "Arial, Helvetica, sans-serif",
            FontFamily::Georgia => "Georgia, 'Times New Roman', Times, serif",
            FontFamily::Times => "'Times New Roman', Times, serif",
        }
    }
}

/// Faux bold is painted one pixel wider per glyph; layout budgets for that.
const BOLD_WIDTH_FACTOR: f32 = 1.06;

pub struct FontMetricTable {
    advances: &'static [u16; 95],
    scale: f32,
    /// Used for anything outside printable ASCII.
    fallback: u16,
}

impl FontMetricTable {
    /// Width of `s` in em.
    pub fn measure_str(&self, s: &str) -> f32 {
        let units: u32 = s
            .chars()
            .map(|c| match (c as usize).checked_sub(32) {
                Some(i) if i < self.advances.len() => u32::from(self.advances[i]),
                _ => u32::from(self.fallback),
            })
            .sum();
        units as f32 / 1000.0 * self.scale
    }

    pub fn measure_px(&self, s: &str, font_size_px: f32, bold: bool) -> f32 {
        let factor = if bold { BOLD_WIDTH_FACTOR } else { 1.0 };
        self.measure_str(s) * font_size_px * factor
    }
}

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //  !"#$%&'()*+,-./
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // 0-9
    278, 278, 584, 584, 584, 556, 1015,                                             // :;<=>?@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // N-Z
    278, 278, 278, 469, 556, 333,                                                   // [\]^_`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // n-z
    334, 260, 334, 584,                                                             // {|}~
];

#[rustfmt::skip]
static TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

static SANS_TABLE: FontMetricTable = FontMetricTable {
    advances: &HELVETICA,
    scale: 1.0,
    fallback: 556,
};

static GEORGIA_TABLE: FontMetricTable = FontMetricTable {
    advances: &TIMES_ROMAN,
    scale: 1.1,
    fallback: 500,
};

static TIMES_TABLE: FontMetricTable = FontMetricTable {
    advances: &TIMES_ROMAN,
    scale: 1.0,
    fallback: 500,
};

pub fn get_metrics(font: FontFamily) -> &'static FontMetricTable {
    match font {
        FontFamily::Sans => &SANS_TABLE,
        FontFamily::Georgia => &GEORGIA_TABLE,
        FontFamily::Times => &TIMES_TABLE,
    }
}

/// Horizontal extent of a run of text in CSS px. Layout wraps with whatever
/// the painter will later draw with.
pub trait TextMeasure {
    fn measure(&self, text: &str, font: FontFamily, size_px: f32, bold: bool) -> f32;
}

/// Measures with the static advance tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricTables;

impl TextMeasure for MetricTables {
    fn measure(&self, text: &str, font: FontFamily, size_px: f32, bold: bool) -> f32 {
        get_metrics(font).measure_px(text, size_px, bold)
    }
}
