//! Glyph metrics used by line breaking.

use crate::config::{EditorConfig, MetricsCorrection};
use crate::content::ParagraphStyle;
use unicode_width::UnicodeWidthChar;

/// Source of advances and line heights for layout.
///
/// Implementations stand in for the platform's font machinery; layout only
/// needs per-character advances and a line height per paragraph style.
pub trait TextMeasurer {
    /// Horizontal advance of `ch` at the given column offset.
    ///
    /// `x` is the pen position before `ch`, which tab stops depend on.
    fn advance(&self, ch: char, x: f32, style: &ParagraphStyle) -> f32;

    /// Height of one visual line for `style`.
    fn line_height(&self, style: &ParagraphStyle) -> f32;
}

/// Fixed-pitch measurer using East Asian width for double-width glyphs.
#[derive(Clone, Debug, PartialEq)]
pub struct MonospaceMeasurer {
    char_width: f32,
    line_height: f32,
    tab_width: usize,
    corrections: Vec<MetricsCorrection>,
}

impl MonospaceMeasurer {
    pub fn new(char_width: f32, line_height: f32, tab_width: usize) -> Self {
        Self {
            char_width: char_width.max(0.0),
            line_height: line_height.max(0.0),
            tab_width: tab_width.max(1),
            corrections: Vec::new(),
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            corrections: config.metrics_corrections.clone(),
            ..Self::new(
                config.char_width,
                config.default_line_height,
                config.tab_width,
            )
        }
    }

    pub fn char_width(&self) -> f32 {
        self.char_width
    }

    fn correction_for(&self, family: &str) -> f32 {
        let family = family.to_ascii_lowercase();
        self.corrections
            .iter()
            .find(|correction| family.contains(&correction.family_contains.to_ascii_lowercase()))
            .map(|correction| correction.line_height_factor)
            .unwrap_or(1.0)
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn advance(&self, ch: char, x: f32, _style: &ParagraphStyle) -> f32 {
        if ch == '\t' {
            let stop = self.char_width * self.tab_width as f32;
            if stop <= 0.0 {
                return 0.0;
            }
            let next = ((x / stop).floor() + 1.0) * stop;
            return next - x;
        }
        if ch.is_control() {
            return 0.0;
        }
        let columns = UnicodeWidthChar::width(ch).unwrap_or(1);
        columns as f32 * self.char_width
    }

    fn line_height(&self, style: &ParagraphStyle) -> f32 {
        self.line_height
            * self.correction_for(style.font_family.as_str())
            * style.effective_line_height_multiple()
    }
}
