//! Line numbers projected from the laid-out fragments.

use crate::address::TextRange;
use crate::config::EditorConfig;
use crate::geometry::{Point, Rect};
use crate::layout::{LayoutEngine, LayoutFragment};
use crate::selection::SelectionSet;
use serde::Serialize;

/// One numbered line for the ruler.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GutterLineEntry {
    /// One-based line number.
    pub number: usize,
    /// Baseline origin of the number in document-flow coordinates.
    pub baseline_origin: Point,
    /// Vertical band the number belongs to.
    pub frame: Rect,
    pub is_selected: bool,
}

/// Derives gutter entries from visible fragments and tracks the widest number.
#[derive(Clone, Debug)]
pub struct GutterProjector {
    line_height_adjustment: bool,
    max_digits: usize,
}

impl Default for GutterProjector {
    fn default() -> Self {
        Self::new(true)
    }
}

impl GutterProjector {
    pub fn new(line_height_adjustment: bool) -> Self {
        Self {
            line_height_adjustment,
            max_digits: 1,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.line_height_adjustment)
    }

    /// Digits of the widest number seen since the last reset.
    pub fn max_digits(&self) -> usize {
        self.max_digits
    }

    /// Forget the widest number so the gutter may shrink.
    pub fn reset_width(&mut self) {
        self.max_digits = 1;
    }

    /// Gutter width needed for the widest number seen.
    pub fn required_width(&self, digit_width: f32, padding: f32) -> f32 {
        self.max_digits as f32 * digit_width + padding
    }

    /// Entries for the fragments of the engine's last layout pass.
    pub fn project(&mut self, layout: &LayoutEngine, selections: &SelectionSet) -> Vec<GutterLineEntry> {
        self.line_entries(layout.visible_fragments(), selections)
    }

    /// One entry per numbered line: the first line of each paragraph plus the
    /// extra line. Wrapped continuation lines are skipped.
    ///
    /// `fragments` must be contiguous and in document order.
    pub fn line_entries<'a>(
        &mut self,
        fragments: impl IntoIterator<Item = &'a LayoutFragment>,
        selections: &SelectionSet,
    ) -> Vec<GutterLineEntry> {
        let ranges = selections.ranges();
        let mut fragments = fragments.into_iter().peekable();
        // Paragraphs strictly before the viewport.
        let start_line_index = fragments
            .peek()
            .map(|fragment| fragment.paragraph_index)
            .unwrap_or(0);
        let mut entries: Vec<GutterLineEntry> = Vec::new();

        for fragment in fragments {
            for (index, line) in fragment.line_fragments().iter().enumerate() {
                if index != 0 && !line.is_extra {
                    continue;
                }
                let multiple = fragment.style.line_height_multiple;
                let baseline_offset =
                    if self.line_height_adjustment && multiple.abs() > f32::EPSILON {
                        -(line.bounds.size.height * (multiple - 1.0) / 2.0)
                    } else {
                        0.0
                    };
                let top = fragment.frame.min_y() + line.bounds.min_y();
                let height = if line.is_extra {
                    line.bounds.size.height
                } else {
                    fragment.frame.size.height
                };
                let is_selected = if line.is_extra {
                    ranges
                        .iter()
                        .any(|range| fragment.range.end() == range.start())
                } else {
                    let content = fragment.content_range();
                    ranges.iter().any(|range| line_selected(content, *range))
                };
                entries.push(GutterLineEntry {
                    number: start_line_index + entries.len() + 1,
                    baseline_origin: Point::new(0.0, top + line.baseline + baseline_offset),
                    frame: Rect::new(0.0, top, fragment.frame.size.width, height),
                    is_selected,
                });
            }
        }

        if let Some(last) = entries.last() {
            self.max_digits = self.max_digits.max(digit_count(last.number));
        }
        entries
    }
}

fn line_selected(content: TextRange, selection: TextRange) -> bool {
    let contains = content.start() <= selection.start() && selection.end() <= content.end();
    let covers = selection.start() <= content.start() && content.end() <= selection.end();
    contains || covers || content.intersects(&selection) || content.end() == selection.start()
}

fn digit_count(mut number: usize) -> usize {
    let mut digits = 1;
    while number >= 10 {
        number /= 10;
        digits += 1;
    }
    digits
}
