//! Layout fragments and the line breaking that produces them.

use super::measure::TextMeasurer;
use crate::address::{Affinity, Location, TextRange};
use crate::constants::BASELINE_RATIO;
use crate::content::{Paragraph, ParagraphId, ParagraphStyle};
use crate::geometry::Rect;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// One visual line within a layout fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct LineFragment {
    /// Char offset of the first char, relative to the paragraph start.
    pub start: usize,
    /// Char offset past the last char; the last line includes the line break.
    pub end: usize,
    /// Bounds relative to the fragment origin.
    pub bounds: Rect,
    /// Baseline offset from the top of `bounds`.
    pub baseline: f32,
    /// Empty line after a trailing break or in an empty document.
    pub is_extra: bool,
    /// Pen x before each char of `start..end`, plus the end of the line.
    caret_offsets: Vec<f32>,
}

impl LineFragment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Pen x at paragraph offset `offset`, clamped to this line.
    pub fn x_for_offset(&self, offset: usize) -> f32 {
        let index = offset.clamp(self.start, self.end) - self.start;
        self.caret_offsets
            .get(index)
            .or_else(|| self.caret_offsets.last())
            .copied()
            .unwrap_or(0.0)
    }

    /// Paragraph offset of the caret position nearest to `x`.
    ///
    /// Never returns a position past the line's content, so a caret placed on
    /// a line ending in a break stays before the break.
    pub fn offset_for_x(&self, x: f32, content_end: usize) -> usize {
        let last = self.end.min(content_end.max(self.start));
        let mut best = self.start;
        let mut best_distance = f32::INFINITY;
        for (i, caret_x) in self.caret_offsets.iter().enumerate() {
            let offset = self.start + i;
            if offset > last {
                break;
            }
            let distance = (caret_x - x).abs();
            if distance < best_distance {
                best = offset;
                best_distance = distance;
            }
        }
        best
    }
}

/// Cached layout of one paragraph element.
#[derive(Clone, Debug)]
pub struct LayoutFragment {
    pub paragraph_id: ParagraphId,
    /// Paragraph index at the last placement.
    pub paragraph_index: usize,
    /// Document range at the last placement, including the line break.
    pub range: TextRange,
    /// Frame in document-flow coordinates.
    pub frame: Rect,
    pub style: Arc<ParagraphStyle>,
    lines: Vec<LineFragment>,
    /// Length of the range excluding the line break.
    content_len: usize,
    wrap_width: Option<f32>,
}

impl LayoutFragment {
    pub fn line_fragments(&self) -> &[LineFragment] {
        &self.lines
    }

    /// Returns `true` for the fragment holding only the extra line.
    pub fn is_extra(&self) -> bool {
        self.lines.first().is_some_and(|line| line.is_extra)
    }

    pub(crate) fn wrap_width(&self) -> Option<f32> {
        self.wrap_width
    }

    /// End of the paragraph's content in document coordinates.
    pub fn content_end(&self) -> Location {
        Location::new(self.range.start().char_index() + self.content_len)
    }

    /// Range of the paragraph excluding its line break.
    pub fn content_range(&self) -> TextRange {
        TextRange::new(self.range.start(), self.content_end())
    }

    /// Document range of line `index`.
    pub fn line_range(&self, index: usize) -> Option<TextRange> {
        let line = self.lines.get(index)?;
        let base = self.range.start().char_index();
        Some(TextRange::from_chars(base + line.start, base + line.end))
    }

    /// Frame of line `index` in document-flow coordinates.
    pub fn line_frame(&self, index: usize) -> Option<Rect> {
        let line = self.lines.get(index)?;
        Some(line.bounds.offset_by(self.frame.min_x(), self.frame.min_y()))
    }

    /// Index of the visual line holding `location`.
    ///
    /// At a soft wrap boundary `Upstream` selects the line ending there and
    /// `Downstream` the line starting there.
    pub fn line_index_for(&self, location: Location, affinity: Affinity) -> usize {
        let offset = location
            .char_index()
            .saturating_sub(self.range.start().char_index());
        let last = self.lines.len().saturating_sub(1);
        for (index, line) in self.lines.iter().enumerate() {
            if offset < line.end || index == last {
                if affinity == Affinity::Upstream && index > 0 && offset == line.start {
                    return index - 1;
                }
                return index;
            }
            if offset == line.end && index < last && affinity == Affinity::Upstream {
                return index;
            }
        }
        last
    }

    /// Caret x for `location` in document-flow coordinates.
    pub fn x_for_location(&self, location: Location, affinity: Affinity) -> f32 {
        let index = self.line_index_for(location, affinity);
        let offset = location
            .char_index()
            .saturating_sub(self.range.start().char_index());
        self.lines
            .get(index)
            .map(|line| line.x_for_offset(offset))
            .unwrap_or(0.0)
            + self.frame.min_x()
    }

    /// Location nearest to `x` on visual line `index`.
    pub fn location_for_x(&self, index: usize, x: f32) -> Location {
        let base = self.range.start().char_index();
        let Some(line) = self.lines.get(index) else {
            return self.content_end();
        };
        let content_end = if index + 1 == self.lines.len() {
            self.content_len
        } else {
            // Caret at a soft wrap lands before the next line's first char.
            line.end.saturating_sub(1).max(line.start)
        };
        Location::new(base + line.offset_for_x(x - self.frame.min_x(), content_end))
    }

    /// Lay out `paragraph` into visual lines.
    pub(crate) fn build(
        paragraph: &Paragraph<'_>,
        measurer: &dyn TextMeasurer,
        wrap_width: Option<f32>,
    ) -> Self {
        let style = Arc::clone(paragraph.style);
        let content_len = paragraph.content_range().len();
        let text = paragraph.text();
        let content: String = text.chars().take(content_len).collect();
        let line_height = measurer.line_height(&style);

        let breaks = break_lines(&content, &style, measurer, wrap_width);
        let total = paragraph.range.len();
        let last = breaks.len() - 1;
        let mut lines = Vec::with_capacity(breaks.len());
        let mut y = 0.0;
        let mut width = 0.0f32;
        for (index, (start, end, carets, line_width)) in breaks.into_iter().enumerate() {
            let end = if index == last { total } else { end };
            let mut carets = carets;
            // The line break itself has no advance.
            while carets.len() < end - start + 1 {
                let x = carets.last().copied().unwrap_or(0.0);
                carets.push(x);
            }
            width = width.max(line_width);
            lines.push(LineFragment {
                start,
                end,
                bounds: Rect::new(0.0, y, line_width, line_height),
                baseline: line_height * BASELINE_RATIO,
                is_extra: false,
                caret_offsets: carets,
            });
            y += line_height;
        }

        Self {
            paragraph_id: paragraph.id,
            paragraph_index: paragraph.index,
            range: paragraph.range,
            frame: Rect::new(0.0, 0.0, width, y),
            style,
            lines,
            content_len,
            wrap_width,
        }
    }

    /// Fragment for the empty line after a trailing break or in an empty document.
    pub(crate) fn extra(
        id: ParagraphId,
        index: usize,
        location: Location,
        style: Arc<ParagraphStyle>,
        height: f32,
        wrap_width: Option<f32>,
    ) -> Self {
        Self {
            paragraph_id: id,
            paragraph_index: index,
            range: TextRange::empty(location),
            frame: Rect::new(0.0, 0.0, 0.0, height),
            style,
            lines: vec![LineFragment {
                start: 0,
                end: 0,
                bounds: Rect::new(0.0, 0.0, 0.0, height),
                baseline: height * BASELINE_RATIO,
                is_extra: true,
                caret_offsets: vec![0.0],
            }],
            content_len: 0,
            wrap_width,
        }
    }

    /// Move to a new placement without re-measuring.
    pub(crate) fn place(&mut self, index: usize, start: Location, y: f32) {
        let len = self.range.len();
        self.paragraph_index = index;
        self.range = TextRange::from_chars(start.char_index(), start.char_index() + len);
        self.frame.origin.y = y;
    }
}

type LineBreak = (usize, usize, Vec<f32>, f32);

/// Greedy line breaking on word boundaries with hanging trailing whitespace.
///
/// Words wider than the wrap width are broken between characters. Always
/// returns at least one line.
fn break_lines(
    content: &str,
    style: &ParagraphStyle,
    measurer: &dyn TextMeasurer,
    wrap_width: Option<f32>,
) -> Vec<LineBreak> {
    let limit = wrap_width.unwrap_or(f32::INFINITY);
    let mut lines: Vec<LineBreak> = Vec::new();
    let mut line_start = 0usize;
    let mut offset = 0usize;
    let mut carets = vec![0.0f32];
    let mut pen = 0.0f32;
    // Width excluding hanging whitespace.
    let mut ink = 0.0f32;

    for segment in content.split_word_bounds() {
        let is_space = segment.chars().all(char::is_whitespace);
        if is_space {
            for ch in segment.chars() {
                pen += measurer.advance(ch, pen, style);
                carets.push(pen);
                offset += 1;
            }
            continue;
        }

        let mut next_pen = pen;
        for ch in segment.chars() {
            next_pen += measurer.advance(ch, next_pen, style);
        }
        if next_pen > limit && offset > line_start {
            lines.push((line_start, offset, std::mem::take(&mut carets), ink));
            line_start = offset;
            carets = vec![0.0];
            pen = 0.0;
            ink = 0.0;
        }

        for ch in segment.chars() {
            let advance = measurer.advance(ch, pen, style);
            if pen + advance > limit && offset > line_start {
                lines.push((line_start, offset, std::mem::take(&mut carets), ink));
                line_start = offset;
                carets = vec![0.0];
                pen = 0.0;
            }
            pen += advance;
            carets.push(pen);
            offset += 1;
            ink = pen;
        }
    }
    lines.push((line_start, offset, carets, ink));
    lines
}
