//! Paragraph elements and their attributes.

use crate::address::{Location, TextRange};
use ropey::{Rope, RopeSlice};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of a paragraph element, stable until its text is edited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ParagraphId(u64);

impl ParagraphId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Paragraph-level attributes consumed by layout and the gutter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParagraphStyle {
    pub font_family: String,
    pub point_size: f32,
    /// Multiplier applied to the natural line height; `0.0` means unset.
    pub line_height_multiple: f32,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            font_family: "Menlo".to_string(),
            point_size: 13.0,
            line_height_multiple: 0.0,
        }
    }
}

impl ParagraphStyle {
    /// Effective multiple, treating an almost-zero value as `1.0`.
    pub fn effective_line_height_multiple(&self) -> f32 {
        if self.line_height_multiple.abs() <= f32::EPSILON {
            1.0
        } else {
            self.line_height_multiple
        }
    }
}

/// Replacement text with optional paragraph attributes.
///
/// Paragraphs created by an edit take `style` when set; otherwise they inherit
/// the style of the paragraph the edit starts in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributedRun {
    pub text: String,
    pub style: Option<Arc<ParagraphStyle>>,
}

impl AttributedRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    pub fn styled(text: impl Into<String>, style: ParagraphStyle) -> Self {
        Self {
            text: text.into(),
            style: Some(Arc::new(style)),
        }
    }

    /// Length in chars.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl From<&str> for AttributedRun {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for AttributedRun {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

/// Per-line bookkeeping kept aligned with the rope's lines.
#[derive(Clone, Debug)]
pub(crate) struct ParagraphSlot {
    pub(crate) id: ParagraphId,
    pub(crate) style: Arc<ParagraphStyle>,
}

impl ParagraphSlot {
    pub(crate) fn new(style: Arc<ParagraphStyle>) -> Self {
        Self {
            id: ParagraphId::next(),
            style,
        }
    }
}

/// Borrowed view of one paragraph element.
#[derive(Clone, Debug)]
pub struct Paragraph<'a> {
    pub index: usize,
    pub id: ParagraphId,
    /// Range including the trailing line break, if any.
    pub range: TextRange,
    pub style: &'a Arc<ParagraphStyle>,
    pub(crate) slice: RopeSlice<'a>,
}

impl<'a> Paragraph<'a> {
    pub fn text(&self) -> String {
        self.slice.to_string()
    }

    pub fn slice(&self) -> RopeSlice<'a> {
        self.slice
    }

    /// Length in chars of the trailing line break (0, 1, or 2 for CRLF).
    pub fn line_break_len(&self) -> usize {
        line_break_len(self.slice)
    }

    /// Range excluding the trailing line break.
    pub fn content_range(&self) -> TextRange {
        let end = self.range.end().char_index() - self.line_break_len();
        TextRange::new(self.range.start(), Location::new(end))
    }
}

/// Length of the line break terminating `slice`.
pub(crate) fn line_break_len(slice: RopeSlice<'_>) -> usize {
    let len = slice.len_chars();
    if len == 0 {
        return 0;
    }
    match slice.char(len - 1) {
        '\n' if len > 1 && slice.char(len - 2) == '\r' => 2,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => 1,
        _ => 0,
    }
}

/// Number of paragraph elements in `rope`.
///
/// The empty line after a trailing break is not a paragraph; it is rendered as
/// the extra line fragment.
pub(crate) fn paragraph_count(rope: &Rope) -> usize {
    let lines = rope.len_lines();
    if ends_with_empty_line(rope) {
        lines - 1
    } else {
        lines
    }
}

/// Returns `true` for an empty document or one ending in a line break.
pub(crate) fn ends_with_empty_line(rope: &Rope) -> bool {
    let lines = rope.len_lines();
    rope.line(lines - 1).len_chars() == 0
}

/// Lazy, restartable sequence of paragraphs overlapping a range.
#[derive(Clone)]
pub struct Paragraphs<'a> {
    rope: &'a Rope,
    slots: &'a [ParagraphSlot],
    next: usize,
    end: usize,
}

impl<'a> Paragraphs<'a> {
    pub(crate) fn new(rope: &'a Rope, slots: &'a [ParagraphSlot], range: TextRange) -> Self {
        let count = paragraph_count(rope);
        if count == 0 {
            return Self {
                rope,
                slots,
                next: 0,
                end: 0,
            };
        }
        let len = rope.len_chars();
        let first = rope.char_to_line(range.start().char_index().min(len)).min(count - 1);
        let mut last = rope.char_to_line(range.end().char_index().min(len)).min(count - 1);
        // A non-empty range ending exactly at a paragraph start does not overlap it.
        if !range.is_empty() && last > first && rope.line_to_char(last) == range.end().char_index()
        {
            last -= 1;
        }
        Self {
            rope,
            slots,
            next: first,
            end: last + 1,
        }
    }
}

impl<'a> Iterator for Paragraphs<'a> {
    type Item = Paragraph<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        paragraph_at(self.rope, self.slots, index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

pub(crate) fn paragraph_at<'a>(
    rope: &'a Rope,
    slots: &'a [ParagraphSlot],
    index: usize,
) -> Option<Paragraph<'a>> {
    if index >= rope.len_lines() {
        return None;
    }
    let slot = slots.get(index)?;
    let start = rope.line_to_char(index);
    let slice = rope.line(index);
    Some(Paragraph {
        index,
        id: slot.id,
        range: TextRange::from_chars(start, start + slice.len_chars()),
        style: &slot.style,
        slice,
    })
}
