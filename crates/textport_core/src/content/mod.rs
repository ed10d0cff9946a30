//! Content store: rope-backed attributed text decomposed into paragraphs.

mod paragraph;
mod transaction;

pub use paragraph::{AttributedRun, Paragraph, ParagraphId, ParagraphStyle, Paragraphs};
pub use transaction::EditTransaction;

use crate::address::{self, Location, TextRange};
use crate::error::{EditorError, Result};
use crossbeam_channel::{Receiver, Sender};
use paragraph::{paragraph_at, ParagraphSlot};
use ropey::Rope;
use std::cmp::Ordering;
use std::sync::Arc;

/// Line indexes touched by a change.
///
/// Old lines `start_line..=old_end_line` of the pre-change rope were replaced
/// by lines `start_line..=new_end_line` of the post-change rope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineDelta {
    pub start_line: usize,
    pub old_end_line: usize,
    pub new_end_line: usize,
}

/// Result of one `replace` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditReport {
    /// Replaced range in pre-edit coordinates.
    pub affected: TextRange,
    /// Inserted length in chars.
    pub inserted_len: usize,
    /// Text removed by the edit.
    pub replaced_text: String,
}

impl EditReport {
    /// Range now occupied by the inserted text.
    pub fn inserted_range(&self) -> TextRange {
        let start = self.affected.start().char_index();
        TextRange::from_chars(start, start + self.inserted_len)
    }

    pub fn length_delta(&self) -> isize {
        self.inserted_len as isize - self.affected.len() as isize
    }
}

/// Notification posted once per committed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentChange {
    /// Store revision after the transaction.
    pub revision: u64,
    /// Union of replaced ranges in pre-transaction coordinates.
    pub affected: TextRange,
    /// Length of the text now covering `affected`.
    pub inserted_len: usize,
    pub length_delta: isize,
    pub lines: LineDelta,
}

/// Single source of truth for document text and paragraph attributes.
pub struct ContentStore {
    rope: Rope,
    slots: Vec<ParagraphSlot>,
    default_style: Arc<ParagraphStyle>,
    revision: u64,
    observers: Vec<Sender<ContentChange>>,
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new("")
    }
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("len_chars", &self.rope.len_chars())
            .field("paragraphs", &self.paragraph_count())
            .field("revision", &self.revision)
            .finish()
    }
}

impl ContentStore {
    /// Create a store from UTF-8 text with the default paragraph style.
    pub fn new(text: &str) -> Self {
        Self::with_style(text, ParagraphStyle::default())
    }

    pub fn with_style(text: &str, style: ParagraphStyle) -> Self {
        let rope = Rope::from_str(text);
        let default_style = Arc::new(style);
        let slots = (0..rope.len_lines())
            .map(|_| ParagraphSlot::new(Arc::clone(&default_style)))
            .collect();
        Self {
            rope,
            slots,
            default_style,
            revision: 0,
            observers: Vec::new(),
        }
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn len_utf16(&self) -> usize {
        self.rope.len_utf16_cu()
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn end_location(&self) -> Location {
        Location::new(self.rope.len_chars())
    }

    pub fn document_range(&self) -> TextRange {
        TextRange::new(Location::ZERO, self.end_location())
    }

    pub fn default_style(&self) -> &Arc<ParagraphStyle> {
        &self.default_style
    }

    /// Validate that `range` lies within the current document.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidRange`] for stale or out-of-bounds ranges.
    pub fn check_range(&self, range: TextRange) -> Result<()> {
        let len = self.len();
        if range.end().char_index() > len {
            return Err(EditorError::InvalidRange {
                start: range.start().char_index(),
                end: range.end().char_index(),
                len,
            });
        }
        Ok(())
    }

    /// Text covered by `range`.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidRange`] when `range` is out of bounds.
    pub fn substring(&self, range: TextRange) -> Result<String> {
        self.check_range(range)?;
        Ok(self.rope.slice(range.chars()).to_string())
    }

    pub fn char_at(&self, location: Location) -> Option<char> {
        self.rope.get_char(location.char_index())
    }

    pub fn compare(&self, a: Location, b: Location) -> Ordering {
        address::compare(a, b)
    }

    /// Distance from `from` to `to` in UTF-16 code units.
    pub fn offset(&self, from: Location, to: Location) -> isize {
        address::offset(&self.rope, from, to)
    }

    /// Location `offset_by` UTF-16 code units from `from`, if in bounds.
    pub fn location(&self, from: Location, offset_by: isize) -> Option<Location> {
        address::location_offset_by(&self.rope, from, offset_by)
    }

    /// Number of paragraph elements.
    pub fn paragraph_count(&self) -> usize {
        paragraph::paragraph_count(&self.rope)
    }

    /// Returns `true` when an extra empty line follows the last paragraph.
    pub fn has_extra_line(&self) -> bool {
        paragraph::ends_with_empty_line(&self.rope)
    }

    /// Number of rope lines, counting the extra empty line when present.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Paragraph at `index`, including the trailing empty line slot.
    pub fn paragraph(&self, index: usize) -> Option<Paragraph<'_>> {
        paragraph_at(&self.rope, &self.slots, index)
    }

    /// Index of the line containing `location` (clamped to the document end).
    pub fn line_index_at(&self, location: Location) -> usize {
        self.rope
            .char_to_line(location.char_index().min(self.rope.len_chars()))
    }

    /// Index of the paragraph containing `location`.
    ///
    /// A location on the extra empty line maps to the paragraph before it.
    pub fn paragraph_index_at(&self, location: Location) -> usize {
        let line = self.line_index_at(location);
        line.min(self.paragraph_count().saturating_sub(1))
    }

    /// Char range of line `index` including its break.
    pub fn line_range(&self, index: usize) -> TextRange {
        let lines = self.rope.len_lines();
        if index >= lines {
            return TextRange::empty(self.end_location());
        }
        let start = self.rope.line_to_char(index);
        TextRange::from_chars(start, start + self.rope.line(index).len_chars())
    }

    pub(crate) fn slot_id(&self, line: usize) -> Option<ParagraphId> {
        self.slots.get(line).map(|slot| slot.id)
    }

    pub(crate) fn slot_style(&self, line: usize) -> &Arc<ParagraphStyle> {
        self.slots
            .get(line)
            .map(|slot| &slot.style)
            .unwrap_or(&self.default_style)
    }

    /// Lazily enumerate paragraphs overlapping `range` in document order.
    pub fn enumerate_paragraphs(&self, range: TextRange) -> Paragraphs<'_> {
        Paragraphs::new(&self.rope, &self.slots, range.clamped(self.len()))
    }

    /// Open a transaction grouping several replacements into one change.
    pub fn begin_transaction(&mut self) -> EditTransaction<'_> {
        EditTransaction::new(self)
    }

    /// Run `edits` in a transaction, committing on success and rolling back on error.
    ///
    /// # Errors
    /// Propagates the first error returned by `edits`.
    pub fn transaction<T>(
        &mut self,
        edits: impl FnOnce(&mut EditTransaction<'_>) -> Result<T>,
    ) -> Result<(T, Option<ContentChange>)> {
        let mut transaction = self.begin_transaction();
        let value = edits(&mut transaction)?;
        Ok((value, transaction.commit()))
    }

    /// Replace `range` with `run` as a single-edit transaction.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidRange`] when `range` is stale or out of bounds.
    pub fn replace(
        &mut self,
        range: TextRange,
        run: impl Into<AttributedRun>,
    ) -> Result<EditReport> {
        let (report, _) = self.transaction(|tx| tx.replace(range, run))?;
        Ok(report)
    }

    /// Replace the whole document.
    ///
    /// # Errors
    /// Propagates [`EditorError::InvalidRange`] from the replacement.
    pub fn set_text(&mut self, text: &str) -> Result<Option<ContentChange>> {
        let range = self.document_range();
        let (_, change) = self.transaction(|tx| tx.replace(range, text))?;
        Ok(change)
    }

    /// Apply paragraph attributes to every paragraph overlapping `range`.
    ///
    /// Restyled paragraphs get fresh identities so cached layout is rebuilt.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidRange`] when `range` is out of bounds.
    pub fn set_paragraph_style(
        &mut self,
        range: TextRange,
        style: ParagraphStyle,
    ) -> Result<Option<ContentChange>> {
        self.check_range(range)?;
        let style = Arc::new(style);
        let indexes: Vec<usize> = self
            .enumerate_paragraphs(range)
            .map(|paragraph| paragraph.index)
            .collect();
        let (Some(&first), Some(&last)) = (indexes.first(), indexes.last()) else {
            return Ok(None);
        };
        for index in first..=last {
            self.slots[index] = ParagraphSlot::new(Arc::clone(&style));
        }
        self.revision = self.revision.wrapping_add(1);
        let start = self.rope.line_to_char(first);
        let end = start
            + (first..=last)
                .map(|line| self.rope.line(line).len_chars())
                .sum::<usize>();
        let change = ContentChange {
            revision: self.revision,
            affected: TextRange::from_chars(start, end),
            inserted_len: end - start,
            length_delta: 0,
            lines: LineDelta {
                start_line: first,
                old_end_line: last,
                new_end_line: last,
            },
        };
        self.post(&change);
        Ok(Some(change))
    }

    /// Register an observer for committed changes.
    ///
    /// Observers whose receiver has been dropped are pruned on the next post.
    pub fn subscribe(&mut self) -> Receiver<ContentChange> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.observers.push(tx);
        rx
    }

    fn post(&mut self, change: &ContentChange) {
        self.observers
            .retain(|observer| observer.send(change.clone()).is_ok());
    }

    fn resync_slots(&mut self) {
        let lines = self.rope.len_lines();
        let fill = self
            .slots
            .last()
            .map(|slot| Arc::clone(&slot.style))
            .unwrap_or_else(|| Arc::clone(&self.default_style));
        self.slots.truncate(lines);
        while self.slots.len() < lines {
            self.slots.push(ParagraphSlot::new(Arc::clone(&fill)));
        }
        for slot in &mut self.slots {
            slot.id = ParagraphId::next();
        }
    }
}
