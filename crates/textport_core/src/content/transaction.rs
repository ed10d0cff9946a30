//! Scoped editing transactions over the content store.

use super::paragraph::{ParagraphSlot, ParagraphStyle};
use super::{ContentChange, ContentStore, EditReport, LineDelta};
use crate::address::TextRange;
use crate::error::{EditorError, Result};
use ropey::Rope;
use std::sync::Arc;
use tracing::{debug, trace};

/// Coalesced char span touched by every edit of a transaction.
///
/// `start` and `old_end` are in pre-transaction coordinates, `new_end` in the
/// current ones.
#[derive(Clone, Copy, Debug, Default)]
struct ChangeAccumulator {
    span: Option<(usize, usize, usize)>,
}

impl ChangeAccumulator {
    fn record(&mut self, start: usize, end: usize, inserted: usize) {
        let Some((acc_start, old_end, new_end)) = self.span else {
            self.span = Some((start, end, start + inserted));
            return;
        };
        let shift = new_end as isize - old_end as isize;
        let next_start = acc_start.min(start);
        let next_old_end = if end > new_end {
            (end as isize - shift) as usize
        } else {
            old_end
        };
        let next_new_end = new_end.max(end) + inserted - (end - start);
        self.span = Some((next_start, next_old_end.max(old_end), next_new_end));
    }
}

/// Line-range delta for a char-level edit between two ropes.
pub(crate) fn line_delta(
    before: &Rope,
    after: &Rope,
    start: usize,
    old_end: usize,
    new_end: usize,
) -> LineDelta {
    let mut start_line = before.char_to_line(start.min(before.len_chars()));
    // Inserting after a lone CR can merge it with a following LF.
    if start > 0 && start <= before.len_chars() && before.char(start - 1) == '\r' {
        start_line = before.char_to_line(start - 1);
    }
    LineDelta {
        start_line,
        old_end_line: before.char_to_line(old_end.min(before.len_chars())),
        new_end_line: after.char_to_line(new_end.min(after.len_chars())),
    }
}

/// Replace slots for `delta`'s old lines with fresh slots for its new lines.
///
/// Returns the journal entry that reverts the splice, or `None` when the
/// delta does not describe the new line count; the caller then resyncs slot
/// count while keeping styles by index.
pub(crate) fn splice_slots(
    slots: &mut Vec<ParagraphSlot>,
    delta: LineDelta,
    new_len: usize,
    style: &Arc<ParagraphStyle>,
) -> Option<SlotUndo> {
    let old_len = slots.len();
    let old_start = delta.start_line;
    let old_end_excl = delta.old_end_line.saturating_add(1);
    if old_start >= old_len || old_end_excl > old_len || old_start >= old_end_excl {
        return None;
    }
    let old_count = old_end_excl - old_start;
    let new_count = delta
        .new_end_line
        .saturating_sub(delta.start_line)
        .saturating_add(1);
    if old_len - old_count + new_count != new_len {
        return None;
    }
    let removed = slots
        .splice(
            old_start..old_end_excl,
            (0..new_count).map(|_| ParagraphSlot::new(Arc::clone(style))),
        )
        .collect();
    Some(SlotUndo::Splice {
        start: old_start,
        inserted: new_count,
        removed,
    })
}

/// Reverts one slot mutation made inside a transaction.
#[derive(Debug)]
pub(crate) enum SlotUndo {
    /// Slots `start..start + inserted` replaced `removed`.
    Splice {
        start: usize,
        inserted: usize,
        removed: Vec<ParagraphSlot>,
    },
    /// Every slot was regenerated; holds the previous vector.
    Full(Vec<ParagraphSlot>),
}

impl SlotUndo {
    fn revert(self, slots: &mut Vec<ParagraphSlot>) {
        match self {
            SlotUndo::Splice {
                start,
                inserted,
                removed,
            } => {
                slots.splice(start..start + inserted, removed);
            }
            SlotUndo::Full(previous) => *slots = previous,
        }
    }
}

/// Batch of edits applied atomically with a single change notification.
///
/// Dropping a transaction without calling [`EditTransaction::commit`] restores
/// the store to its state before the transaction began.
pub struct EditTransaction<'a> {
    store: &'a mut ContentStore,
    rope_before: Rope,
    slot_journal: Vec<SlotUndo>,
    accumulator: ChangeAccumulator,
    committed: bool,
}

impl<'a> EditTransaction<'a> {
    pub(crate) fn new(store: &'a mut ContentStore) -> Self {
        let rope_before = store.rope.clone();
        Self {
            store,
            rope_before,
            slot_journal: Vec::new(),
            accumulator: ChangeAccumulator::default(),
            committed: false,
        }
    }

    /// Current store state, including edits made so far in this transaction.
    pub fn store(&self) -> &ContentStore {
        self.store
    }

    /// Replace `range` with `run`.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidRange`] when `range` exceeds the current
    /// document; the store is left untouched by the failed call.
    pub fn replace(
        &mut self,
        range: TextRange,
        run: impl Into<super::AttributedRun>,
    ) -> Result<EditReport> {
        let run = run.into();
        let len = self.store.rope.len_chars();
        let start = range.start().char_index();
        let end = range.end().char_index();
        if end > len {
            return Err(EditorError::InvalidRange { start, end, len });
        }
        let inserted = run.char_len();
        let replaced_text = self.store.rope.slice(start..end).to_string();
        if start == end && inserted == 0 {
            return Ok(EditReport {
                affected: range,
                inserted_len: 0,
                replaced_text,
            });
        }

        let before = self.store.rope.clone();
        let style = match run.style.as_ref() {
            Some(style) => Arc::clone(style),
            None => {
                let line = before.char_to_line(start);
                self.store
                    .slots
                    .get(line)
                    .map(|slot| Arc::clone(&slot.style))
                    .unwrap_or_else(|| Arc::clone(&self.store.default_style))
            }
        };
        if start < end {
            self.store.rope.remove(start..end);
        }
        if inserted > 0 {
            self.store.rope.insert(start, run.text.as_str());
        }
        let delta = line_delta(&before, &self.store.rope, start, end, start + inserted);
        let new_len = self.store.rope.len_lines();
        match splice_slots(&mut self.store.slots, delta, new_len, &style) {
            Some(undo) => self.slot_journal.push(undo),
            None => {
                self.slot_journal
                    .push(SlotUndo::Full(self.store.slots.clone()));
                self.store.resync_slots();
            }
        }
        self.accumulator.record(start, end, inserted);
        trace!(
            target: "textport::content",
            start,
            end,
            inserted,
            "applied replacement"
        );
        Ok(EditReport {
            affected: range,
            inserted_len: inserted,
            replaced_text,
        })
    }

    /// Apply all edits and post one notification describing their union.
    ///
    /// Returns `None` when the transaction changed nothing.
    pub fn commit(mut self) -> Option<ContentChange> {
        self.committed = true;
        let (start, old_end, new_end) = self.accumulator.span?;
        self.store.revision = self.store.revision.wrapping_add(1);
        let lines = line_delta(&self.rope_before, &self.store.rope, start, old_end, new_end);
        let change = ContentChange {
            revision: self.store.revision,
            affected: TextRange::from_chars(start, old_end),
            inserted_len: new_end - start,
            length_delta: self.store.rope.len_chars() as isize
                - self.rope_before.len_chars() as isize,
            lines,
        };
        debug!(
            target: "textport::content",
            revision = change.revision,
            start,
            old_end,
            inserted = change.inserted_len,
            "committed edit transaction"
        );
        self.store.post(&change);
        Some(change)
    }
}

impl Drop for EditTransaction<'_> {
    fn drop(&mut self) {
        if self.committed || self.accumulator.span.is_none() {
            return;
        }
        self.store.rope = std::mem::take(&mut self.rope_before);
        while let Some(undo) = self.slot_journal.pop() {
            undo.revert(&mut self.store.slots);
        }
        debug!(target: "textport::content", "rolled back edit transaction");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(text: &str, edits: &[(usize, usize, &str)]) -> (String, (usize, usize, usize)) {
        let mut rope = Rope::from_str(text);
        let mut acc = ChangeAccumulator::default();
        for (start, end, insert) in edits {
            rope.remove(*start..*end);
            rope.insert(*start, insert);
            acc.record(*start, *end, insert.chars().count());
        }
        (rope.to_string(), acc.span.unwrap_or_default())
    }

    #[test]
    fn accumulator_covers_every_edit() {
        struct Case {
            edits: Vec<(usize, usize, &'static str)>,
            expected: (usize, usize, usize),
        }
        let cases = [
            Case {
                edits: vec![(2, 4, "x")],
                expected: (2, 4, 3),
            },
            Case {
                edits: vec![(6, 7, ""), (1, 2, "zz")],
                expected: (1, 7, 7),
            },
            Case {
                edits: vec![(1, 1, "abc"), (8, 9, "")],
                expected: (1, 6, 8),
            },
        ];
        for case in cases {
            let original = "0123456789";
            let (after, span) = apply(original, &case.edits);
            assert_eq!(span, case.expected, "edits {:?}", case.edits);
            let (start, old_end, new_end) = span;
            assert_eq!(original[..start], after[..start]);
            assert_eq!(original[old_end..], after[new_end..]);
        }
    }

    #[test]
    fn splice_slots_preserves_unaffected_ids() {
        let style = Arc::new(ParagraphStyle::default());
        let mut slots: Vec<_> = (0..4).map(|_| ParagraphSlot::new(Arc::clone(&style))).collect();
        let ids: Vec<_> = slots.iter().map(|slot| slot.id).collect();
        let delta = LineDelta {
            start_line: 1,
            old_end_line: 2,
            new_end_line: 3,
        };
        let undo = splice_slots(&mut slots, delta, 5, &style).expect("splice");
        assert_eq!(slots.len(), 5);
        assert_eq!(slots[0].id, ids[0]);
        assert_eq!(slots[4].id, ids[3]);
        assert!(!ids.contains(&slots[1].id));
        assert!(splice_slots(&mut slots, delta, 9, &style).is_none());

        undo.revert(&mut slots);
        let restored: Vec<_> = slots.iter().map(|slot| slot.id).collect();
        assert_eq!(restored, ids);
    }

    #[test]
    fn rollback_replays_slot_journal_in_reverse() {
        let mut store = ContentStore::new("a\nb\nc\nd");
        let ids: Vec<_> = (0..store.line_count())
            .filter_map(|line| store.slot_id(line))
            .collect();
        {
            let mut tx = store.begin_transaction();
            tx.replace(TextRange::from_chars(2, 3), "x\ny\nz").expect("split b");
            tx.replace(TextRange::from_chars(0, 4), "").expect("join lines");
            assert!(tx.replace(TextRange::from_chars(0, 99), "").is_err());
        }
        assert_eq!(store.text(), "a\nb\nc\nd");
        let restored: Vec<_> = (0..store.line_count())
            .filter_map(|line| store.slot_id(line))
            .collect();
        assert_eq!(restored, ids);
        assert_eq!(store.revision(), 0);
    }
}
