//! Coalescing undo/redo history with bounded memory.

mod kill_ring;

pub use kill_ring::{KillAction, KillRing};

use crate::address::{Location, TextRange};
use crate::config::EditorConfig;
use crate::content::{ContentChange, ContentStore};
use crate::error::Result;
use crate::selection::SelectionSet;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// One replacement as it was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditRecord {
    /// Replacement start at the time it was applied.
    pub start: Location,
    pub deleted: String,
    pub inserted: String,
}

impl EditRecord {
    pub fn new(start: Location, deleted: impl Into<String>, inserted: impl Into<String>) -> Self {
        Self {
            start,
            deleted: deleted.into(),
            inserted: inserted.into(),
        }
    }

    /// Range covered by the inserted text after the edit.
    pub fn undo_range(&self) -> TextRange {
        let start = self.start.char_index();
        TextRange::from_chars(start, start + self.inserted.chars().count())
    }

    fn redo_range(&self) -> TextRange {
        let start = self.start.char_index();
        TextRange::from_chars(start, start + self.deleted.chars().count())
    }

    fn bytes(&self) -> usize {
        self.deleted.len().saturating_add(self.inserted.len())
    }
}

/// Edits committed atomically plus the selections around them.
#[derive(Clone, Debug)]
pub struct UndoGroup {
    records: Vec<EditRecord>,
    selections_before: SelectionSet,
    selections_after: SelectionSet,
}

impl UndoGroup {
    pub fn records(&self) -> &[EditRecord] {
        &self.records
    }

    pub fn selections_before(&self) -> &SelectionSet {
        &self.selections_before
    }

    pub fn selections_after(&self) -> &SelectionSet {
        &self.selections_after
    }

    fn bytes(&self) -> usize {
        self.records.iter().map(EditRecord::bytes).sum()
    }
}

/// Whether new edits may join the most recent group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoState {
    Idle,
    Coalescing,
}

/// Outcome of an undo or redo step.
#[derive(Clone, Debug)]
pub struct UndoOutcome {
    pub change: Option<ContentChange>,
    /// Selections to restore.
    pub selections: SelectionSet,
}

/// LIFO undo stack whose groups coalesce adjacent typing.
#[derive(Debug)]
pub struct UndoManager {
    undo: VecDeque<UndoGroup>,
    redo: Vec<UndoGroup>,
    state: UndoState,
    last_range: Option<TextRange>,
    last_at: Option<Instant>,
    undo_bytes: usize,
    max_depth: usize,
    max_bytes: usize,
    coalesce_window: Duration,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl UndoManager {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            state: UndoState::Idle,
            last_range: None,
            last_at: None,
            undo_bytes: 0,
            max_depth: config.undo_depth.max(1),
            max_bytes: config.undo_max_bytes,
            coalesce_window: config.coalesce_window(),
        }
    }

    pub fn state(&self) -> UndoState {
        self.state
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Close the open coalescing group so the next edit starts a new one.
    pub fn break_coalescing(&mut self) {
        if self.state == UndoState::Coalescing {
            trace!(target: "textport::undo", "coalescing closed");
        }
        self.state = UndoState::Idle;
        self.last_range = None;
    }

    /// Returns `true` when an edit at `range` would join the open group.
    ///
    /// The range must intersect the last recorded range or start exactly at
    /// its end.
    pub fn check_coalescing(&self, range: TextRange) -> bool {
        if self.state != UndoState::Coalescing {
            return false;
        }
        self.last_range
            .is_some_and(|last| last.intersects(&range) || last.end() == range.start())
    }

    /// Record edits applied in one transaction.
    ///
    /// With `coalesce` set, the edits join the open group when they are
    /// adjacent to the last recorded edit and within the coalescing window;
    /// otherwise they open a new group. Without it, the group is closed.
    pub fn record(
        &mut self,
        records: Vec<EditRecord>,
        before: SelectionSet,
        after: SelectionSet,
        coalesce: bool,
        at: Instant,
    ) {
        let records: Vec<EditRecord> = records
            .into_iter()
            .filter(|record| !(record.deleted.is_empty() && record.inserted.is_empty()))
            .collect();
        let Some(range) = records
            .iter()
            .map(EditRecord::undo_range)
            .min_by_key(|range| range.start())
        else {
            return;
        };
        self.redo.clear();

        let within_window = self
            .last_at
            .is_some_and(|last| at.saturating_duration_since(last) <= self.coalesce_window);
        let joins = coalesce && within_window && self.check_coalescing(range);
        let bytes: usize = records.iter().map(EditRecord::bytes).sum();
        match self.undo.back_mut() {
            Some(group) if joins => {
                group.records.extend(records);
                group.selections_after = after;
                trace!(target: "textport::undo", groups = self.undo.len(), "coalesced edit");
            }
            _ => {
                self.undo.push_back(UndoGroup {
                    records,
                    selections_before: before,
                    selections_after: after,
                });
                debug!(target: "textport::undo", groups = self.undo.len(), "opened undo group");
            }
        }
        self.undo_bytes = self.undo_bytes.saturating_add(bytes);
        if coalesce {
            self.state = UndoState::Coalescing;
            self.last_range = Some(range);
        } else {
            self.state = UndoState::Idle;
            self.last_range = None;
        }
        self.last_at = Some(at);
        self.trim_undo();
    }

    /// Record a single edit now.
    pub fn record_edit(
        &mut self,
        record: EditRecord,
        before: SelectionSet,
        after: SelectionSet,
        coalesce: bool,
    ) {
        self.record(vec![record], before, after, coalesce, Instant::now());
    }

    fn trim_undo(&mut self) {
        while self.undo.len() > self.max_depth || self.undo_bytes > self.max_bytes {
            let Some(removed) = self.undo.pop_front() else {
                break;
            };
            self.undo_bytes = self.undo_bytes.saturating_sub(removed.bytes());
            if self.undo.is_empty() {
                self.break_coalescing();
            }
        }
    }

    /// Revert the most recent group.
    ///
    /// Returns `Ok(None)` when there is nothing to undo.
    ///
    /// # Errors
    /// Returns an error when the content no longer matches the recorded edits;
    /// the content is left unchanged in that case.
    pub fn undo(&mut self, content: &mut ContentStore) -> Result<Option<UndoOutcome>> {
        self.break_coalescing();
        let Some(group) = self.undo.pop_back() else {
            return Ok(None);
        };
        let applied = content.transaction(|tx| {
            for record in group.records.iter().rev() {
                tx.replace(record.undo_range(), record.deleted.as_str())?;
            }
            Ok(())
        });
        let (_, change) = match applied {
            Ok(applied) => applied,
            Err(err) => {
                self.undo.push_back(group);
                return Err(err);
            }
        };
        self.undo_bytes = self.undo_bytes.saturating_sub(group.bytes());
        let selections = group.selections_before.clone();
        debug!(
            target: "textport::undo",
            records = group.records.len(),
            remaining = self.undo.len(),
            "undo"
        );
        self.redo.push(group);
        Ok(Some(UndoOutcome { change, selections }))
    }

    /// Reapply the most recently undone group.
    ///
    /// Returns `Ok(None)` when there is nothing to redo.
    ///
    /// # Errors
    /// Returns an error when the content no longer matches the recorded edits.
    pub fn redo(&mut self, content: &mut ContentStore) -> Result<Option<UndoOutcome>> {
        self.break_coalescing();
        let Some(group) = self.redo.pop() else {
            return Ok(None);
        };
        let applied = content.transaction(|tx| {
            for record in &group.records {
                tx.replace(record.redo_range(), record.inserted.as_str())?;
            }
            Ok(())
        });
        let (_, change) = match applied {
            Ok(applied) => applied,
            Err(err) => {
                self.redo.push(group);
                return Err(err);
            }
        };
        let selections = group.selections_after.clone();
        self.undo_bytes = self.undo_bytes.saturating_add(group.bytes());
        debug!(
            target: "textport::undo",
            records = group.records.len(),
            remaining = self.redo.len(),
            "redo"
        );
        self.undo.push_back(group);
        self.trim_undo();
        Ok(Some(UndoOutcome { change, selections }))
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.undo_bytes = 0;
        self.break_coalescing();
    }
}
