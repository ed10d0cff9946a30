//! Editor façade tying content, layout, selections, and history together.

mod commands;

pub use commands::{ApplyResult, EditorCommand};

use crate::address::{Location, TextRange};
use crate::annotation::{AnnotationId, AnnotationSet, PlacedAnnotation};
use crate::completion::{WordIndex, WordIndexWorker};
use crate::config::EditorConfig;
use crate::content::{ContentChange, ContentStore};
use crate::error::Result;
use crate::geometry::Rect;
use crate::gutter::{GutterLineEntry, GutterProjector};
use crate::layout::{LayoutEngine, LayoutObserver, TextMeasurer};
use crate::selection::boundaries::is_word_char;
use crate::selection::{Direction, Granularity, Navigator, Selection, SelectionSet};
use crate::undo::{EditRecord, KillAction, KillRing, UndoManager};
use std::time::Instant;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// How an edit interacts with undo and the kill ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EditKind {
    /// Typing; may coalesce with adjacent typing.
    Typing,
    /// Programmatic or structural edit; always its own undo group.
    Discrete,
    /// Kill command; leaves kill-ring accumulation intact.
    Kill,
    /// Yank; keeps the kill ring in yanking state.
    Yank,
}

/// Single-threaded editing session over one document.
pub struct TextEditor {
    config: EditorConfig,
    content: ContentStore,
    layout: LayoutEngine,
    selections: SelectionSet,
    undo: UndoManager,
    kill_ring: KillRing,
    gutter: GutterProjector,
    marked: Option<TextRange>,
    word_index: Option<WordIndex>,
    annotations: AnnotationSet,
}

impl std::fmt::Debug for TextEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEditor")
            .field("content", &self.content)
            .field("selections", &self.selections.len())
            .field("undo", &self.undo.undo_len())
            .field("marked", &self.marked)
            .field("annotations", &self.annotations.len())
            .finish()
    }
}

impl TextEditor {
    /// Create an editor measuring with a monospace measurer from `config`.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidConfig`] when `config` fails validation.
    pub fn new(text: &str, config: EditorConfig) -> Result<Self> {
        config.validate()?;
        let content = ContentStore::new(text);
        let layout = LayoutEngine::new(&content, &config);
        Ok(Self::assemble(content, layout, config))
    }

    /// Create an editor with a caller-supplied measurer.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidConfig`] when `config` fails validation.
    pub fn with_measurer(
        text: &str,
        config: EditorConfig,
        measurer: Box<dyn TextMeasurer + Send>,
    ) -> Result<Self> {
        config.validate()?;
        let content = ContentStore::new(text);
        let layout = LayoutEngine::with_measurer(&content, &config, measurer);
        Ok(Self::assemble(content, layout, config))
    }

    fn assemble(content: ContentStore, layout: LayoutEngine, config: EditorConfig) -> Self {
        Self {
            selections: SelectionSet::default(),
            undo: UndoManager::from_config(&config),
            kill_ring: KillRing::new(config.kill_ring_size),
            gutter: GutterProjector::from_config(&config),
            marked: None,
            word_index: None,
            annotations: AnnotationSet::default(),
            content,
            layout,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn selections(&self) -> &SelectionSet {
        &self.selections
    }

    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo
    }

    pub fn kill_ring(&self) -> &KillRing {
        &self.kill_ring
    }

    pub fn gutter(&self) -> &GutterProjector {
        &self.gutter
    }

    pub fn marked_range(&self) -> Option<TextRange> {
        self.marked
    }

    pub fn text(&self) -> String {
        self.content.text()
    }

    /// Replace the selections; ranges are clamped into the document.
    pub fn set_selections(&mut self, selections: impl IntoIterator<Item = Selection>) {
        let len = self.content.len();
        self.selections = SelectionSet::from_selections(
            selections
                .into_iter()
                .map(|selection| selection.clamped(len)),
        );
        self.kill_ring.selection_changed();
        self.undo.break_coalescing();
    }

    /// Place a single caret at `location`.
    pub fn set_caret(&mut self, location: Location) {
        self.set_selections([Selection::caret(location)]);
    }

    /// Replace the whole document and forget history.
    ///
    /// # Errors
    /// Propagates content errors from the replacement.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        if let Some(change) = self.content.set_text(text)? {
            self.layout.invalidate(&self.content, &change);
            self.annotations.translate(&change);
        }
        self.undo.clear();
        self.kill_ring.text_changed();
        self.marked = None;
        self.word_index = None;
        self.selections = SelectionSet::default();
        Ok(())
    }

    /// Text covered by `range`.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidRange`] when `range` is out of bounds.
    pub fn substring(&self, range: TextRange) -> Result<String> {
        self.content.substring(range)
    }

    /// Text of every non-empty selected range, joined by line breaks.
    pub fn selected_text(&self) -> String {
        self.selections
            .ranges()
            .into_iter()
            .filter(|range| !range.is_empty())
            .filter_map(|range| self.content.substring(range).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace `ranges` with `text` in one transaction.
    fn replace_ranges(
        &mut self,
        ranges: Vec<TextRange>,
        text: &str,
        kind: EditKind,
    ) -> Result<Option<Vec<TextRange>>> {
        let edits = ranges
            .into_iter()
            .map(|range| (range, text.to_string()))
            .collect();
        self.replace_each(edits, kind)
    }

    /// Replace every range with its own text in one transaction.
    ///
    /// Replacements run back to front so earlier ranges stay valid; carets are
    /// placed after each inserted text.
    fn replace_each(
        &mut self,
        edits: Vec<(TextRange, String)>,
        kind: EditKind,
    ) -> Result<Option<Vec<TextRange>>> {
        let mut edits = edits;
        edits.sort_by_key(|(range, _)| (range.start(), range.end()));
        edits.dedup_by_key(|(range, _)| *range);
        if edits.is_empty() {
            return Ok(None);
        }
        for (range, _) in &edits {
            self.content.check_range(*range)?;
        }
        if edits
            .iter()
            .all(|(range, text)| range.is_empty() && text.is_empty())
        {
            return Ok(None);
        }

        let before = self.selections.clone();
        let (records, change) = self.content.transaction(|tx| {
            let mut records = Vec::with_capacity(edits.len());
            for (range, text) in edits.iter().rev() {
                let report = tx.replace(*range, text.as_str())?;
                records.push(EditRecord::new(
                    range.start(),
                    report.replaced_text,
                    text.as_str(),
                ));
            }
            Ok(records)
        })?;

        let mut inserted = Vec::with_capacity(edits.len());
        let mut shift = 0isize;
        for (range, text) in &edits {
            let inserted_len = text.chars().count();
            let start = (range.start().char_index() as isize + shift) as usize;
            inserted.push(TextRange::from_chars(start, start + inserted_len));
            shift += inserted_len as isize - range.len() as isize;
        }
        self.selections = SelectionSet::from_selections(
            inserted
                .iter()
                .map(|range| Selection::caret(range.end())),
        );

        self.marked = self.marked.and_then(|marked| {
            records.iter().try_fold(marked, |marked, record| {
                let replaced = TextRange::from_chars(
                    record.start.char_index(),
                    record.start.char_index() + record.deleted.chars().count(),
                );
                if marked.intersects(&replaced) {
                    None
                } else {
                    Some(marked.translated(replaced, record.inserted.chars().count()))
                }
            })
        });

        let now = Instant::now();
        let coalesce = kind == EditKind::Typing;
        self.undo
            .record(records, before, self.selections.clone(), coalesce, now);
        if matches!(kind, EditKind::Typing | EditKind::Discrete) {
            self.kill_ring.text_changed();
        }
        if let Some(change) = change.as_ref() {
            self.after_change(change);
        }
        Ok(Some(inserted))
    }

    fn after_change(&mut self, change: &ContentChange) {
        self.layout.invalidate(&self.content, change);
        self.annotations.translate(change);
        if self
            .word_index
            .as_ref()
            .is_some_and(|index| index.revision != change.revision)
        {
            self.word_index = None;
        }
    }

    /// Ranges that typing replaces: the marked range if any, else every selection.
    fn typing_ranges(&self) -> Vec<TextRange> {
        match self.marked {
            Some(marked) => vec![marked],
            None => self.selections.ranges(),
        }
    }

    /// Type `text` at every selection, coalescing with adjacent typing.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidRange`] when a selection is stale.
    pub fn insert_text(&mut self, text: &str) -> Result<bool> {
        if text.is_empty() {
            return Ok(false);
        }
        let ranges = self.typing_ranges();
        self.marked = None;
        Ok(self.replace_ranges(ranges, text, EditKind::Typing)?.is_some())
    }

    /// Insert a line break as its own undo group.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidRange`] when a selection is stale.
    pub fn insert_newline(&mut self) -> Result<bool> {
        self.undo.break_coalescing();
        let changed = self.insert_text("\n")?;
        self.undo.break_coalescing();
        Ok(changed)
    }

    /// Insert a tab at every selection.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidRange`] when a selection is stale.
    pub fn insert_tab(&mut self) -> Result<bool> {
        self.insert_text("\t")
    }

    /// Programmatic replacement that never coalesces.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidRange`] when `range` is stale.
    pub fn replace(&mut self, range: TextRange, text: &str) -> Result<bool> {
        self.undo.break_coalescing();
        let changed = self
            .replace_ranges(vec![range], text, EditKind::Discrete)?
            .is_some();
        Ok(changed)
    }

    /// Delete by `granularity` in `direction` at every selection.
    ///
    /// The removed text is added to the kill ring. Returns the removed text,
    /// or `None` when nothing was deleted.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidRange`] when a selection is stale.
    pub fn delete(
        &mut self,
        direction: Direction,
        granularity: Granularity,
        allows_decomposition: bool,
    ) -> Result<Option<String>> {
        let mut ranges = Vec::new();
        {
            let mut navigator = Navigator::new(&self.content, &mut self.layout);
            for selection in self.selections.selections() {
                ranges.extend(navigator.deletion_ranges(
                    selection,
                    direction,
                    granularity,
                    allows_decomposition,
                ));
            }
        }
        ranges.sort_by_key(|range| (range.start(), range.end()));
        let mut merged: Vec<TextRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if last.end() >= range.start() => *last = last.union(&range),
                _ => merged.push(range),
            }
        }
        if merged.is_empty() {
            return Ok(None);
        }
        let deleted = merged
            .iter()
            .map(|range| self.content.substring(*range))
            .collect::<Result<Vec<_>>>()?
            .concat();
        let kind = if granularity == Granularity::Character {
            EditKind::Typing
        } else {
            EditKind::Kill
        };
        if self.replace_ranges(merged, "", kind)?.is_none() {
            return Ok(None);
        }
        self.kill_ring
            .kill(kill_action(direction, granularity), deleted.as_str());
        Ok(Some(deleted))
    }

    /// Move or extend every selection.
    ///
    /// Returns `false` when no selection moved.
    pub fn move_selection(
        &mut self,
        direction: Direction,
        granularity: Granularity,
        extending: bool,
    ) -> bool {
        let mut moved = false;
        let mut next = Vec::with_capacity(self.selections.len());
        {
            let mut navigator = Navigator::new(&self.content, &mut self.layout);
            for selection in self.selections.selections() {
                match navigator.destination(selection, direction, granularity, extending, false) {
                    Some(destination) => {
                        moved = true;
                        next.push(destination);
                    }
                    None => next.push(selection.clone()),
                }
            }
        }
        if moved {
            self.selections = SelectionSet::from_selections(next);
            self.kill_ring.selection_changed();
            self.undo.break_coalescing();
        }
        moved
    }

    /// Select the whole document.
    pub fn select_all(&mut self) {
        let range = self.content.document_range();
        self.set_selections([Selection::new(range).with_granularity(Granularity::Document)]);
    }

    /// Expand every selection's head to the enclosing unit of `granularity`.
    pub fn select_enclosing(&mut self, granularity: Granularity) {
        let heads: Vec<Location> = self
            .selections
            .selections()
            .iter()
            .map(Selection::head)
            .collect();
        let mut navigator = Navigator::new(&self.content, &mut self.layout);
        let expanded: Vec<Selection> = heads
            .into_iter()
            .map(|head| navigator.selection_enclosing(head, granularity))
            .collect();
        self.set_selections(expanded);
    }

    /// Rewrite the word under every selection head and select the results.
    ///
    /// All words change in one undo group.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidRange`] when a selection is stale.
    pub fn change_case(&mut self, case: CaseChange) -> Result<bool> {
        let heads: Vec<Location> = self
            .selections
            .selections()
            .iter()
            .map(Selection::head)
            .collect();
        let mut navigator = Navigator::new(&self.content, &mut self.layout);
        let words: Vec<TextRange> = heads
            .into_iter()
            .map(|head| navigator.selection_enclosing(head, Granularity::Word).envelope())
            .filter(|range| !range.is_empty())
            .collect();
        let mut edits = Vec::with_capacity(words.len());
        let mut unchanged = true;
        for range in &words {
            let original = self.content.substring(*range)?;
            let rewritten = case.apply(&original);
            unchanged &= rewritten == original;
            edits.push((*range, rewritten));
        }
        if unchanged {
            if !words.is_empty() {
                self.set_selections(words.into_iter().map(Selection::new));
            }
            return Ok(false);
        }
        self.marked = None;
        self.undo.break_coalescing();
        let Some(replaced) = self.replace_each(edits, EditKind::Discrete)? else {
            return Ok(false);
        };
        self.undo.break_coalescing();
        self.selections = SelectionSet::from_selections(
            replaced.into_iter().map(Selection::new),
        );
        Ok(true)
    }

    /// Add a caret; merges with any selection already covering `location`.
    pub fn add_insertion_point(&mut self, location: Location) {
        let location = location.min(self.content.end_location());
        self.selections.add_insertion_point(location);
        self.kill_ring.selection_changed();
    }

    /// Remove the caret at `location`; the last selection is never removed.
    pub fn remove_insertion_point(&mut self, location: Location) -> bool {
        let removed = self.selections.remove_insertion_point(location);
        if removed {
            self.kill_ring.selection_changed();
        }
        removed
    }

    pub fn break_coalescing(&mut self) {
        self.undo.break_coalescing();
    }

    /// Undo the most recent group and restore its selections.
    ///
    /// Returns `false` when there was nothing to undo.
    ///
    /// # Errors
    /// Propagates content errors from replaying the inverse edits.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(outcome) = self.undo.undo(&mut self.content)? else {
            return Ok(false);
        };
        self.restore(outcome.selections, outcome.change.as_ref());
        Ok(true)
    }

    /// Redo the most recently undone group.
    ///
    /// # Errors
    /// Propagates content errors from replaying the edits.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(outcome) = self.undo.redo(&mut self.content)? else {
            return Ok(false);
        };
        self.restore(outcome.selections, outcome.change.as_ref());
        Ok(true)
    }

    fn restore(&mut self, selections: SelectionSet, change: Option<&ContentChange>) {
        let len = self.content.len();
        self.selections = SelectionSet::from_selections(
            selections
                .selections()
                .iter()
                .map(|selection| selection.clamped(len)),
        );
        self.marked = None;
        self.kill_ring.text_changed();
        if let Some(change) = change {
            self.after_change(change);
        }
    }

    /// Insert the current kill-ring entry at every selection.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidRange`] when a selection is stale.
    pub fn yank(&mut self) -> Result<bool> {
        let text = self.kill_ring.yank().to_string();
        if text.is_empty() {
            return Ok(false);
        }
        self.undo.break_coalescing();
        let ranges = self.selections.ranges();
        Ok(self.replace_ranges(ranges, &text, EditKind::Yank)?.is_some())
    }

    /// Insert a kill-ring entry and select it; repeating cycles to older entries.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidRange`] when a selection is stale.
    pub fn yank_and_select(&mut self) -> Result<bool> {
        let text = self.kill_ring.yank_and_select().to_string();
        self.undo.break_coalescing();
        let ranges = self.selections.ranges();
        let Some(inserted) = self.replace_ranges(ranges, &text, EditKind::Yank)? else {
            return Ok(false);
        };
        self.selections =
            SelectionSet::from_selections(inserted.into_iter().map(Selection::new));
        Ok(true)
    }

    /// Replace the marked range (or the selections) with `text` and mark it.
    ///
    /// Empty `text` removes the marked text and clears the mark.
    ///
    /// # Errors
    /// Returns [`crate::EditorError::InvalidRange`] when a selection is stale.
    pub fn set_marked_text(&mut self, text: &str) -> Result<bool> {
        let ranges = self.typing_ranges();
        self.marked = None;
        let Some(inserted) = self.replace_ranges(ranges, text, EditKind::Typing)? else {
            return Ok(false);
        };
        self.marked = inserted
            .last()
            .copied()
            .filter(|range| !range.is_empty());
        Ok(true)
    }

    /// Commit marked text as-is.
    pub fn unmark_text(&mut self) {
        self.marked = None;
    }

    pub fn annotations(&self) -> &AnnotationSet {
        &self.annotations
    }

    /// Anchor `message` at `location`, clamped into the document.
    pub fn add_annotation(
        &mut self,
        location: Location,
        message: impl Into<String>,
    ) -> AnnotationId {
        let location = location.min(self.content.end_location());
        self.annotations.add(location, message)
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> bool {
        self.annotations.remove(id)
    }

    pub fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    /// Annotations on lines materialized by the last layout pass.
    pub fn visible_annotations(&self) -> Vec<PlacedAnnotation<'_>> {
        self.annotations.visible(&self.content, &self.layout)
    }

    /// Lay out the visible rectangle.
    pub fn layout_viewport(
        &mut self,
        viewport: Rect,
        observer: &mut dyn LayoutObserver,
    ) -> TextRange {
        self.layout.layout_viewport(&self.content, viewport, observer)
    }

    pub fn set_wrap_width(&mut self, wrap_width: Option<f32>) {
        self.layout.set_wrap_width(&self.content, wrap_width);
    }

    /// Gutter entries for the fragments of the last layout pass.
    pub fn gutter_entries(&mut self) -> Vec<GutterLineEntry> {
        self.gutter.project(&self.layout, &self.selections)
    }

    /// Ask `worker` to index the current text.
    pub fn request_word_index(&self, worker: &WordIndexWorker) -> bool {
        worker.request(self.content.revision(), self.content.text())
    }

    /// Install `index` when it was built from the current revision.
    pub fn accept_word_index(&mut self, index: WordIndex) -> bool {
        if index.revision != self.content.revision() {
            debug!(
                target: "textport::completion",
                index_revision = index.revision,
                revision = self.content.revision(),
                "dropped stale word index"
            );
            return false;
        }
        self.word_index = Some(index);
        true
    }

    /// Word characters immediately before the primary caret.
    pub fn completion_prefix(&self) -> String {
        let head = self.selections.primary().head().char_index();
        let rope = self.content.rope();
        let mut start = head.min(rope.len_chars());
        while start > 0 && is_word_char(rope.char(start - 1)) {
            start -= 1;
        }
        rope.slice(start..head.min(rope.len_chars())).to_string()
    }

    /// Completions for the word before the primary caret.
    pub fn completions(&self, limit: usize) -> Vec<String> {
        let Some(index) = self.word_index.as_ref() else {
            return Vec::new();
        };
        let prefix = self.completion_prefix();
        index
            .suggestions(&prefix, limit)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Case rewrite applied to whole words.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseChange {
    /// First letter of each word upper case, the rest lower case.
    Capitalize,
    Lowercase,
    Uppercase,
}

impl CaseChange {
    pub fn apply(self, text: &str) -> String {
        match self {
            CaseChange::Lowercase => text.to_lowercase(),
            CaseChange::Uppercase => text.to_uppercase(),
            CaseChange::Capitalize => text
                .split_word_bounds()
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first
                            .to_uppercase()
                            .chain(chars.flat_map(char::to_lowercase))
                            .collect(),
                        None => String::new(),
                    }
                })
                .collect(),
        }
    }
}

fn kill_action(direction: Direction, granularity: Granularity) -> KillAction {
    let forward = direction.is_forward();
    match granularity {
        Granularity::Word if forward => KillAction::DeleteWordForward,
        Granularity::Word => KillAction::DeleteWordBackward,
        Granularity::Line if forward => KillAction::DeleteToEndOfLine,
        Granularity::Line => KillAction::DeleteToBeginningOfLine,
        Granularity::Paragraph if forward => KillAction::DeleteToEndOfParagraph,
        Granularity::Paragraph => KillAction::DeleteToBeginningOfParagraph,
        Granularity::Character | Granularity::Sentence | Granularity::Document => {
            KillAction::Delete
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(text: &str) -> TextEditor {
        TextEditor::new(text, EditorConfig::default()).expect("editor")
    }

    fn envelope(editor: &TextEditor) -> (usize, usize) {
        let range = editor.selections().primary().envelope();
        (range.start().char_index(), range.end().char_index())
    }

    #[test]
    fn typing_newline_splits_undo_groups() {
        let mut editor = editor("");
        editor.insert_text("a").expect("a");
        editor.insert_text("b").expect("b");
        editor.insert_newline().expect("newline");
        editor.insert_text("c").expect("c");
        editor.insert_text("d").expect("d");
        assert_eq!(editor.text(), "ab\ncd");

        editor.undo().expect("undo");
        assert_eq!(editor.text(), "ab\n");
        editor.undo().expect("undo");
        assert_eq!(editor.text(), "ab");
        editor.undo().expect("undo");
        assert_eq!(editor.text(), "");
        assert!(!editor.undo().expect("empty undo"));
    }

    #[test]
    fn replacing_selection_restores_it_on_undo() {
        let mut editor = editor("123456789");
        editor.set_selections([Selection::new(TextRange::from_chars(3, 6))]);
        editor.insert_text("a").expect("insert");
        assert_eq!(editor.text(), "123a789");
        assert_eq!(envelope(&editor), (4, 4));
        editor.undo().expect("undo");
        assert_eq!(editor.text(), "123456789");
        assert_eq!(envelope(&editor), (3, 6));
        editor.redo().expect("redo");
        assert_eq!(editor.text(), "123a789");
        assert_eq!(envelope(&editor), (4, 4));
    }

    #[test]
    fn multi_caret_insert_shifts_later_carets() {
        let mut editor = editor("ab\ncd");
        editor.set_caret(Location::new(1));
        editor.add_insertion_point(Location::new(4));
        editor.insert_text("XY").expect("insert");
        assert_eq!(editor.text(), "aXYb\ncXYd");
        let carets: Vec<usize> = editor
            .selections()
            .ranges()
            .iter()
            .map(|range| range.start().char_index())
            .collect();
        assert_eq!(carets, vec![3, 8]);
        editor.undo().expect("undo");
        assert_eq!(editor.text(), "ab\ncd");
        assert_eq!(editor.selections().len(), 2);
    }

    #[test]
    fn selected_text_joins_ranges_with_newlines() {
        let mut editor = editor("alpha beta gamma");
        editor.set_selections([
            Selection::new(TextRange::from_chars(0, 5)),
            Selection::new(TextRange::from_chars(11, 16)),
            Selection::caret(Location::new(7)),
        ]);
        assert_eq!(editor.selected_text(), "alpha\ngamma");
        editor.select_all();
        assert_eq!(editor.selected_text(), "alpha beta gamma");
    }

    #[test]
    fn consecutive_word_kills_accumulate_and_yank_back() {
        let mut editor = editor("one two three");
        editor.set_caret(Location::new(13));
        editor
            .delete(Direction::Backward, Granularity::Word, false)
            .expect("kill");
        editor
            .delete(Direction::Backward, Granularity::Word, false)
            .expect("kill");
        assert_eq!(editor.text(), "one ");
        editor.move_selection(Direction::Backward, Granularity::Document, false);
        assert!(editor.yank().expect("yank"));
        assert_eq!(editor.text(), "two threeone ");
    }

    #[test]
    fn yank_and_select_cycles_entries() {
        let config = EditorConfig {
            kill_ring_size: 2,
            ..EditorConfig::default()
        };
        let mut editor = TextEditor::new("aa bb", config).expect("editor");
        editor.set_caret(Location::new(5));
        editor
            .delete(Direction::Backward, Granularity::Word, false)
            .expect("kill bb");
        editor.set_caret(Location::new(0));
        editor
            .delete(Direction::Forward, Granularity::Word, false)
            .expect("kill aa");
        assert_eq!(editor.text(), " ");

        assert!(editor.yank_and_select().expect("yank"));
        assert_eq!(editor.text(), "aa ");
        assert_eq!(envelope(&editor), (0, 2));
        assert!(editor.yank_and_select().expect("cycle"));
        assert_eq!(editor.text(), "bb ");
        assert_eq!(envelope(&editor), (0, 2));
    }

    #[test]
    fn marked_range_follows_edits_and_clears_on_overlap() {
        let mut editor = editor("hello");
        editor.set_caret(Location::new(5));
        editor.set_marked_text("ka").expect("mark");
        assert_eq!(editor.marked_range(), Some(TextRange::from_chars(5, 7)));
        editor.set_marked_text("kan").expect("remark");
        assert_eq!(editor.text(), "hellokan");
        assert_eq!(editor.marked_range(), Some(TextRange::from_chars(5, 8)));

        editor
            .replace(TextRange::from_chars(0, 1), "HH")
            .expect("replace before");
        assert_eq!(editor.marked_range(), Some(TextRange::from_chars(6, 9)));
        editor
            .replace(TextRange::from_chars(7, 8), "")
            .expect("overlap");
        assert_eq!(editor.marked_range(), None);
    }

    #[test]
    fn stale_word_index_is_rejected() {
        let mut editor = editor("render renderer");
        let stale = WordIndex::build(editor.content().revision() + 1, "x", 1);
        assert!(!editor.accept_word_index(stale));
        let fresh = WordIndex::build(editor.content().revision(), &editor.text(), 3);
        assert!(editor.accept_word_index(fresh));
        editor.set_caret(Location::new(15));
        editor.insert_text(" ren").expect("type");
        assert!(editor.completions(5).is_empty());
    }

    #[test]
    fn completions_use_prefix_before_caret() {
        let mut editor = editor("render renderer re");
        let index = WordIndex::build(editor.content().revision(), &editor.text(), 3);
        assert!(editor.accept_word_index(index));
        editor.set_caret(Location::new(18));
        assert_eq!(editor.completion_prefix(), "re");
        assert_eq!(editor.completions(5), vec!["render", "renderer"]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EditorConfig {
            tab_width: 0,
            ..EditorConfig::default()
        };
        assert!(TextEditor::new("", config).is_err());
    }

    #[test]
    fn capitalize_handles_each_word_in_text() {
        struct Case {
            case: CaseChange,
            input: &'static str,
            expected: &'static str,
        }
        let cases = [
            Case {
                case: CaseChange::Capitalize,
                input: "hELLO wide wORLD",
                expected: "Hello Wide World",
            },
            Case { case: CaseChange::Uppercase, input: "straße", expected: "STRASSE" },
            Case { case: CaseChange::Lowercase, input: "ÀB", expected: "àb" },
        ];
        for case in cases {
            assert_eq!(case.case.apply(case.input), case.expected, "{:?}", case.case);
        }
    }

    #[test]
    fn annotations_move_with_edits_and_undo() {
        let mut editor = editor("first\nsecond\nthird\n");
        let id = editor.add_annotation(Location::new(6), "check");
        editor.set_caret(Location::ZERO);
        editor.insert_text("zero\n").expect("insert");
        let anchors: Vec<usize> = editor
            .annotations()
            .iter()
            .map(|annotation| annotation.location.char_index())
            .collect();
        assert_eq!(anchors, vec![11]);

        editor.undo().expect("undo");
        assert_eq!(
            editor.annotations().iter().next().map(|a| a.location),
            Some(Location::new(6))
        );

        editor.layout_viewport(Rect::new(0.0, 0.0, 200.0, 200.0), &mut ());
        let placed = editor.visible_annotations();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].id, id);
        assert!(editor.remove_annotation(id));
        assert!(editor.visible_annotations().is_empty());
    }
}
