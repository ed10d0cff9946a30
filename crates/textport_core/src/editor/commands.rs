//! Editor command reducer.

use super::{CaseChange, TextEditor};
use crate::address::Location;
use crate::error::Result;
use crate::selection::{Direction, Granularity};
use serde::Deserialize;
use tracing::trace;

/// Input intents a host translates key and IME events into.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorCommand {
    InsertText(String),
    InsertNewline,
    InsertTab,
    /// Replace the selections without typing coalescing.
    Paste(String),
    Delete {
        direction: Direction,
        granularity: Granularity,
        #[serde(default)]
        allows_decomposition: bool,
    },
    Move {
        direction: Direction,
        granularity: Granularity,
        #[serde(default)]
        extending: bool,
    },
    SelectAll,
    SelectEnclosing(Granularity),
    AddInsertionPoint(Location),
    RemoveInsertionPoint(Location),
    Undo,
    Redo,
    BreakCoalescing,
    Yank,
    YankAndSelect,
    SetMarkedText(String),
    UnmarkText,
    /// Case rewrites act on the word under each selection head.
    CapitalizeWord,
    LowercaseWord,
    UppercaseWord,
}

/// What a batch of commands did.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyResult {
    pub changed: bool,
    pub selection_changed: bool,
    pub killed: bool,
    pub yanked: bool,
}

impl TextEditor {
    /// Apply `commands` in order.
    ///
    /// # Errors
    /// Stops at the first command whose edit fails; earlier commands stay applied.
    pub fn apply(&mut self, commands: &[EditorCommand]) -> Result<ApplyResult> {
        let mut result = ApplyResult::default();
        for command in commands {
            let selections_before = self.selections.clone();
            match command {
                EditorCommand::InsertText(text) => {
                    result.changed |= self.insert_text(text)?;
                }
                EditorCommand::InsertNewline => {
                    result.changed |= self.insert_newline()?;
                }
                EditorCommand::InsertTab => {
                    result.changed |= self.insert_tab()?;
                }
                EditorCommand::Paste(text) => {
                    self.marked = None;
                    self.undo.break_coalescing();
                    let ranges = self.selections.ranges();
                    result.changed |= self
                        .replace_ranges(ranges, text, super::EditKind::Discrete)?
                        .is_some();
                }
                EditorCommand::Delete {
                    direction,
                    granularity,
                    allows_decomposition,
                } => {
                    if self
                        .delete(*direction, *granularity, *allows_decomposition)?
                        .is_some()
                    {
                        result.changed = true;
                        result.killed = true;
                    }
                }
                EditorCommand::Move {
                    direction,
                    granularity,
                    extending,
                } => {
                    self.move_selection(*direction, *granularity, *extending);
                }
                EditorCommand::SelectAll => self.select_all(),
                EditorCommand::SelectEnclosing(granularity) => {
                    self.select_enclosing(*granularity);
                }
                EditorCommand::AddInsertionPoint(location) => {
                    self.add_insertion_point(*location);
                }
                EditorCommand::RemoveInsertionPoint(location) => {
                    self.remove_insertion_point(*location);
                }
                EditorCommand::Undo => {
                    result.changed |= self.undo()?;
                }
                EditorCommand::Redo => {
                    result.changed |= self.redo()?;
                }
                EditorCommand::BreakCoalescing => self.break_coalescing(),
                EditorCommand::Yank => {
                    let yanked = self.yank()?;
                    result.changed |= yanked;
                    result.yanked |= yanked;
                }
                EditorCommand::YankAndSelect => {
                    let yanked = self.yank_and_select()?;
                    result.changed |= yanked;
                    result.yanked |= yanked;
                }
                EditorCommand::SetMarkedText(text) => {
                    result.changed |= self.set_marked_text(text)?;
                }
                EditorCommand::UnmarkText => self.unmark_text(),
                EditorCommand::CapitalizeWord => {
                    result.changed |= self.change_case(CaseChange::Capitalize)?;
                }
                EditorCommand::LowercaseWord => {
                    result.changed |= self.change_case(CaseChange::Lowercase)?;
                }
                EditorCommand::UppercaseWord => {
                    result.changed |= self.change_case(CaseChange::Uppercase)?;
                }
            }
            result.selection_changed |= self.selections != selections_before;
            trace!(target: "textport::editor", ?command, "applied command");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;

    fn editor(text: &str) -> TextEditor {
        TextEditor::new(text, EditorConfig::default()).expect("editor")
    }

    #[test]
    fn empty_batch_reports_nothing() {
        let mut editor = editor("abc");
        assert_eq!(editor.apply(&[]).expect("apply"), ApplyResult::default());
    }

    #[test]
    fn typing_then_word_delete_reports_kill() {
        let mut editor = editor("");
        let result = editor
            .apply(&[
                EditorCommand::InsertText("hello".into()),
                EditorCommand::InsertText(" world".into()),
                EditorCommand::Delete {
                    direction: Direction::Backward,
                    granularity: Granularity::Word,
                    allows_decomposition: false,
                },
            ])
            .expect("apply");
        assert!(result.changed);
        assert!(result.killed);
        assert!(result.selection_changed);
        assert_eq!(editor.text(), "hello ");
        assert_eq!(editor.kill_ring().clone().yank(), "world");
    }

    #[test]
    fn movement_only_changes_selection() {
        let mut editor = editor("one two");
        let result = editor
            .apply(&[EditorCommand::Move {
                direction: Direction::Forward,
                granularity: Granularity::Word,
                extending: true,
            }])
            .expect("apply");
        assert!(!result.changed);
        assert!(result.selection_changed);
        assert_eq!(editor.selected_text(), "one");
    }

    #[test]
    fn paste_is_not_merged_with_typing() {
        let mut editor = editor("");
        editor
            .apply(&[
                EditorCommand::InsertText("a".into()),
                EditorCommand::Paste("bc".into()),
                EditorCommand::InsertText("d".into()),
            ])
            .expect("apply");
        assert_eq!(editor.text(), "abcd");
        assert_eq!(editor.undo_manager().undo_len(), 3);
        editor.apply(&[EditorCommand::Undo]).expect("undo");
        assert_eq!(editor.text(), "abc");
    }

    #[test]
    fn commands_deserialize_from_json() {
        let commands: Vec<EditorCommand> = serde_json::from_str(
            r#"[
                {"insert_text": "hi"},
                "insert_newline",
                {"move": {"direction": "backward", "granularity": "document"}},
                {"delete": {"direction": "forward", "granularity": "character"}}
            ]"#,
        )
        .expect("parse");
        let mut editor = editor("");
        editor.apply(&commands).expect("apply");
        assert_eq!(editor.text(), "i\n");
    }

    #[test]
    fn case_commands_rewrite_word_under_each_caret() {
        struct Case {
            command: &'static str,
            expected: &'static str,
        }
        let cases = [
            Case { command: "uppercase_word", expected: "hello WORLD fooBar" },
            Case { command: "lowercase_word", expected: "hello world fooBar" },
            Case { command: "capitalize_word", expected: "hello World fooBar" },
        ];
        for case in cases {
            let mut editor = editor("hello wORLD fooBar");
            editor.set_caret(Location::new(8));
            let commands: Vec<EditorCommand> =
                serde_json::from_str(&format!(r#"["{}"]"#, case.command)).expect("parse");
            let result = editor.apply(&commands).expect("apply");
            assert!(result.changed, "{}", case.command);
            assert_eq!(editor.text(), case.expected, "{}", case.command);
            assert_eq!(editor.selected_text(), &case.expected[6..11]);

            editor.apply(&[EditorCommand::Undo]).expect("undo");
            assert_eq!(editor.text(), "hello wORLD fooBar", "{}", case.command);
        }
    }

    #[test]
    fn case_change_over_many_carets_is_one_undo_group() {
        let mut editor = editor("one two three");
        editor.set_caret(Location::new(1));
        editor.add_insertion_point(Location::new(9));
        editor
            .apply(&[
                EditorCommand::InsertText("x".into()),
                EditorCommand::CapitalizeWord,
            ])
            .expect("apply");
        assert_eq!(editor.text(), "Oxne two Txhree");
        assert_eq!(editor.selected_text(), "Oxne\nTxhree");

        editor.apply(&[EditorCommand::Undo]).expect("undo");
        assert_eq!(editor.text(), "oxne two txhree");
        editor.apply(&[EditorCommand::Undo]).expect("undo");
        assert_eq!(editor.text(), "one two three");
    }

    #[test]
    fn case_change_without_effect_only_selects_word() {
        let mut editor = editor("HELLO there");
        editor.set_caret(Location::new(2));
        let result = editor
            .apply(&[EditorCommand::UppercaseWord])
            .expect("apply");
        assert!(!result.changed);
        assert!(result.selection_changed);
        assert_eq!(editor.selected_text(), "HELLO");
        assert_eq!(editor.undo_manager().undo_len(), 0);
    }
}
