//! Kill ring for kill/yank style deletion commands.

/// Deletion command that feeds the kill ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KillAction {
    Delete,
    DeleteToMark,
    DeleteWordForward,
    DeleteWordBackward,
    DeleteToBeginningOfLine,
    DeleteToEndOfLine,
    DeleteToBeginningOfParagraph,
    DeleteToEndOfParagraph,
}

impl KillAction {
    /// Backward kills grow the current entry at its front.
    fn prepends(self) -> bool {
        matches!(
            self,
            KillAction::DeleteWordBackward
                | KillAction::DeleteToBeginningOfLine
                | KillAction::DeleteToBeginningOfParagraph
        )
    }
}

/// Fixed-size ring of killed text.
///
/// Consecutive kills with the same action accumulate into one entry; any
/// other edit or a selection change starts a fresh entry on the next kill.
#[derive(Clone, Debug)]
pub struct KillRing {
    entries: Vec<String>,
    index: usize,
    yanking: bool,
    last_action: Option<KillAction>,
}

impl KillRing {
    /// Ring with `size` entries; a size of zero is treated as one.
    pub fn new(size: usize) -> Self {
        Self {
            entries: vec![String::new(); size.max(1)],
            index: 0,
            yanking: false,
            last_action: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Call when the selection moves without editing.
    pub fn selection_changed(&mut self) {
        self.last_action = None;
    }

    /// Call when text changes through anything other than a kill.
    pub fn text_changed(&mut self) {
        self.yanking = false;
        self.last_action = None;
    }

    /// Record `text` removed by `action`.
    pub fn kill(&mut self, action: KillAction, text: &str) {
        if self.last_action != Some(action) {
            self.last_action = Some(action);
            self.index = (self.index + 1) % self.entries.len();
            self.entries[self.index].clear();
        }
        self.yanking = false;
        let entry = &mut self.entries[self.index];
        if action == KillAction::Delete {
            *entry = text.to_string();
        } else if action.prepends() {
            entry.insert_str(0, text);
        } else {
            entry.push_str(text);
        }
    }

    /// Current entry.
    pub fn yank(&mut self) -> &str {
        self.yanking = true;
        &self.entries[self.index]
    }

    /// Current entry, stepping to the previous one when already yanking.
    pub fn yank_and_select(&mut self) -> &str {
        if self.yanking {
            self.index = self
                .index
                .checked_sub(1)
                .unwrap_or(self.entries.len() - 1);
        }
        self.yanking = true;
        &self.entries[self.index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_kills_accumulate_in_direction() {
        let mut ring = KillRing::new(3);
        ring.kill(KillAction::DeleteWordBackward, "world");
        ring.kill(KillAction::DeleteWordBackward, "hello ");
        assert_eq!(ring.yank(), "hello world");

        ring.kill(KillAction::DeleteToEndOfLine, "abc");
        ring.kill(KillAction::DeleteToEndOfLine, "\n");
        assert_eq!(ring.yank(), "abc\n");
    }

    #[test]
    fn delete_replaces_and_changes_reset_accumulation() {
        let mut ring = KillRing::new(2);
        ring.kill(KillAction::Delete, "a");
        ring.kill(KillAction::Delete, "b");
        assert_eq!(ring.yank(), "b");

        ring.kill(KillAction::DeleteWordForward, "one");
        ring.selection_changed();
        ring.kill(KillAction::DeleteWordForward, "two");
        assert_eq!(ring.yank(), "two");
        assert_eq!(ring.yank_and_select(), "one");
        assert_eq!(ring.yank_and_select(), "two");
    }

    #[test]
    fn zero_size_ring_holds_one_entry() {
        let mut ring = KillRing::new(0);
        assert_eq!(ring.capacity(), 1);
        ring.kill(KillAction::DeleteToEndOfParagraph, "x");
        ring.text_changed();
        ring.kill(KillAction::DeleteToEndOfParagraph, "y");
        assert_eq!(ring.yank(), "y");
        assert_eq!(ring.yank_and_select(), "y");
    }
}
