//! Estimated vertical positions for every line of the document.
//!
//! Lines that were never laid out carry a provisional height; measuring a
//! line replaces its estimate with a point update so prefix sums stay
//! logarithmic while scrolling through large documents.

use crate::content::ParagraphId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct HeightEntry {
    pub(crate) id: ParagraphId,
    pub(crate) height: f32,
    pub(crate) measured: bool,
}

impl HeightEntry {
    pub(crate) fn estimated(id: ParagraphId, height: f32) -> Self {
        Self {
            id,
            height,
            measured: false,
        }
    }
}

/// Fenwick tree of line heights keyed by line index.
#[derive(Clone, Debug, Default)]
pub struct HeightIndex {
    entries: Vec<HeightEntry>,
    tree: Vec<f32>,
}

impl HeightIndex {
    pub(crate) fn from_entries(entries: Vec<HeightEntry>) -> Self {
        let mut index = Self {
            entries,
            tree: Vec::new(),
        };
        index.rebuild_tree();
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Height of `line`, measured or estimated.
    pub fn height(&self, line: usize) -> f32 {
        self.entries.get(line).map(|entry| entry.height).unwrap_or(0.0)
    }

    pub fn is_measured(&self, line: usize) -> bool {
        self.entries.get(line).is_some_and(|entry| entry.measured)
    }

    /// Sum of heights of lines `0..line`, i.e. the top of `line`.
    pub fn prefix(&self, line: usize) -> f32 {
        let mut i = line.min(self.entries.len());
        let mut sum = 0.0;
        while i > 0 {
            sum += self.tree[i - 1];
            i &= i - 1;
        }
        sum
    }

    pub fn total_height(&self) -> f32 {
        self.prefix(self.entries.len())
    }

    /// Line whose vertical span contains `y`, clamped to the last line.
    pub fn index_at(&self, y: f32) -> usize {
        let len = self.entries.len();
        if len == 0 {
            return 0;
        }
        let mut pos = 0usize;
        let mut remaining = y.max(0.0);
        let mut step = len.next_power_of_two();
        while step > 0 {
            let next = pos + step;
            if next <= len && self.tree[next - 1] <= remaining {
                pos = next;
                remaining -= self.tree[next - 1];
            }
            step >>= 1;
        }
        pos.min(len - 1)
    }

    /// Record a measured height for `line`.
    pub(crate) fn set_measured(&mut self, line: usize, height: f32) {
        let Some(entry) = self.entries.get_mut(line) else {
            return;
        };
        let delta = height - entry.height;
        entry.height = height;
        entry.measured = true;
        self.add(line, delta);
    }

    fn add(&mut self, line: usize, delta: f32) {
        if delta == 0.0 {
            return;
        }
        let mut i = line + 1;
        while i <= self.entries.len() {
            self.tree[i - 1] += delta;
            i += i & i.wrapping_neg();
        }
    }

    /// Replace `old` lines with `new` entries.
    ///
    /// Same-length replacements update the tree in place; anything that
    /// shifts later lines rebuilds it. Returns the entries that were removed.
    pub(crate) fn splice(
        &mut self,
        old: std::ops::Range<usize>,
        new: impl IntoIterator<Item = HeightEntry>,
    ) -> Vec<HeightEntry> {
        let new: Vec<HeightEntry> = new.into_iter().collect();
        if new.len() == old.len() {
            let mut removed = Vec::with_capacity(new.len());
            for (line, entry) in old.zip(new) {
                let delta = entry.height - self.entries[line].height;
                removed.push(std::mem::replace(&mut self.entries[line], entry));
                self.add(line, delta);
            }
            return removed;
        }
        let removed = self.entries.splice(old, new).collect();
        self.rebuild_tree();
        removed
    }

    fn rebuild_tree(&mut self) {
        let len = self.entries.len();
        self.tree = self.entries.iter().map(|entry| entry.height).collect();
        for i in 1..=len {
            let parent = i + (i & i.wrapping_neg());
            if parent <= len {
                let value = self.tree[i - 1];
                self.tree[parent - 1] += value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(heights: &[f32]) -> HeightIndex {
        HeightIndex::from_entries(
            heights
                .iter()
                .map(|height| HeightEntry::estimated(ParagraphId::next(), *height))
                .collect(),
        )
    }

    #[test]
    fn prefix_and_index_at_track_heights() {
        let index = index(&[20.0, 10.0, 10.0, 30.0]);
        assert_eq!(index.prefix(0), 0.0);
        assert_eq!(index.prefix(2), 30.0);
        assert_eq!(index.total_height(), 70.0);

        struct Case {
            y: f32,
            line: usize,
        }
        let cases = [
            Case { y: 0.0, line: 0 },
            Case { y: 19.9, line: 0 },
            Case { y: 20.0, line: 1 },
            Case { y: 35.0, line: 2 },
            Case { y: 69.0, line: 3 },
            Case { y: 500.0, line: 3 },
            Case { y: -4.0, line: 0 },
        ];
        for case in cases {
            assert_eq!(index.index_at(case.y), case.line, "y = {}", case.y);
        }
    }

    #[test]
    fn set_measured_updates_following_prefixes() {
        let mut index = index(&[16.0; 5]);
        index.set_measured(1, 48.0);
        assert!(index.is_measured(1));
        assert!(!index.is_measured(2));
        assert_eq!(index.prefix(2), 64.0);
        assert_eq!(index.prefix(5), 112.0);
        assert_eq!(index.index_at(63.0), 1);
        assert_eq!(index.index_at(64.0), 2);
    }

    #[test]
    fn same_length_splice_updates_in_place() {
        let mut index = index(&[10.0, 10.0, 10.0, 10.0]);
        index.set_measured(3, 30.0);
        let replacement = HeightEntry::estimated(ParagraphId::next(), 16.0);
        let removed = index.splice(1..2, [replacement]);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].height, 10.0);
        assert_eq!(index.len(), 4);
        assert!(!index.is_measured(1));
        assert!(index.is_measured(3));
        assert_eq!(index.prefix(2), 26.0);
        assert_eq!(index.total_height(), 66.0);
        assert_eq!(index.index_at(26.0), 2);
    }

    #[test]
    fn splice_rebuilds_tree() {
        let mut index = index(&[10.0, 10.0, 10.0]);
        let removed = index.splice(
            1..2,
            [
                HeightEntry::estimated(ParagraphId::next(), 5.0),
                HeightEntry::estimated(ParagraphId::next(), 7.0),
            ],
        );
        assert_eq!(removed.len(), 1);
        assert_eq!(index.len(), 4);
        assert_eq!(index.total_height(), 32.0);
        assert_eq!(index.prefix(3), 22.0);
    }
}
