//! Selections, multi-caret sets, and navigation.

pub mod boundaries;
mod navigation;

pub use navigation::Navigator;

use crate::address::{Affinity, Location, TextRange};
use serde::{Deserialize, Serialize};

/// Unit used for expansion, movement, and deletion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Character,
    Word,
    Line,
    Paragraph,
    Sentence,
    Document,
}

/// Navigation direction.
///
/// `Left`/`Right` are visual and equal `Backward`/`Forward` for left-to-right text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Returns `true` when motion heads toward the document end.
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Forward | Direction::Right | Direction::Down)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

/// One or more disjoint ranges with caret metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Selection {
    ranges: Vec<TextRange>,
    pub affinity: Affinity,
    pub granularity: Granularity,
    /// The head (moving end) is at the start of the selection.
    pub reversed: bool,
    /// Caret x remembered across consecutive vertical moves.
    pub anchor_x: Option<f32>,
}

impl Selection {
    /// Insertion point at `location`.
    pub fn caret(location: Location) -> Self {
        Self::new(TextRange::empty(location))
    }

    pub fn new(range: TextRange) -> Self {
        Self {
            ranges: vec![range],
            affinity: Affinity::Downstream,
            granularity: Granularity::Character,
            reversed: false,
            anchor_x: None,
        }
    }

    /// Selection spanning `anchor` to `head` in either order.
    pub fn extending(anchor: Location, head: Location) -> Self {
        Self {
            reversed: head < anchor,
            ..Self::new(TextRange::new(anchor, head))
        }
    }

    /// Selection of several ranges; overlapping ranges are merged.
    ///
    /// Returns `None` for an empty list.
    pub fn with_ranges(ranges: impl IntoIterator<Item = TextRange>) -> Option<Self> {
        let ranges = normalize_ranges(ranges.into_iter().collect());
        let first = *ranges.first()?;
        let mut selection = Self::new(first);
        selection.ranges = ranges;
        Some(selection)
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_affinity(mut self, affinity: Affinity) -> Self {
        self.affinity = affinity;
        self
    }

    pub fn ranges(&self) -> &[TextRange] {
        &self.ranges
    }

    /// Smallest range covering every range of this selection.
    pub fn envelope(&self) -> TextRange {
        let first = self.ranges[0];
        let last = self.ranges[self.ranges.len() - 1];
        first.union(&last)
    }

    pub fn start(&self) -> Location {
        self.envelope().start()
    }

    pub fn end(&self) -> Location {
        self.envelope().end()
    }

    /// Moving end of the selection.
    pub fn head(&self) -> Location {
        if self.reversed {
            self.start()
        } else {
            self.end()
        }
    }

    /// Fixed end of the selection.
    pub fn anchor(&self) -> Location {
        if self.reversed {
            self.end()
        } else {
            self.start()
        }
    }

    /// Returns `true` when every range is empty.
    pub fn is_insertion_point(&self) -> bool {
        self.ranges.iter().all(TextRange::is_empty)
    }

    /// Returns `true` when any range of `self` conflicts with a range of `other`.
    ///
    /// Ranges conflict when they overlap or are identical; touching ranges
    /// stay separate.
    pub fn conflicts_with(&self, other: &Selection) -> bool {
        self.ranges
            .iter()
            .any(|a| other.ranges.iter().any(|b| a.intersects(b)))
    }

    fn absorb(&mut self, other: Selection) {
        let mut ranges = std::mem::take(&mut self.ranges);
        ranges.extend(other.ranges);
        self.ranges = merge_overlapping(ranges);
    }

    /// Clamp every range into a document of `len` chars.
    pub fn clamped(&self, len: usize) -> Selection {
        let mut clamped = self.clone();
        clamped.ranges = normalize_ranges(self.ranges.iter().map(|r| r.clamped(len)).collect());
        clamped
    }
}

/// Sort ranges and merge those that overlap, dropping duplicate carets.
fn normalize_ranges(ranges: Vec<TextRange>) -> Vec<TextRange> {
    merge_overlapping(ranges)
}

fn merge_overlapping(mut ranges: Vec<TextRange>) -> Vec<TextRange> {
    ranges.sort_by_key(|range| (range.start(), range.end()));
    let mut merged: Vec<TextRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if last.intersects(&range) || last.contains(range.start()) => {
                *last = last.union(&range);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Sorted set of selections that never overlap.
///
/// Inserting a selection that conflicts with existing ones merges them into a
/// single selection instead of keeping duplicates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectionSet {
    selections: Vec<Selection>,
}

impl Default for SelectionSet {
    fn default() -> Self {
        Self::new(Selection::caret(Location::ZERO))
    }
}

impl SelectionSet {
    pub fn new(selection: Selection) -> Self {
        Self {
            selections: vec![selection],
        }
    }

    /// Build a set from arbitrary selections, merging conflicts.
    ///
    /// Falls back to a caret at the document start when `selections` is empty.
    pub fn from_selections(selections: impl IntoIterator<Item = Selection>) -> Self {
        let mut set = Self {
            selections: Vec::new(),
        };
        for selection in selections {
            set.insert(selection);
        }
        if set.selections.is_empty() {
            set.selections.push(Selection::caret(Location::ZERO));
        }
        set
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Last selection in document order.
    pub fn primary(&self) -> &Selection {
        &self.selections[self.selections.len() - 1]
    }

    /// Every range of every selection in document order.
    pub fn ranges(&self) -> Vec<TextRange> {
        let mut ranges: Vec<TextRange> = self
            .selections
            .iter()
            .flat_map(|selection| selection.ranges.iter().copied())
            .collect();
        ranges.sort_by_key(|range| (range.start(), range.end()));
        ranges
    }

    /// Replace the whole set.
    pub fn set(&mut self, selections: impl IntoIterator<Item = Selection>) {
        *self = Self::from_selections(selections);
    }

    /// Insert `selection`, merging it with every selection it conflicts with.
    pub fn insert(&mut self, selection: Selection) {
        let mut merged = selection;
        let mut index = 0;
        while index < self.selections.len() {
            if self.selections[index].conflicts_with(&merged) {
                let existing = self.selections.remove(index);
                merged.absorb(existing);
                // The grown selection may now touch ones already skipped.
                index = 0;
            } else {
                index += 1;
            }
        }
        let position = self
            .selections
            .partition_point(|existing| existing.start() <= merged.start());
        self.selections.insert(position, merged);
    }

    /// Add a caret at `location`; a no-op when one is already there.
    pub fn add_insertion_point(&mut self, location: Location) {
        self.insert(Selection::caret(location));
    }

    /// Remove the caret at `location`.
    ///
    /// Returns `false` when there is no such caret or it is the only selection.
    pub fn remove_insertion_point(&mut self, location: Location) -> bool {
        if self.selections.len() <= 1 {
            return false;
        }
        let Some(index) = self.selections.iter().position(|selection| {
            selection.is_insertion_point() && selection.ranges.contains(&TextRange::empty(location))
        }) else {
            return false;
        };
        self.selections.remove(index);
        true
    }

    /// Rebuild the set by mapping every selection.
    pub fn map(&mut self, f: impl FnMut(&Selection) -> Selection) {
        let mapped: Vec<Selection> = self.selections.iter().map(f).collect();
        self.set(mapped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges_of(set: &SelectionSet) -> Vec<(usize, usize)> {
        set.ranges()
            .iter()
            .map(|range| (range.start().char_index(), range.end().char_index()))
            .collect()
    }

    #[test]
    fn insert_merges_overlapping_and_duplicate_selections() {
        let mut set = SelectionSet::new(Selection::new(TextRange::from_chars(0, 4)));
        set.insert(Selection::new(TextRange::from_chars(10, 12)));
        set.insert(Selection::new(TextRange::from_chars(3, 6)));
        assert_eq!(ranges_of(&set), vec![(0, 6), (10, 12)]);

        set.add_insertion_point(Location::new(20));
        set.add_insertion_point(Location::new(20));
        assert_eq!(set.len(), 3);

        set.insert(Selection::new(TextRange::from_chars(5, 11)));
        assert_eq!(ranges_of(&set), vec![(0, 12), (20, 20)]);
    }

    #[test]
    fn touching_selections_stay_separate_and_sorted() {
        let mut set = SelectionSet::new(Selection::new(TextRange::from_chars(5, 8)));
        set.insert(Selection::new(TextRange::from_chars(2, 5)));
        set.add_insertion_point(Location::new(8));
        assert_eq!(ranges_of(&set), vec![(2, 5), (5, 8), (8, 8)]);
        let starts: Vec<usize> = set
            .selections()
            .iter()
            .map(|selection| selection.start().char_index())
            .collect();
        assert_eq!(starts, vec![2, 5, 8]);
    }

    #[test]
    fn caret_inside_range_merges_into_it() {
        let mut set = SelectionSet::new(Selection::new(TextRange::from_chars(2, 6)));
        set.add_insertion_point(Location::new(4));
        assert_eq!(ranges_of(&set), vec![(2, 6)]);
    }

    #[test]
    fn last_insertion_point_cannot_be_removed() {
        let mut set = SelectionSet::new(Selection::caret(Location::new(3)));
        assert!(!set.remove_insertion_point(Location::new(3)));
        set.add_insertion_point(Location::new(7));
        assert!(set.remove_insertion_point(Location::new(3)));
        assert!(!set.remove_insertion_point(Location::new(99)));
        assert_eq!(ranges_of(&set), vec![(7, 7)]);
    }

    #[test]
    fn with_ranges_normalizes_input() {
        let selection = Selection::with_ranges([
            TextRange::from_chars(8, 9),
            TextRange::from_chars(1, 3),
            TextRange::from_chars(2, 4),
        ])
        .expect("selection");
        assert_eq!(
            selection.ranges(),
            &[TextRange::from_chars(1, 4), TextRange::from_chars(8, 9)]
        );
        assert!(Selection::with_ranges(Vec::new()).is_none());
    }

    #[test]
    fn head_and_anchor_follow_direction() {
        let selection = Selection::extending(Location::new(9), Location::new(5));
        assert!(selection.reversed);
        assert_eq!(selection.head(), Location::new(5));
        assert_eq!(selection.anchor(), Location::new(9));
    }
}
