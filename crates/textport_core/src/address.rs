//! Locations and ranges addressing the document's current character sequence.
//!
//! A [`Location`] is a char index into the rope held by the content store. It
//! is only meaningful for the revision it was derived from: after an edit,
//! callers either re-derive locations or translate them with
//! [`Location::translated`] using the edit's affected range and inserted length.
//! Distances reported by [`offset`] are measured in UTF-16 code units.

use ropey::Rope;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

/// Opaque, totally ordered address into the document.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Location(usize);

impl Location {
    /// Start of every document.
    pub const ZERO: Location = Location(0);

    pub const fn new(char_index: usize) -> Self {
        Self(char_index)
    }

    /// Char index backing this location.
    pub const fn char_index(self) -> usize {
        self.0
    }

    /// Translate a location captured before an edit into the post-edit document.
    ///
    /// Locations before the edit are unchanged, locations after it shift by the
    /// length delta, and locations strictly inside the replaced span collapse
    /// to the end of the inserted text.
    pub fn translated(self, affected: TextRange, inserted_len: usize) -> Location {
        if self.0 <= affected.start.0 {
            return self;
        }
        if self.0 >= affected.end.0 {
            return Location(self.0 - affected.len() + inserted_len);
        }
        Location(affected.start.0 + inserted_len)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compare two locations in document order.
pub fn compare(a: Location, b: Location) -> Ordering {
    a.cmp(&b)
}

/// Signed distance from `from` to `to` in UTF-16 code units.
///
/// Both locations are clamped to the document bounds.
pub fn offset(rope: &Rope, from: Location, to: Location) -> isize {
    let len = rope.len_chars();
    let from_cu = rope.char_to_utf16_cu(from.0.min(len)) as isize;
    let to_cu = rope.char_to_utf16_cu(to.0.min(len)) as isize;
    to_cu - from_cu
}

/// Move `from` by `offset_by` UTF-16 code units.
///
/// Returns `None` when the result would fall before the start or past the end
/// of the document, or when `from` itself is out of bounds. An offset landing
/// inside a surrogate pair snaps to the character boundary in the direction of
/// travel.
pub fn location_offset_by(rope: &Rope, from: Location, offset_by: isize) -> Option<Location> {
    let len = rope.len_chars();
    if from.0 > len {
        return None;
    }
    let start_cu = rope.char_to_utf16_cu(from.0) as isize;
    let target_cu = start_cu.checked_add(offset_by)?;
    let total_cu = rope.len_utf16_cu() as isize;
    if target_cu < 0 || target_cu > total_cu {
        return None;
    }
    let target_cu = target_cu as usize;
    let mut char_index = rope.utf16_cu_to_char(target_cu);
    if offset_by > 0 && rope.char_to_utf16_cu(char_index) < target_cu {
        char_index = (char_index + 1).min(len);
    }
    Some(Location(char_index))
}

/// Which side of a boundary the caret belongs to at a wrap point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Affinity {
    /// Caret sticks to the end of the preceding visual line.
    Upstream,
    /// Caret sticks to the start of the following visual line.
    #[default]
    Downstream,
}

/// Half-open `[start, end)` span of locations with `start <= end`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TextRange {
    start: Location,
    end: Location,
}

impl TextRange {
    /// Build a range from two locations in either order.
    pub fn new(a: Location, b: Location) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Convenience constructor from char indexes.
    pub fn from_chars(start: usize, end: usize) -> Self {
        Self::new(Location(start), Location(end))
    }

    /// Insertion point at `location`.
    pub fn empty(location: Location) -> Self {
        Self {
            start: location,
            end: location,
        }
    }

    pub fn start(&self) -> Location {
        self.start
    }

    pub fn end(&self) -> Location {
        self.end
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.end.0 - self.start.0
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn chars(&self) -> Range<usize> {
        self.start.0..self.end.0
    }

    /// Half-open containment; an empty range contains nothing.
    pub fn contains(&self, location: Location) -> bool {
        self.start <= location && location < self.end
    }

    /// Returns `true` when the ranges share at least one location, or when an
    /// empty range sits strictly inside the other.
    pub fn intersects(&self, other: &TextRange) -> bool {
        if self == other {
            return true;
        }
        self.start < other.end && other.start < self.end
    }

    /// Returns `true` when `other` begins exactly where `self` ends.
    pub fn abuts(&self, other: &TextRange) -> bool {
        self.end == other.start
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &TextRange) -> TextRange {
        TextRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Overlapping portion, if any.
    pub fn intersection(&self, other: &TextRange) -> Option<TextRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(TextRange { start, end })
    }

    /// Clamp both ends into `[0, len]`.
    pub fn clamped(&self, len: usize) -> TextRange {
        TextRange {
            start: Location(self.start.0.min(len)),
            end: Location(self.end.0.min(len)),
        }
    }

    /// Translate both ends across an edit; see [`Location::translated`].
    pub fn translated(&self, affected: TextRange, inserted_len: usize) -> TextRange {
        TextRange::new(
            self.start.translated(affected, inserted_len),
            self.end.translated(affected, inserted_len),
        )
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_counts_utf16_code_units() {
        let rope = Rope::from_str("a😀b");
        assert_eq!(offset(&rope, Location::new(0), Location::new(3)), 4);
        assert_eq!(offset(&rope, Location::new(3), Location::new(1)), -3);
        assert_eq!(offset(&rope, Location::new(2), Location::new(2)), 0);
    }

    #[test]
    fn location_offset_by_rejects_out_of_bounds() {
        let rope = Rope::from_str("abc");
        assert_eq!(
            location_offset_by(&rope, Location::new(1), 2),
            Some(Location::new(3))
        );
        assert_eq!(location_offset_by(&rope, Location::new(1), 3), None);
        assert_eq!(location_offset_by(&rope, Location::new(1), -2), None);
        assert_eq!(location_offset_by(&rope, Location::new(4), 0), None);
    }

    #[test]
    fn location_offset_by_snaps_inside_surrogate_pairs() {
        let rope = Rope::from_str("a😀b");
        assert_eq!(
            location_offset_by(&rope, Location::new(1), 1),
            Some(Location::new(2))
        );
        assert_eq!(
            location_offset_by(&rope, Location::new(2), -1),
            Some(Location::new(1))
        );
    }

    #[test]
    fn translated_follows_edit_delta() {
        struct Case {
            location: usize,
            expected: usize,
        }
        // "0123456789" with 3..5 replaced by "abcd".
        let affected = TextRange::from_chars(3, 5);
        let cases = [
            Case {
                location: 2,
                expected: 2,
            },
            Case {
                location: 3,
                expected: 3,
            },
            Case {
                location: 4,
                expected: 7,
            },
            Case {
                location: 5,
                expected: 7,
            },
            Case {
                location: 9,
                expected: 11,
            },
        ];
        for case in cases {
            assert_eq!(
                Location::new(case.location).translated(affected, 4),
                Location::new(case.expected),
                "location {}",
                case.location
            );
        }
    }

    #[test]
    fn touching_ranges_do_not_intersect() {
        let a = TextRange::from_chars(0, 3);
        let b = TextRange::from_chars(3, 5);
        assert!(!a.intersects(&b));
        assert!(a.abuts(&b));
        assert!(a.intersects(&TextRange::from_chars(2, 4)));
        assert!(TextRange::from_chars(2, 2).intersects(&TextRange::from_chars(2, 2)));
        assert_eq!(a.union(&b), TextRange::from_chars(0, 5));
        assert_eq!(TextRange::new(Location::new(5), Location::new(1)).len(), 4);
    }
}
