//! Text unit boundaries: graphemes, words, and sentences.

use crate::address::{Location, TextRange};
use crate::content::ContentStore;
use unicode_segmentation::{GraphemeCursor, UnicodeSegmentation};

/// Returns whether `ch` belongs to a word run.
pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn char_to_byte(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

fn byte_to_char(text: &str, byte: usize) -> usize {
    text[..byte.min(text.len())].chars().count()
}

/// Line text and the location's char offset within it.
fn line_context(content: &ContentStore, location: Location) -> (usize, String, usize) {
    let line = content.line_index_at(location);
    let range = content.line_range(line);
    let text = content.rope().line(line).to_string();
    let offset = location.char_index() - range.start().char_index();
    (range.start().char_index(), text, offset)
}

/// Next grapheme cluster boundary after `location`, or the document end.
pub fn next_grapheme(content: &ContentStore, location: Location) -> Location {
    let len = content.len();
    if location.char_index() >= len {
        return Location::new(len);
    }
    let (line_start, text, offset) = line_context(content, location);
    let byte = char_to_byte(&text, offset);
    let mut cursor = GraphemeCursor::new(byte, text.len(), true);
    match cursor.next_boundary(&text, 0) {
        Ok(Some(next)) => Location::new(line_start + byte_to_char(&text, next)),
        _ => Location::new((location.char_index() + 1).min(len)),
    }
}

/// Previous grapheme cluster boundary before `location`, or the document start.
pub fn prev_grapheme(content: &ContentStore, location: Location) -> Location {
    let index = location.char_index().min(content.len());
    if index == 0 {
        return Location::ZERO;
    }
    // Look at the line holding the char before the location so the break of
    // the previous line is treated as one cluster.
    let (line_start, text, offset) = line_context(content, Location::new(index - 1));
    let byte = char_to_byte(&text, offset + 1);
    let mut cursor = GraphemeCursor::new(byte, text.len(), true);
    match cursor.prev_boundary(&text, 0) {
        Ok(Some(prev)) => Location::new(line_start + byte_to_char(&text, prev)),
        _ => Location::new(index - 1),
    }
}

/// End of the next word run at or after `location`, skipping whitespace first.
pub fn word_right(content: &ContentStore, location: Location) -> Location {
    let rope = content.rope();
    let len = rope.len_chars();
    let mut idx = location.char_index().min(len);
    while idx < len && rope.char(idx).is_whitespace() {
        idx += 1;
    }
    if idx >= len {
        return Location::new(len);
    }
    let kind = is_word_char(rope.char(idx));
    while idx < len && !rope.char(idx).is_whitespace() && is_word_char(rope.char(idx)) == kind {
        idx += 1;
    }
    Location::new(idx)
}

/// Start of the previous word run before `location`, skipping whitespace first.
pub fn word_left(content: &ContentStore, location: Location) -> Location {
    let rope = content.rope();
    let mut idx = location.char_index().min(rope.len_chars());
    while idx > 0 && rope.char(idx - 1).is_whitespace() {
        idx -= 1;
    }
    if idx == 0 {
        return Location::ZERO;
    }
    let kind = is_word_char(rope.char(idx - 1));
    while idx > 0
        && !rope.char(idx - 1).is_whitespace()
        && is_word_char(rope.char(idx - 1)) == kind
    {
        idx -= 1;
    }
    Location::new(idx)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Space,
    Word,
    Other,
}

fn classify(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Space
    } else if is_word_char(ch) {
        CharClass::Word
    } else {
        CharClass::Other
    }
}

/// Run of same-class chars around `location`.
///
/// The char at `location` decides the class; at the end of the document the
/// char before it is used. Line breaks never join a run.
pub fn word_range_at(content: &ContentStore, location: Location) -> TextRange {
    let rope = content.rope();
    let len = rope.len_chars();
    if len == 0 {
        return TextRange::empty(Location::ZERO);
    }
    let target = location.char_index().min(len - 1);
    let current = rope.char(target);
    if current == '\n' || current == '\r' {
        return TextRange::empty(Location::new(target));
    }
    let class = classify(current);
    let joins = |ch: char| ch != '\n' && ch != '\r' && classify(ch) == class;
    let mut start = target;
    while start > 0 && joins(rope.char(start - 1)) {
        start -= 1;
    }
    let mut end = target + 1;
    while end < len && joins(rope.char(end)) {
        end += 1;
    }
    TextRange::from_chars(start, end)
}

/// Sentence boundaries of the paragraph holding `location`, as document offsets.
fn sentence_bounds(content: &ContentStore, location: Location) -> Vec<usize> {
    let line = content.line_index_at(location);
    let Some(paragraph) = content.paragraph(line) else {
        return vec![location.char_index()];
    };
    let content_range = paragraph.content_range();
    let base = content_range.start().char_index();
    let text: String = paragraph.text().chars().take(content_range.len()).collect();
    let mut bounds: Vec<usize> = text
        .split_sentence_bound_indices()
        .map(|(byte, _)| base + byte_to_char(&text, byte))
        .collect();
    bounds.push(content_range.end().char_index());
    bounds.dedup();
    bounds
}

/// Sentence holding `location`, clamped to its paragraph's content.
pub fn sentence_range_at(content: &ContentStore, location: Location) -> TextRange {
    let bounds = sentence_bounds(content, location);
    let index = location.char_index();
    let start = bounds
        .iter()
        .rev()
        .find(|bound| **bound <= index)
        .copied()
        .unwrap_or(index);
    let end = bounds
        .iter()
        .find(|bound| **bound > index)
        .copied()
        .unwrap_or_else(|| bounds.last().copied().unwrap_or(index));
    TextRange::from_chars(start, end.max(start))
}

/// First sentence boundary after `location`, crossing into later paragraphs.
pub fn next_sentence_boundary(content: &ContentStore, location: Location) -> Location {
    let mut current = location;
    loop {
        let index = current.char_index();
        if let Some(bound) = sentence_bounds(content, current)
            .into_iter()
            .find(|bound| *bound > index)
        {
            return Location::new(bound);
        }
        let line = content.line_index_at(current);
        if line + 1 >= content.line_count() {
            return content.end_location();
        }
        let next = content.line_range(line + 1).start();
        if next <= current {
            return content.end_location();
        }
        current = next;
    }
}

/// Last sentence boundary before `location`, crossing into earlier paragraphs.
pub fn prev_sentence_boundary(content: &ContentStore, location: Location) -> Location {
    let mut current = location;
    loop {
        let index = current.char_index();
        if let Some(bound) = sentence_bounds(content, current)
            .into_iter()
            .rev()
            .find(|bound| *bound < index)
        {
            return Location::new(bound);
        }
        let line = content.line_index_at(current);
        if line == 0 {
            return Location::ZERO;
        }
        let previous = content.line_range(line - 1);
        // End of the previous paragraph's content.
        let end = previous.end().char_index()
            - content
                .paragraph(line - 1)
                .map(|paragraph| paragraph.line_break_len())
                .unwrap_or(0);
        if end < index {
            return Location::new(end);
        }
        current = Location::new(end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_motion_skips_whitespace_then_one_run() {
        let content = ContentStore::new("Hello world\nSecond Line");
        let mut location = Location::ZERO;
        let mut stops = Vec::new();
        for _ in 0..3 {
            location = word_right(&content, location);
            stops.push(location.char_index());
        }
        assert_eq!(stops, vec![5, 11, 18]);
        assert_eq!(word_left(&content, Location::new(18)), Location::new(12));
        assert_eq!(word_left(&content, Location::new(12)), Location::new(6));
        assert_eq!(word_left(&content, Location::ZERO), Location::ZERO);
        assert_eq!(word_left(&content, Location::new(3)), Location::ZERO);
    }

    #[test]
    fn word_range_at_groups_same_class() {
        struct Case {
            text: &'static str,
            location: usize,
            expected: (usize, usize),
        }
        let cases = [
            Case {
                text: "hello world",
                location: 2,
                expected: (0, 5),
            },
            Case {
                text: "hello   world",
                location: 6,
                expected: (5, 8),
            },
            Case {
                text: "foo::bar",
                location: 3,
                expected: (3, 5),
            },
            Case {
                text: "end",
                location: 3,
                expected: (0, 3),
            },
        ];
        for case in cases {
            let content = ContentStore::new(case.text);
            assert_eq!(
                word_range_at(&content, Location::new(case.location)),
                TextRange::from_chars(case.expected.0, case.expected.1),
                "{:?} at {}",
                case.text,
                case.location
            );
        }
    }

    #[test]
    fn grapheme_boundaries_keep_clusters_and_crlf_together() {
        let content = ContentStore::new("e\u{301}x\r\ny");
        assert_eq!(next_grapheme(&content, Location::ZERO), Location::new(2));
        assert_eq!(prev_grapheme(&content, Location::new(2)), Location::ZERO);
        assert_eq!(next_grapheme(&content, Location::new(3)), Location::new(5));
        assert_eq!(prev_grapheme(&content, Location::new(5)), Location::new(3));
        assert_eq!(next_grapheme(&content, Location::new(6)), Location::new(6));
    }

    #[test]
    fn sentences_split_within_paragraphs() {
        let content = ContentStore::new("One two. Three four.\nNext one.");
        assert_eq!(
            sentence_range_at(&content, Location::new(2)),
            TextRange::from_chars(0, 9)
        );
        assert_eq!(
            sentence_range_at(&content, Location::new(12)),
            TextRange::from_chars(9, 20)
        );
        assert_eq!(
            next_sentence_boundary(&content, Location::new(9)),
            Location::new(20)
        );
        assert_eq!(
            next_sentence_boundary(&content, Location::new(20)),
            Location::new(30)
        );
        assert_eq!(
            prev_sentence_boundary(&content, Location::new(21)),
            Location::new(20)
        );
    }
}
