//! Line annotations anchored to document locations.
//!
//! Annotations follow their anchor through edits and are placed next to the
//! visual line holding the anchor, but only while that line is materialized by
//! the last layout pass.

use crate::address::{Affinity, Location};
use crate::content::{ContentChange, ContentStore};
use crate::geometry::Rect;
use crate::layout::LayoutEngine;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ANNOTATION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct AnnotationId(u64);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineAnnotation {
    pub id: AnnotationId,
    pub location: Location,
    pub message: String,
}

/// Annotation positioned for the current viewport.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedAnnotation<'a> {
    pub id: AnnotationId,
    pub location: Location,
    pub message: &'a str,
    /// Frame of the visual line holding `location`.
    pub line_frame: Rect,
}

/// Annotations kept in document order.
#[derive(Clone, Debug, Default)]
pub struct AnnotationSet {
    annotations: Vec<LineAnnotation>,
}

impl AnnotationSet {
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineAnnotation> + '_ {
        self.annotations.iter()
    }

    /// Anchor `message` at `location`; later additions sort after earlier ones
    /// at the same location.
    pub fn add(&mut self, location: Location, message: impl Into<String>) -> AnnotationId {
        let id = AnnotationId(NEXT_ANNOTATION_ID.fetch_add(1, Ordering::Relaxed));
        let index = self
            .annotations
            .partition_point(|annotation| annotation.location <= location);
        self.annotations.insert(
            index,
            LineAnnotation {
                id,
                location,
                message: message.into(),
            },
        );
        id
    }

    pub fn remove(&mut self, id: AnnotationId) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|annotation| annotation.id != id);
        self.annotations.len() != before
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    /// Move anchors across a committed change.
    ///
    /// Anchors inside replaced text collapse to the end of the inserted text.
    pub fn translate(&mut self, change: &ContentChange) {
        for annotation in &mut self.annotations {
            annotation.location = annotation
                .location
                .translated(change.affected, change.inserted_len);
        }
    }

    /// Annotations whose line was materialized by the last layout pass.
    ///
    /// Empty when the layout is older than `content`.
    pub fn visible<'a>(
        &'a self,
        content: &ContentStore,
        layout: &LayoutEngine,
    ) -> Vec<PlacedAnnotation<'a>> {
        let (Some(first), Some(last)) = (
            layout.visible_fragments().next().map(|fragment| fragment.range.start()),
            layout.visible_fragments().last().map(|fragment| fragment.range.end()),
        ) else {
            return Vec::new();
        };
        let start = self
            .annotations
            .partition_point(|annotation| annotation.location < first);
        self.annotations[start..]
            .iter()
            .take_while(|annotation| annotation.location <= last)
            .filter_map(|annotation| {
                let fragment = layout.fragment_for(content, annotation.location).ok()?;
                if !layout
                    .visible_fragments()
                    .any(|visible| visible.paragraph_id == fragment.paragraph_id)
                {
                    return None;
                }
                let index = fragment.line_index_for(annotation.location, Affinity::Downstream);
                Some(PlacedAnnotation {
                    id: annotation.id,
                    location: annotation.location,
                    message: annotation.message.as_str(),
                    line_frame: fragment.line_frame(index)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::TextRange;
    use crate::config::EditorConfig;

    fn numbered_lines(count: usize) -> String {
        (0..count).map(|i| format!("line {i}\n")).collect()
    }

    #[test]
    fn anchors_follow_edits() {
        struct Case {
            anchor: usize,
            edit: (usize, usize, &'static str),
            expected: usize,
        }
        let cases = [
            Case { anchor: 2, edit: (5, 6, "xyz"), expected: 2 },
            Case { anchor: 8, edit: (0, 0, "ab"), expected: 10 },
            Case { anchor: 8, edit: (6, 9, ""), expected: 6 },
            Case { anchor: 4, edit: (4, 4, "new"), expected: 4 },
        ];
        for case in cases {
            let mut content = ContentStore::new("0123456789");
            let mut set = AnnotationSet::default();
            set.add(Location::new(case.anchor), "note");
            let events = content.subscribe();
            let (start, end, text) = case.edit;
            content
                .replace(TextRange::from_chars(start, end), text)
                .expect("replace");
            let change = events.try_recv().expect("change");
            set.translate(&change);
            let anchors: Vec<usize> = set.iter().map(|a| a.location.char_index()).collect();
            assert_eq!(anchors, vec![case.expected], "edit {:?}", case.edit);
        }
    }

    #[test]
    fn add_keeps_document_order_and_remove_by_id() {
        let mut set = AnnotationSet::default();
        let late = set.add(Location::new(9), "late");
        let early = set.add(Location::new(1), "early");
        let tie = set.add(Location::new(9), "tie");
        let order: Vec<AnnotationId> = set.iter().map(|a| a.id).collect();
        assert_eq!(order, vec![early, late, tie]);
        assert!(set.remove(late));
        assert!(!set.remove(late));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn only_materialized_lines_are_placed() {
        let content = ContentStore::new(&numbered_lines(100));
        let config = EditorConfig {
            default_line_height: 10.0,
            char_width: 5.0,
            overscan: 0.0,
            ..EditorConfig::default()
        };
        let mut layout = LayoutEngine::new(&content, &config);
        let mut set = AnnotationSet::default();
        set.add(content.line_range(1).start(), "above");
        let shown = set.add(
            Location::new(content.line_range(12).start().char_index() + 3),
            "shown",
        );
        set.add(content.line_range(40).start(), "below");

        layout.layout_viewport(&content, Rect::new(0.0, 120.0, 300.0, 25.0), &mut ());
        let placed = set.visible(&content, &layout);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].id, shown);
        assert_eq!(placed[0].message, "shown");
        assert_eq!(placed[0].line_frame.min_y(), 120.0);
    }

    #[test]
    fn placement_follows_anchor_after_relayout() {
        let mut content = ContentStore::new(&numbered_lines(100));
        let config = EditorConfig {
            default_line_height: 10.0,
            char_width: 5.0,
            overscan: 0.0,
            ..EditorConfig::default()
        };
        let mut layout = LayoutEngine::new(&content, &config);
        let mut set = AnnotationSet::default();
        set.add(content.line_range(12).start(), "shown");
        let events = content.subscribe();
        content
            .replace(TextRange::empty(Location::ZERO), "head\n")
            .expect("replace");
        let change = events.try_recv().expect("change");
        set.translate(&change);
        layout.invalidate(&content, &change);

        layout.layout_viewport(&content, Rect::new(0.0, 130.0, 300.0, 5.0), &mut ());
        let placed = set.visible(&content, &layout);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].message, "shown");
        assert_eq!(placed[0].line_frame.min_y(), 130.0);
    }
}
