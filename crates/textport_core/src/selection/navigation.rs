//! Granularity-based movement and deletion against content and layout.

use super::boundaries::{
    next_grapheme, next_sentence_boundary, prev_grapheme, prev_sentence_boundary,
    sentence_range_at, word_left, word_range_at, word_right,
};
use super::{Direction, Granularity, Selection};
use crate::address::{Affinity, Location, TextRange};
use crate::content::ContentStore;
use crate::layout::LayoutEngine;

/// Resolves navigation and deletion queries.
///
/// Borrows the layout engine mutably because line-based motion may lay out
/// paragraphs that are not materialized yet.
pub struct Navigator<'a> {
    content: &'a ContentStore,
    layout: &'a mut LayoutEngine,
}

/// Result of moving a caret: the new location plus caret metadata.
struct Motion {
    location: Location,
    affinity: Affinity,
    anchor_x: Option<f32>,
}

impl Motion {
    fn to(location: Location) -> Self {
        Self {
            location,
            affinity: Affinity::Downstream,
            anchor_x: None,
        }
    }
}

impl<'a> Navigator<'a> {
    pub fn new(content: &'a ContentStore, layout: &'a mut LayoutEngine) -> Self {
        Self { content, layout }
    }

    fn clamp(&self, location: Location) -> Location {
        location.min(self.content.end_location())
    }

    /// Expand `location` to the enclosing unit of `granularity`.
    ///
    /// Locations outside the document are clamped to its bounds.
    pub fn selection_enclosing(&mut self, location: Location, granularity: Granularity) -> Selection {
        let location = self.clamp(location);
        let range = match granularity {
            Granularity::Character => {
                let end = next_grapheme(self.content, location);
                if end == location {
                    TextRange::new(prev_grapheme(self.content, location), location)
                } else {
                    TextRange::new(location, end)
                }
            }
            Granularity::Word => word_range_at(self.content, location),
            Granularity::Line => self.visual_line_range(location, Affinity::Downstream),
            Granularity::Paragraph => {
                let line = self.content.line_index_at(location);
                self.content.line_range(line)
            }
            Granularity::Sentence => sentence_range_at(self.content, location),
            Granularity::Document => self.content.document_range(),
        };
        Selection::new(range).with_granularity(granularity)
    }

    /// New selection after moving `selection` in `direction` by `granularity`.
    ///
    /// With `extending` the anchor stays fixed and only the head moves.
    /// `confined` keeps the head inside its current paragraph. Returns `None`
    /// when nothing would change.
    pub fn destination(
        &mut self,
        selection: &Selection,
        direction: Direction,
        granularity: Granularity,
        extending: bool,
        confined: bool,
    ) -> Option<Selection> {
        let selection = selection.clamped(self.content.len());
        let forward = direction.is_forward();

        if !extending && !selection.is_insertion_point() && !direction.is_vertical() {
            if granularity == Granularity::Character {
                let edge = if forward {
                    selection.end()
                } else {
                    selection.start()
                };
                return Some(Selection::caret(edge).with_granularity(granularity));
            }
        }

        let head = if extending {
            selection.head()
        } else if selection.is_insertion_point() {
            selection.head()
        } else if forward {
            selection.end()
        } else {
            selection.start()
        };

        let mut motion = self.motion(&selection, head, direction, granularity)?;
        if confined {
            let line = self.content.line_index_at(head);
            let bounds = match self.content.paragraph(line) {
                Some(paragraph) => paragraph.content_range(),
                None => TextRange::empty(head),
            };
            motion.location = motion.location.clamp(bounds.start(), bounds.end());
        }

        let mut next = if extending {
            Selection::extending(selection.anchor(), motion.location)
        } else {
            Selection::caret(motion.location)
        };
        next.granularity = granularity;
        next.affinity = motion.affinity;
        next.anchor_x = motion.anchor_x;

        if next.ranges() == selection.ranges() && next.reversed == selection.reversed {
            return None;
        }
        Some(next)
    }

    fn motion(
        &mut self,
        selection: &Selection,
        head: Location,
        direction: Direction,
        granularity: Granularity,
    ) -> Option<Motion> {
        let forward = direction.is_forward();
        if direction.is_vertical() {
            return match granularity {
                Granularity::Paragraph | Granularity::Document => {
                    let horizontal = if forward {
                        Direction::Forward
                    } else {
                        Direction::Backward
                    };
                    self.motion(selection, head, horizontal, granularity)
                }
                _ => self.vertical_motion(selection, head, forward),
            };
        }

        let motion = match granularity {
            Granularity::Character => Motion::to(if forward {
                next_grapheme(self.content, head)
            } else {
                prev_grapheme(self.content, head)
            }),
            Granularity::Word => Motion::to(if forward {
                word_right(self.content, head)
            } else {
                word_left(self.content, head)
            }),
            Granularity::Line => {
                let affinity = selection.affinity;
                let line = self.visual_line_range(head, affinity);
                if forward {
                    let end = self.visual_line_content_end(head, affinity);
                    let wraps = end == line.end() && end < self.content.end_location();
                    Motion {
                        location: end,
                        affinity: if wraps {
                            Affinity::Upstream
                        } else {
                            Affinity::Downstream
                        },
                        anchor_x: None,
                    }
                } else {
                    Motion::to(line.start())
                }
            }
            Granularity::Paragraph => {
                let line = self.content.line_index_at(head);
                let range = match self.content.paragraph(line) {
                    Some(paragraph) => paragraph.content_range(),
                    None => TextRange::empty(head),
                };
                Motion::to(if forward { range.end() } else { range.start() })
            }
            Granularity::Sentence => Motion::to(if forward {
                next_sentence_boundary(self.content, head)
            } else {
                prev_sentence_boundary(self.content, head)
            }),
            Granularity::Document => Motion::to(if forward {
                self.content.end_location()
            } else {
                Location::ZERO
            }),
        };
        Some(motion)
    }

    /// Move to the visual line above or below, keeping the caret x.
    ///
    /// From the first line moving up lands at the document start; from the
    /// last line moving down lands at the document end.
    fn vertical_motion(&mut self, selection: &Selection, head: Location, down: bool) -> Option<Motion> {
        let affinity = selection.affinity;
        let line = self.content.line_index_at(head);
        let (x, visual_index, visual_count) = {
            let fragment = self.layout.ensure_line(self.content, line)?;
            let index = fragment.line_index_for(head, affinity);
            let x = selection
                .anchor_x
                .unwrap_or_else(|| fragment.x_for_location(head, affinity));
            (x, index, fragment.line_fragments().len())
        };

        let target = if down {
            if visual_index + 1 < visual_count {
                Some((line, visual_index + 1))
            } else if line + 1 < self.content.line_count() {
                Some((line + 1, 0))
            } else {
                None
            }
        } else if visual_index > 0 {
            Some((line, visual_index - 1))
        } else if line > 0 {
            let previous = self.layout.ensure_line(self.content, line - 1)?;
            Some((line - 1, previous.line_fragments().len().saturating_sub(1)))
        } else {
            None
        };

        let Some((target_line, target_visual)) = target else {
            let edge = if down {
                self.content.end_location()
            } else {
                Location::ZERO
            };
            return Some(Motion {
                location: edge,
                affinity: Affinity::Downstream,
                anchor_x: Some(x),
            });
        };

        let fragment = self.layout.ensure_line(self.content, target_line)?;
        let location = fragment.location_for_x(target_visual, x);
        let at_wrap = fragment
            .line_range(target_visual)
            .is_some_and(|range| target_visual + 1 < fragment.line_fragments().len() && range.end() == location);
        Some(Motion {
            location,
            affinity: if at_wrap {
                Affinity::Upstream
            } else {
                Affinity::Downstream
            },
            anchor_x: Some(x),
        })
    }

    /// Range of the visual line holding `location`.
    fn visual_line_range(&mut self, location: Location, affinity: Affinity) -> TextRange {
        let line = self.content.line_index_at(location);
        let fallback = self.content.line_range(line);
        let Some(fragment) = self.layout.ensure_line(self.content, line) else {
            return fallback;
        };
        let index = fragment.line_index_for(location, affinity);
        fragment.line_range(index).unwrap_or(fallback)
    }

    /// End of the visual line's content: before the line break on the last
    /// line of a paragraph, at the wrap point otherwise.
    fn visual_line_content_end(&mut self, location: Location, affinity: Affinity) -> Location {
        let line = self.content.line_index_at(location);
        let Some(fragment) = self.layout.ensure_line(self.content, line) else {
            return location;
        };
        let index = fragment.line_index_for(location, affinity);
        let Some(range) = fragment.line_range(index) else {
            return location;
        };
        if index + 1 == fragment.line_fragments().len() {
            range.end().min(fragment.content_end())
        } else {
            range.end()
        }
    }

    /// Ranges a delete command removes for `selection`.
    ///
    /// Non-empty ranges are deleted as they are. For carets, word, sentence,
    /// and document deletion span from the caret to the extended destination;
    /// line and paragraph deletion at a boundary removes the adjacent
    /// character instead of nothing. With `allows_decomposition`, a backward
    /// character delete removes only the last scalar of a composed cluster.
    pub fn deletion_ranges(
        &mut self,
        selection: &Selection,
        direction: Direction,
        granularity: Granularity,
        allows_decomposition: bool,
    ) -> Vec<TextRange> {
        let selection = selection.clamped(self.content.len());
        let forward = direction.is_forward();
        let mut ranges = Vec::new();
        for range in selection.ranges().iter().copied() {
            if !range.is_empty() {
                ranges.push(range);
                continue;
            }
            let caret = range.start();
            let resolved = match granularity {
                Granularity::Character => {
                    if forward {
                        TextRange::new(caret, next_grapheme(self.content, caret))
                    } else {
                        let start = prev_grapheme(self.content, caret);
                        if allows_decomposition && caret.char_index() - start.char_index() > 1 {
                            TextRange::from_chars(caret.char_index() - 1, caret.char_index())
                        } else {
                            TextRange::new(start, caret)
                        }
                    }
                }
                Granularity::Line | Granularity::Paragraph => {
                    let moved = self
                        .motion(&Selection::caret(caret), caret, direction, granularity)
                        .map(|motion| motion.location)
                        .unwrap_or(caret);
                    if moved == caret {
                        let edge = if forward {
                            next_grapheme(self.content, caret)
                        } else {
                            prev_grapheme(self.content, caret)
                        };
                        TextRange::new(caret, edge)
                    } else {
                        TextRange::new(caret, moved)
                    }
                }
                // Deletion resolves against the extended destination so a caret at
                // a word's trailing edge still removes that word.
                _ => self
                    .destination(&Selection::caret(caret), direction, granularity, true, false)
                    .map(|destination| destination.envelope())
                    .unwrap_or_else(|| TextRange::empty(caret)),
            };
            if !resolved.is_empty() {
                ranges.push(resolved);
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
        merged
    }
}
