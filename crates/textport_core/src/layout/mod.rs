//! Viewport-driven incremental layout.
//!
//! The engine keeps a [`HeightIndex`] with one entry per document line and a
//! cache of [`LayoutFragment`]s for the lines near the viewport. A layout pass
//! walks from the first line intersecting the overscanned viewport, reusing
//! cached fragments and building missing ones, then evicts everything that fell
//! out of range. Content edits splice the height index and evict fragments of
//! touched paragraphs; rebuilding happens lazily on the next pass.

mod fragment;
mod height_index;
mod measure;

pub use fragment::{LayoutFragment, LineFragment};
pub use height_index::HeightIndex;
pub use measure::{MonospaceMeasurer, TextMeasurer};

use crate::address::{Location, TextRange};
use crate::config::EditorConfig;
use crate::content::{ContentChange, ContentStore, ParagraphId};
use crate::error::{EditorError, Result};
use crate::geometry::Rect;
use height_index::HeightEntry;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, trace};

/// Renderer hooks invoked by every layout pass.
///
/// Fragments are lent for the duration of the call only.
pub trait LayoutObserver {
    /// Drop visual surfaces for fragments that may no longer be in range.
    fn will_layout(&mut self) {}

    /// Attach or position a visual for `fragment`; called in document order.
    fn place_fragment(&mut self, _fragment: &LayoutFragment) {}

    fn did_layout(&mut self, _visible: TextRange) {}
}

impl LayoutObserver for () {}

/// Incremental layout engine over a [`ContentStore`].
pub struct LayoutEngine {
    measurer: Box<dyn TextMeasurer + Send>,
    wrap_width: Option<f32>,
    overscan: f32,
    heights: HeightIndex,
    cache: HashMap<ParagraphId, LayoutFragment>,
    visible: Vec<ParagraphId>,
    revision: u64,
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("wrap_width", &self.wrap_width)
            .field("overscan", &self.overscan)
            .field("lines", &self.heights.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl LayoutEngine {
    /// Engine measuring with a [`MonospaceMeasurer`] built from `config`.
    pub fn new(content: &ContentStore, config: &EditorConfig) -> Self {
        Self::with_measurer(
            content,
            config,
            Box::new(MonospaceMeasurer::from_config(config)),
        )
    }

    pub fn with_measurer(
        content: &ContentStore,
        config: &EditorConfig,
        measurer: Box<dyn TextMeasurer + Send>,
    ) -> Self {
        let mut engine = Self {
            measurer,
            wrap_width: config.wrap_width,
            overscan: config.overscan.max(0.0),
            heights: HeightIndex::default(),
            cache: HashMap::new(),
            visible: Vec::new(),
            revision: content.revision(),
        };
        engine.resync(content);
        engine
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    pub fn heights(&self) -> &HeightIndex {
        &self.heights
    }

    pub fn wrap_width(&self) -> Option<f32> {
        self.wrap_width
    }

    /// Change the wrap width; every cached fragment is dropped.
    pub fn set_wrap_width(&mut self, content: &ContentStore, wrap_width: Option<f32>) {
        if self.wrap_width == wrap_width {
            return;
        }
        self.wrap_width = wrap_width;
        self.resync(content);
    }

    pub fn overscan(&self) -> f32 {
        self.overscan
    }

    pub fn set_overscan(&mut self, overscan: f32) {
        self.overscan = overscan.max(0.0);
    }

    /// Estimated document height.
    pub fn document_height(&self) -> f32 {
        self.heights.total_height()
    }

    /// Fragments materialized by the last pass, in document order.
    pub fn visible_fragments(&self) -> impl Iterator<Item = &LayoutFragment> + '_ {
        self.visible.iter().filter_map(|id| self.cache.get(id))
    }

    /// Number of fragments currently cached.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_cached(&self, id: ParagraphId) -> bool {
        self.cache.contains_key(&id)
    }

    /// Rebuild the height index from scratch and drop every fragment.
    pub fn resync(&mut self, content: &ContentStore) {
        let entries = (0..content.line_count())
            .filter_map(|line| {
                let id = content.slot_id(line)?;
                Some(HeightEntry::estimated(id, self.estimated_height(content, line)))
            })
            .collect();
        self.heights = HeightIndex::from_entries(entries);
        self.cache.clear();
        self.visible.clear();
        self.revision = content.revision();
        debug!(
            target: "textport::layout",
            lines = self.heights.len(),
            "resynced height index"
        );
    }

    fn estimated_height(&self, content: &ContentStore, line: usize) -> f32 {
        let style_line = if is_extra_line(content, line) && line > 0 {
            line - 1
        } else {
            line
        };
        self.measurer.line_height(content.slot_style(style_line))
    }

    /// Apply a committed content change.
    ///
    /// Height entries for the touched lines are replaced with estimates and
    /// their fragments are evicted; untouched fragments stay cached.
    pub fn invalidate(&mut self, content: &ContentStore, change: &ContentChange) {
        let lines = change.lines;
        let old_end = lines.old_end_line.saturating_add(1);
        let new_end = lines.new_end_line.saturating_add(1);
        let expected = self
            .heights
            .len()
            .checked_sub(old_end.saturating_sub(lines.start_line))
            .map(|kept| kept + new_end.saturating_sub(lines.start_line));
        if old_end > self.heights.len()
            || lines.start_line >= old_end
            || expected != Some(content.line_count())
        {
            self.resync(content);
            return;
        }

        let new_entries: Vec<HeightEntry> = (lines.start_line..new_end)
            .filter_map(|line| {
                let id = content.slot_id(line)?;
                Some(HeightEntry::estimated(id, self.estimated_height(content, line)))
            })
            .collect();
        let kept: HashSet<ParagraphId> = new_entries.iter().map(|entry| entry.id).collect();
        let removed = self.heights.splice(lines.start_line..old_end, new_entries);
        let mut evicted = 0usize;
        for entry in removed {
            if !kept.contains(&entry.id) && self.cache.remove(&entry.id).is_some() {
                evicted += 1;
            }
        }
        // The extra line takes its height from the line above it.
        if content.has_extra_line() {
            if let Some(id) = content.slot_id(content.line_count() - 1) {
                self.cache.remove(&id);
            }
        }
        self.visible.retain(|id| self.cache.contains_key(id));
        self.revision = change.revision;
        debug!(
            target: "textport::layout",
            revision = change.revision,
            start_line = lines.start_line,
            old_end_line = lines.old_end_line,
            new_end_line = lines.new_end_line,
            evicted,
            "invalidated layout"
        );
    }

    fn build_line(&self, content: &ContentStore, line: usize) -> Option<LayoutFragment> {
        if is_extra_line(content, line) {
            let id = content.slot_id(line)?;
            let height = self.estimated_height(content, line);
            return Some(LayoutFragment::extra(
                id,
                line,
                content.end_location(),
                std::sync::Arc::clone(content.slot_style(line)),
                height,
                self.wrap_width,
            ));
        }
        let paragraph = content.paragraph(line)?;
        Some(LayoutFragment::build(
            &paragraph,
            self.measurer.as_ref(),
            self.wrap_width,
        ))
    }

    /// Take the cached fragment for `line` or build a new one, placed at its
    /// current position.
    fn materialize(
        &mut self,
        content: &ContentStore,
        line: usize,
        cache: &mut HashMap<ParagraphId, LayoutFragment>,
    ) -> Option<(LayoutFragment, bool)> {
        let id = content.slot_id(line)?;
        let (mut fragment, reused) = match cache.remove(&id) {
            Some(fragment) if fragment.wrap_width() == self.wrap_width => (fragment, true),
            _ => (self.build_line(content, line)?, false),
        };
        let start = content.line_range(line).start();
        fragment.place(line, start, self.heights.prefix(line));
        self.heights.set_measured(line, fragment.frame.size.height);
        Some((fragment, reused))
    }

    /// Lay out the fragments intersecting `viewport` plus the overscan margin.
    ///
    /// Returns the document range covered by the materialized fragments.
    pub fn layout_viewport(
        &mut self,
        content: &ContentStore,
        viewport: Rect,
        observer: &mut dyn LayoutObserver,
    ) -> TextRange {
        let started = Instant::now();
        observer.will_layout();
        if self.revision != content.revision() || self.heights.len() != content.line_count() {
            self.resync(content);
        }

        let region = viewport.expanded_vertically(self.overscan);
        let bottom = region.max_y();
        let line_count = content.line_count();
        let first = self.heights.index_at(region.min_y());

        let mut previous = std::mem::take(&mut self.cache);
        let mut visible = Vec::new();
        let mut reused = 0usize;
        let mut line = first;
        while line < line_count {
            if line > first && self.heights.prefix(line) > bottom {
                break;
            }
            let Some((fragment, was_cached)) = self.materialize(content, line, &mut previous)
            else {
                break;
            };
            if was_cached {
                reused += 1;
            }
            trace!(
                target: "textport::layout",
                line,
                y = fragment.frame.min_y(),
                height = fragment.frame.size.height,
                reused = was_cached,
                "placed fragment"
            );
            visible.push(fragment.paragraph_id);
            self.cache.insert(fragment.paragraph_id, fragment);
            line += 1;
        }
        let evicted = previous.len();
        drop(previous);

        for id in &visible {
            if let Some(fragment) = self.cache.get(id) {
                observer.place_fragment(fragment);
            }
        }
        let range = match (
            visible.first().and_then(|id| self.cache.get(id)),
            visible.last().and_then(|id| self.cache.get(id)),
        ) {
            (Some(first), Some(last)) => TextRange::new(first.range.start(), last.range.end()),
            _ => TextRange::empty(Location::ZERO),
        };
        self.visible = visible;
        observer.did_layout(range);
        debug!(
            target: "textport::layout",
            first_line = first,
            fragments = self.visible.len(),
            reused,
            evicted,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "layout pass complete"
        );
        range
    }

    /// Cached fragment holding `location`.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidRange`] when `location` is past the end,
    /// and [`EditorError::LayoutUnavailable`] when the paragraph has not been
    /// laid out; call [`LayoutEngine::ensure_layout`] first.
    pub fn fragment_for(
        &self,
        content: &ContentStore,
        location: Location,
    ) -> Result<&LayoutFragment> {
        content.check_range(TextRange::empty(location))?;
        let unavailable = EditorError::LayoutUnavailable {
            location: location.char_index(),
        };
        if self.revision != content.revision() {
            return Err(unavailable);
        }
        let line = content.line_index_at(location);
        content
            .slot_id(line)
            .and_then(|id| self.cache.get(&id))
            .ok_or(unavailable)
    }

    /// Lay out the paragraph holding `location` on demand.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidRange`] when `location` is past the end.
    pub fn ensure_layout(
        &mut self,
        content: &ContentStore,
        location: Location,
    ) -> Result<&LayoutFragment> {
        if location > content.end_location() {
            return Err(EditorError::InvalidRange {
                start: location.char_index(),
                end: location.char_index(),
                len: content.len(),
            });
        }
        self.ensure_line(content, content.line_index_at(location))
            .ok_or(EditorError::LayoutUnavailable {
                location: location.char_index(),
            })
    }

    /// Lay out line `line` on demand.
    pub fn ensure_line(&mut self, content: &ContentStore, line: usize) -> Option<&LayoutFragment> {
        if self.revision != content.revision() || self.heights.len() != content.line_count() {
            self.resync(content);
        }
        let id = content.slot_id(line)?;
        let mut cache = std::mem::take(&mut self.cache);
        let materialized = self.materialize(content, line, &mut cache);
        self.cache = cache;
        let (fragment, _) = materialized?;
        self.cache.insert(id, fragment);
        self.cache.get(&id)
    }
}

fn is_extra_line(content: &ContentStore, line: usize) -> bool {
    content.has_extra_line() && line + 1 == content.line_count()
}
