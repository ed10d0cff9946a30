//! Viewport layout behaviour observed through the public engine API.

use textport_core::{
    ContentStore, EditorConfig, LayoutEngine, LayoutFragment, LayoutObserver, ParagraphId, Rect,
    TextRange,
};

fn wrapped_document() -> String {
    (0..40)
        .map(|i| {
            if i % 3 == 0 {
                format!("paragraph {i} carries enough words to wrap twice")
            } else {
                format!("short {i}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn config() -> EditorConfig {
    EditorConfig {
        overscan: 0.0,
        wrap_width: Some(120.0),
        ..EditorConfig::default()
    }
}

fn visible_ids(layout: &LayoutEngine) -> Vec<ParagraphId> {
    layout
        .visible_fragments()
        .map(|fragment| fragment.paragraph_id)
        .collect()
}

#[derive(Default)]
struct Recorder {
    passes: usize,
    placed: Vec<usize>,
    last_range: Option<TextRange>,
}

impl LayoutObserver for Recorder {
    fn will_layout(&mut self) {
        self.passes += 1;
        self.placed.clear();
    }

    fn place_fragment(&mut self, fragment: &LayoutFragment) {
        self.placed.push(fragment.paragraph_index);
    }

    fn did_layout(&mut self, visible: TextRange) {
        self.last_range = Some(visible);
    }
}

#[test]
fn one_pixel_scroll_keeps_fragments_unless_a_boundary_is_crossed() {
    let content = ContentStore::new(&wrapped_document());
    let mut layout = LayoutEngine::new(&content, &config());
    // Measure every paragraph so positions stop moving.
    layout.layout_viewport(&content, Rect::new(0.0, 0.0, 400.0, 1.0e6), &mut ());

    let height = 90.0;
    let boundaries: Vec<f32> = (0..=layout.heights().len())
        .map(|line| layout.heights().prefix(line))
        .collect();
    let crosses = |from: f32, to: f32| boundaries.iter().any(|&y| y > from && y <= to);

    let mut top = 0.0f32;
    while top < layout.document_height() - height {
        layout.layout_viewport(&content, Rect::new(0.0, top, 400.0, height), &mut ());
        let before = visible_ids(&layout);
        layout.layout_viewport(&content, Rect::new(0.0, top + 1.0, 400.0, height), &mut ());
        let after = visible_ids(&layout);

        let crossed =
            crosses(top, top + 1.0) || crosses(top + height, top + height + 1.0);
        if !crossed {
            assert_eq!(before, after, "fragments changed scrolling from y={top}");
        }
        top += 1.0;
    }
}

#[test]
fn observer_sees_one_pass_with_fragments_in_order() {
    let content = ContentStore::new(&wrapped_document());
    let mut layout = LayoutEngine::new(&content, &config());
    let mut recorder = Recorder::default();

    let range = layout.layout_viewport(&content, Rect::new(0.0, 40.0, 400.0, 120.0), &mut recorder);
    assert_eq!(recorder.passes, 1);
    assert!(!recorder.placed.is_empty());
    assert!(recorder.placed.windows(2).all(|pair| pair[1] == pair[0] + 1));
    assert_eq!(recorder.last_range, Some(range));
    assert_eq!(layout.cached_len(), recorder.placed.len());
}

#[test]
fn edits_keep_untouched_fragments_cached() {
    let mut content = ContentStore::new(&wrapped_document());
    let mut layout = LayoutEngine::new(&content, &config());
    layout.layout_viewport(&content, Rect::new(0.0, 0.0, 400.0, 400.0), &mut ());
    let ids = visible_ids(&layout);
    assert!(ids.len() > 3);

    let edited_line = 1;
    let range = content.line_range(edited_line);
    let events = content.subscribe();
    content
        .replace(TextRange::new(range.start(), range.start()), "edited ")
        .expect("replace");
    let change = events.try_recv().expect("change notification");
    layout.invalidate(&content, &change);

    assert!(!layout.is_cached(ids[edited_line]));
    for (line, id) in ids.iter().enumerate() {
        if line != edited_line {
            assert!(layout.is_cached(*id), "line {line} was evicted");
        }
    }
    layout.layout_viewport(&content, Rect::new(0.0, 0.0, 400.0, 400.0), &mut ());
    let relaid = visible_ids(&layout);
    assert_eq!(relaid[0], ids[0]);
    assert_ne!(relaid[edited_line], ids[edited_line]);
}
