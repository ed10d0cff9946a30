//! Layout, gutter, and document reports for headless inspection.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use textport_core::{
    ContentStore, EditorConfig, GutterLineEntry, GutterProjector, LayoutEngine, Rect,
    SelectionSet, TextRange,
};

/// Width of the synthetic viewport used by reports.
const REPORT_VIEWPORT_WIDTH: f32 = 1024.0;

/// Read a document from disk.
pub fn load_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentReport {
    pub paragraph: usize,
    pub range: TextRange,
    pub y: f32,
    pub height: f32,
    pub lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutReport {
    pub visible: TextRange,
    pub document_height: f32,
    pub fragments: Vec<FragmentReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentStats {
    pub chars: usize,
    pub utf16_units: usize,
    pub paragraphs: usize,
    pub has_extra_line: bool,
    pub visual_lines: usize,
    pub document_height: f32,
}

fn engine(text: &str, config: &EditorConfig) -> Result<(ContentStore, LayoutEngine)> {
    config.validate().context("invalid editor configuration")?;
    let content = ContentStore::new(text);
    let layout = LayoutEngine::new(&content, config);
    Ok((content, layout))
}

/// Lay out `height` points starting at `top` and describe the fragments.
pub fn layout_report(
    text: &str,
    config: &EditorConfig,
    top: f32,
    height: f32,
) -> Result<LayoutReport> {
    let (content, mut layout) = engine(text, config)?;
    let visible = layout.layout_viewport(
        &content,
        Rect::new(0.0, top, REPORT_VIEWPORT_WIDTH, height),
        &mut (),
    );
    let fragments = layout
        .visible_fragments()
        .map(|fragment| FragmentReport {
            paragraph: fragment.paragraph_index,
            range: fragment.range,
            y: fragment.frame.min_y(),
            height: fragment.frame.size.height,
            lines: fragment.line_fragments().len(),
        })
        .collect();
    Ok(LayoutReport {
        visible,
        document_height: layout.document_height(),
        fragments,
    })
}

/// Gutter entries for the viewport at `top`, with a caret at the document start.
pub fn gutter_report(
    text: &str,
    config: &EditorConfig,
    top: f32,
    height: f32,
) -> Result<Vec<GutterLineEntry>> {
    let (content, mut layout) = engine(text, config)?;
    layout.layout_viewport(
        &content,
        Rect::new(0.0, top, REPORT_VIEWPORT_WIDTH, height),
        &mut (),
    );
    let mut gutter = GutterProjector::from_config(config);
    Ok(gutter.project(&layout, &SelectionSet::default()))
}

/// Counts for the whole document; every paragraph is laid out once.
pub fn document_stats(text: &str, config: &EditorConfig) -> Result<DocumentStats> {
    let (content, mut layout) = engine(text, config)?;
    let mut visual_lines = 0;
    let mut top = 0.0f32;
    layout.set_overscan(0.0);
    loop {
        let viewport = Rect::new(0.0, top, REPORT_VIEWPORT_WIDTH, REPORT_VIEWPORT_WIDTH);
        layout.layout_viewport(&content, viewport, &mut ());
        let mut last_bottom = top;
        for fragment in layout.visible_fragments() {
            if fragment.frame.min_y() >= top {
                visual_lines += fragment.line_fragments().len();
            }
            last_bottom = last_bottom.max(fragment.frame.max_y());
        }
        if last_bottom >= layout.document_height() || last_bottom <= top {
            break;
        }
        top = last_bottom;
    }
    Ok(DocumentStats {
        chars: content.len(),
        utf16_units: content.len_utf16(),
        paragraphs: content.paragraph_count(),
        has_extra_line: content.has_extra_line(),
        visual_lines,
        document_height: layout.document_height(),
    })
}

pub fn format_layout(report: &LayoutReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "visible {} of {:.1}pt",
        report.visible, report.document_height
    );
    for fragment in &report.fragments {
        let _ = writeln!(
            out,
            "{:>6}  {:<12} y={:<8.1} h={:<6.1} lines={}",
            fragment.paragraph + 1,
            fragment.range.to_string(),
            fragment.y,
            fragment.height,
            fragment.lines
        );
    }
    out
}

pub fn format_gutter(entries: &[GutterLineEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let marker = if entry.is_selected { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker}{:>6}  baseline={:.1}",
            entry.number, entry.baseline_origin.y
        );
    }
    out
}

pub fn format_stats(stats: &DocumentStats) -> String {
    format!(
        "chars: {}\nutf16 units: {}\nparagraphs: {}\nextra line: {}\nvisual lines: {}\nheight: {:.1}pt\n",
        stats.chars,
        stats.utf16_units,
        stats.paragraphs,
        stats.has_extra_line,
        stats.visual_lines,
        stats.document_height
    )
}
