//! Report helpers exercised against files on disk.

use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use textport::cli::{document_stats, gutter_report, layout_report, load_text};
use textport::EditorConfig;

fn write_doc(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write doc");
    file
}

#[test]
fn gutter_report_numbers_every_paragraph_of_a_file() {
    let file = write_doc("fn main() {\n    println!(\"hi\");\n}\n");
    let text = load_text(file.path()).expect("load");
    let entries = gutter_report(&text, &EditorConfig::default(), 0.0, 600.0).expect("gutter");
    let numbers: Vec<usize> = entries.iter().map(|entry| entry.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
    assert!(entries[0].is_selected);
    assert!(!entries[1].is_selected);
}

#[test]
fn layout_report_serializes_to_json() {
    let file = write_doc("alpha\nbeta\n");
    let text = load_text(file.path()).expect("load");
    let report = layout_report(&text, &EditorConfig::default(), 0.0, 100.0).expect("layout");
    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["fragments"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["visible"]["start"], 0);
    assert_eq!(json["visible"]["end"], 11);
}

#[test]
fn stats_match_document_shape() {
    let file = write_doc("one\r\ntwo\r\nthree");
    let text = load_text(file.path()).expect("load");
    let stats = document_stats(&text, &EditorConfig::default()).expect("stats");
    assert_eq!(stats.paragraphs, 3);
    assert!(!stats.has_extra_line);
    assert_eq!(stats.visual_lines, 3);
    assert_eq!(stats.chars, 15);
}

#[test]
fn missing_file_names_the_path() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("absent.txt");
    let err = load_text(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.txt"));
}
