//! Viewport-driven text layout and editing state (content, layout, selection, undo, gutter).

/// Char-index locations, ranges, and UTF-16 offsets.
pub mod address;
/// Line annotations anchored to locations.
pub mod annotation;
/// Background word indexing for completion.
pub mod completion;
/// Engine configuration loading and defaults.
pub mod config;
/// Shared default values.
pub mod constants;
/// Paragraph-structured text storage and edit transactions.
pub mod content;
/// Editing session façade and command reducer.
pub mod editor;
/// Error types.
pub mod error;
/// Points, sizes, and rectangles.
pub mod geometry;
/// Line-number gutter projection.
pub mod gutter;
/// Height index, fragment cache, and viewport layout.
pub mod layout;
/// Selections, multi-caret sets, and navigation.
pub mod selection;
/// Coalescing undo history and kill ring.
pub mod undo;

#[cfg(test)]
mod env;

pub use address::{Affinity, Location, TextRange};
pub use annotation::{AnnotationId, AnnotationSet, LineAnnotation, PlacedAnnotation};
pub use completion::{WordIndex, WordIndexWorker};
pub use config::EditorConfig;
pub use content::{AttributedRun, ContentChange, ContentStore, ParagraphId, ParagraphStyle};
pub use editor::{ApplyResult, CaseChange, EditorCommand, TextEditor};
pub use error::{EditorError, Result};
pub use geometry::{Point, Rect, Size};
pub use gutter::{GutterLineEntry, GutterProjector};
pub use layout::{LayoutEngine, LayoutFragment, LayoutObserver, MonospaceMeasurer, TextMeasurer};
pub use selection::{Direction, Granularity, Navigator, Selection, SelectionSet};
pub use undo::{KillRing, UndoManager};
