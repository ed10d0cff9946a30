//! Shared defaults for the editing engine.

/// Default number of kill-ring slots (matches the platform default of one).
pub const DEFAULT_KILL_RING_SIZE: usize = 1;

/// Default maximum number of committed undo groups.
pub const DEFAULT_UNDO_DEPTH: usize = 500;
/// Default byte budget for undo history (deleted + inserted text).
pub const DEFAULT_UNDO_MAX_BYTES: usize = 8 * 1024 * 1024;
/// Default window in which consecutive typing may coalesce into one undo group.
pub const DEFAULT_COALESCE_WINDOW_MS: u64 = 750;

/// Provisional height of one visual line before any measurement happens.
pub const DEFAULT_LINE_HEIGHT: f32 = 16.0;
/// Default advance of a single-column character.
pub const DEFAULT_CHAR_WIDTH: f32 = 8.0;
/// Default overscan margin above and below the viewport, in points.
pub const DEFAULT_OVERSCAN: f32 = 256.0;
/// Default tab stop width in columns.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Fraction of the line height where the first baseline sits.
pub const BASELINE_RATIO: f32 = 0.8;

/// Minimum character count for words collected by the completion index.
pub const DEFAULT_COMPLETION_MIN_WORD_CHARS: usize = 3;
