//! Editor configuration passed explicitly at construction.

use crate::constants::{
    DEFAULT_CHAR_WIDTH, DEFAULT_COALESCE_WINDOW_MS, DEFAULT_KILL_RING_SIZE, DEFAULT_LINE_HEIGHT,
    DEFAULT_OVERSCAN, DEFAULT_TAB_WIDTH, DEFAULT_UNDO_DEPTH, DEFAULT_UNDO_MAX_BYTES,
};
use crate::error::{EditorError, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Line-height correction applied to paragraphs whose font family matches.
///
/// Some families report ascent/descent values that make lines look cramped or
/// loose next to the rest of the document; the factor scales the natural line
/// height for those families.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricsCorrection {
    /// Case-insensitive substring matched against the paragraph's family name.
    pub family_contains: String,
    /// Multiplier applied to the natural line height.
    pub line_height_factor: f32,
}

/// Runtime configuration for a text editor instance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub kill_ring_size: usize,
    pub undo_depth: usize,
    pub undo_max_bytes: usize,
    pub coalesce_window_ms: u64,
    /// Shift gutter baselines to account for paragraph line-height multiples.
    pub line_height_adjustment: bool,
    pub default_line_height: f32,
    pub char_width: f32,
    /// Wrap width in points; `None` disables soft wrapping.
    pub wrap_width: Option<f32>,
    pub overscan: f32,
    pub tab_width: usize,
    pub metrics_corrections: Vec<MetricsCorrection>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            kill_ring_size: DEFAULT_KILL_RING_SIZE,
            undo_depth: DEFAULT_UNDO_DEPTH,
            undo_max_bytes: DEFAULT_UNDO_MAX_BYTES,
            coalesce_window_ms: DEFAULT_COALESCE_WINDOW_MS,
            line_height_adjustment: true,
            default_line_height: DEFAULT_LINE_HEIGHT,
            char_width: DEFAULT_CHAR_WIDTH,
            wrap_width: None,
            overscan: DEFAULT_OVERSCAN,
            tab_width: DEFAULT_TAB_WIDTH,
            metrics_corrections: default_metrics_corrections(),
        }
    }
}

fn default_metrics_corrections() -> Vec<MetricsCorrection> {
    vec![
        MetricsCorrection {
            family_contains: "Hiragino".to_string(),
            line_height_factor: 0.85,
        },
        MetricsCorrection {
            family_contains: "Times".to_string(),
            line_height_factor: 1.1,
        },
    ]
}

/// Prefix shared by every environment override the engine reads.
pub const ENV_PREFIX: &str = "TEXTPORT_";

/// Interpret a `TEXTPORT_*` switch such as `TEXTPORT_LINE_HEIGHT_ADJUSTMENT`.
///
/// `on`/`off`, `true`/`false`, `yes`/`no` and `1`/`0` are understood in any
/// case. Blank or unrecognized values yield `None` so the default stays.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    const ON: [&str; 4] = ["on", "true", "yes", "1"];
    const OFF: [&str; 4] = ["off", "false", "no", "0"];
    let value = value.trim();
    if ON.iter().any(|word| value.eq_ignore_ascii_case(word)) {
        Some(true)
    } else if OFF.iter().any(|word| value.eq_ignore_ascii_case(word)) {
        Some(false)
    } else {
        None
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}{name}")).ok()
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_value(name).and_then(|value| value.trim().parse().ok())
}

impl EditorConfig {
    /// Load configuration defaults overlaid with `TEXTPORT_*` environment variables.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(size) = env_parsed("KILL_RING_SIZE") {
            config.kill_ring_size = size;
        }
        if let Some(depth) = env_parsed("UNDO_DEPTH") {
            config.undo_depth = depth;
        }
        if let Some(window) = env_parsed("COALESCE_WINDOW_MS") {
            config.coalesce_window_ms = window;
        }
        if let Some(flag) =
            env_value("LINE_HEIGHT_ADJUSTMENT").and_then(|value| parse_env_flag(&value))
        {
            config.line_height_adjustment = flag;
        }
        if let Some(width) = env_parsed::<f32>("WRAP_WIDTH") {
            config.wrap_width = (width > 0.0).then_some(width);
        }
        if let Some(overscan) = env_parsed("OVERSCAN") {
            config.overscan = overscan;
        }
        config
    }

    /// Reject configurations the engine cannot operate with.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.kill_ring_size == 0 {
            return Err(EditorError::InvalidConfig(
                "kill_ring_size must be at least 1".to_string(),
            ));
        }
        if self.undo_depth == 0 {
            return Err(EditorError::InvalidConfig(
                "undo_depth must be at least 1".to_string(),
            ));
        }
        if !(self.default_line_height > 0.0) || !(self.char_width > 0.0) {
            return Err(EditorError::InvalidConfig(
                "line height and char width must be positive".to_string(),
            ));
        }
        if matches!(self.wrap_width, Some(width) if !(width > 0.0)) {
            return Err(EditorError::InvalidConfig(
                "wrap_width must be positive when set".to_string(),
            ));
        }
        if !(self.overscan >= 0.0) {
            return Err(EditorError::InvalidConfig(
                "overscan must not be negative".to_string(),
            ));
        }
        if self.tab_width == 0 {
            return Err(EditorError::InvalidConfig(
                "tab_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Coalescing window as a [`Duration`].
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }
}
