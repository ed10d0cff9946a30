//! Root crate facade for the textport layout and editing engine.

/// Headless report builders behind the `textport` binary.
pub mod cli;

pub use textport_core::*;
