//! # cf-stage — Caseforge Stage System
//!
//! Defines the canonical stages a case opening passes through:
//! spin start → scroll ticks → slowdown → settle → reveal.
//!
//! UI and audio collaborators consume these; they never look at reel
//! positions directly.

pub mod event;
pub mod stage;
pub mod taxonomy;

pub use event::*;
pub use stage::*;
pub use taxonomy::*;
