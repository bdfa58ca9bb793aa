//! # cf-case-lab — Case Opening Outcome Engine for Caseforge
//!
//! Draws a weighted outcome, then animates a reel that converges frame by
//! frame onto that fixed outcome, then classifies a wear roll into a
//! condition.
//!
//! ## Features
//!
//! - **Outcome Selector**: Weighted lottery with per-slot tier exclusion
//! - **Reel Animator**: Ease-out reel that stops inside the winning slot
//! - **Spin Session**: Open / step / close lifecycle with cancellation
//! - **Stage Generation**: STAGE events for UI and audio collaborators
//! - **Case Documents**: JSON and YAML case definitions
//! - **Simulation**: Batch drop statistics without animation
//!
//! ## Architecture
//!
//! ```text
//! SpinSession
//!     │
//!     ├── CaseDefinition + RarityTable
//!     ├── OutcomeSelector (fill_reel, roll_wear, roll_landing_offset)
//!     └── SpinConfig (ReelLayout, ReelPhysics)
//!           │
//!           v
//!     ReelAnimator::step(dt) → Vec<StageEvent> → SpinOutcome
//! ```

pub mod config;
pub mod parser;
pub mod reel;
pub mod selector;
pub mod session;
pub mod stats;

pub use config::*;
pub use parser::*;
pub use reel::*;
pub use selector::*;
pub use session::*;
pub use stats::*;
