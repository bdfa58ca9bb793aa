//! StageEvent — A stage occurrence with metadata
//!
//! Wraps a Stage with the spin it belongs to and its spin-relative time.

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// A stage event with full metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// The canonical stage
    pub stage: Stage,

    /// Spin generation this event belongs to
    pub spin_id: u64,

    /// Timestamp in milliseconds from the start of the spin
    pub timestamp_ms: f64,
}

impl StageEvent {
    /// Create a new stage event
    pub fn new(stage: Stage, spin_id: u64, timestamp_ms: f64) -> Self {
        Self {
            stage,
            spin_id,
            timestamp_ms,
        }
    }

    /// Get stage type name
    pub fn type_name(&self) -> &'static str {
        self.stage.type_name()
    }
}

impl std::fmt::Display for StageEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[spin {} @ {:>8.1}ms] {}",
            self.spin_id,
            self.timestamp_ms,
            self.type_name()
        )?;
        match &self.stage {
            Stage::ScrollTick { slot_index } => write!(f, " slot={slot_index}"),
            Stage::SpinStart {
                slot_count,
                winning_slot,
            } => write!(f, " slots={slot_count} winning={winning_slot}"),
            Stage::ReelSettled { steps } => write!(f, " steps={steps}"),
            Stage::Reveal {
                item,
                wear,
                condition,
                tier,
                ..
            } => write!(
                f,
                " {} ({}) wear={:.6} [{}]",
                item.display_name(),
                condition,
                wear,
                tier
            ),
            Stage::ReelSlowing => Ok(()),
        }
    }
}
