//! Stage — The canonical moments of a case opening
//!
//! A Stage is the SEMANTIC MEANING of a moment in the opening flow, not an
//! animation frame. UI and audio respond to stages, never to reel positions.

use serde::{Deserialize, Serialize};

use cf_core::{Condition, Item, RarityTier};

use crate::taxonomy::SoundCategory;

/// Canonical case opening stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    /// Outcome fixed, reel starts moving
    SpinStart {
        /// Number of slots on the reel
        slot_count: usize,
        /// Index of the winning slot
        winning_slot: usize,
    },

    /// Winning slot entered the slowdown zone
    ReelSlowing,

    /// A slot crossed the win line (one-shot per slot)
    ScrollTick {
        /// Which slot (0-indexed)
        slot_index: usize,
    },

    /// The win line entered the winning slot's footprint; reel stopped
    ReelSettled {
        /// Frames stepped before settling
        steps: usize,
    },

    /// Result presentation
    Reveal {
        /// Winning item
        item: Item,
        /// Wear value in [0, 1]
        wear: f64,
        /// Condition derived from the wear value
        condition: Condition,
        /// Tier of the winning item, for audio lookup
        tier: RarityTier,
        /// Reveal sound category
        sound: SoundCategory,
    },
}

impl Stage {
    /// Get stage type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Stage::SpinStart { .. } => "spin_start",
            Stage::ReelSlowing => "reel_slowing",
            Stage::ScrollTick { .. } => "scroll_tick",
            Stage::ReelSettled { .. } => "reel_settled",
            Stage::Reveal { .. } => "reveal",
        }
    }

    /// Sound category this stage asks for, if any
    pub fn sound(&self) -> Option<SoundCategory> {
        match self {
            Stage::SpinStart { .. } => Some(SoundCategory::SpinStart),
            Stage::ScrollTick { .. } => Some(SoundCategory::ScrollTick),
            Stage::Reveal { sound, .. } => Some(*sound),
            Stage::ReelSlowing | Stage::ReelSettled { .. } => None,
        }
    }

    /// Does this stage end the spin?
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Reveal { .. })
    }
}
