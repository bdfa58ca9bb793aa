//! Stage Taxonomy — Sound categories for the audio collaborator
//!
//! The engine never plays audio. It only says which category of sound a
//! moment calls for; the audio layer maps categories to assets.

use serde::{Deserialize, Serialize};

use cf_core::RarityTier;

/// Sound category requested by a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCategory {
    /// Reel start whoosh
    SpinStart,
    /// A slot crossed the win line
    ScrollTick,
    /// Reveal stinger for a blue drop
    RevealMilSpec,
    /// Reveal stinger for a purple drop
    RevealRestricted,
    /// Reveal stinger for a pink drop
    RevealClassified,
    /// Reveal stinger for a red drop
    RevealCovert,
    /// Reveal stinger for a gold drop
    RevealRareSpecial,
}

impl SoundCategory {
    /// Reveal category for the winning item's tier
    pub fn for_tier(tier: RarityTier) -> Self {
        match tier {
            RarityTier::MilSpec => Self::RevealMilSpec,
            RarityTier::Restricted => Self::RevealRestricted,
            RarityTier::Classified => Self::RevealClassified,
            RarityTier::Covert => Self::RevealCovert,
            RarityTier::RareSpecial => Self::RevealRareSpecial,
        }
    }

    /// Is this a reveal stinger?
    pub fn is_reveal(&self) -> bool {
        !matches!(self, Self::SpinStart | Self::ScrollTick)
    }

    /// Stable identifier used by audio bank lookups
    pub fn id(&self) -> &'static str {
        match self {
            Self::SpinStart => "spin_start",
            Self::ScrollTick => "scroll_tick",
            Self::RevealMilSpec => "reveal_mil_spec",
            Self::RevealRestricted => "reveal_restricted",
            Self::RevealClassified => "reveal_classified",
            Self::RevealCovert => "reveal_covert",
            Self::RevealRareSpecial => "reveal_rare_special",
        }
    }
}
