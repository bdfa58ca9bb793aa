//! Rarity tiers and drop weight tables

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Rarity tier classification, ordered from most common to rarest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RarityTier {
    /// Blue
    MilSpec,
    /// Purple
    Restricted,
    /// Pink
    Classified,
    /// Red
    Covert,
    /// Gold - knives and gloves
    RareSpecial,
}

impl RarityTier {
    /// All tiers, most common first
    pub const ALL: [RarityTier; 5] = [
        Self::MilSpec,
        Self::Restricted,
        Self::Classified,
        Self::Covert,
        Self::RareSpecial,
    ];

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MilSpec => "Mil-Spec",
            Self::Restricted => "Restricted",
            Self::Classified => "Classified",
            Self::Covert => "Covert",
            Self::RareSpecial => "Rare Special",
        }
    }

    /// Display colour (RGBA) used by the item background
    pub fn rgba(&self) -> [u8; 4] {
        match self {
            Self::MilSpec => [81, 103, 241, 255],
            Self::Restricted => [132, 73, 247, 255],
            Self::Classified => [190, 48, 205, 255],
            Self::Covert => [206, 73, 74, 255],
            Self::RareSpecial => [239, 215, 55, 255],
        }
    }

    /// Map a legacy display colour back to its tier.
    ///
    /// Exact match only. Palette drift must fail loudly instead of silently
    /// resolving to a neighbouring tier.
    pub fn from_rgba(rgba: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.rgba() == rgba)
    }

    /// Parse a `#RRGGBB` or `#RRGGBBAA` colour string into a tier
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        let alpha = if digits.len() == 8 { channel(6)? } else { 255 };
        Self::from_rgba([channel(0)?, channel(2)?, channel(4)?, alpha])
    }
}

impl std::fmt::Display for RarityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Mapping from rarity tier to drop weight.
///
/// Weights are percentage-like but need not sum to 100; the selector
/// normalizes by the total of whatever items are eligible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<RarityTier, f64>", into = "BTreeMap<RarityTier, f64>")]
pub struct RarityTable {
    weights: BTreeMap<RarityTier, f64>,
}

impl RarityTable {
    /// Empty table
    pub fn empty() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }

    /// Reference drop distribution
    pub fn standard() -> Self {
        Self {
            weights: BTreeMap::from([
                (RarityTier::MilSpec, 79.92),
                (RarityTier::Restricted, 15.98),
                (RarityTier::Classified, 3.2),
                (RarityTier::Covert, 0.64),
                (RarityTier::RareSpecial, 0.26),
            ]),
        }
    }

    /// Build from explicit weights
    pub fn from_weights(
        weights: impl IntoIterator<Item = (RarityTier, f64)>,
    ) -> Result<Self, ConfigError> {
        let mut table = Self::empty();
        for (tier, weight) in weights {
            table.set_weight(tier, weight)?;
        }
        Ok(table)
    }

    /// Set the weight of a tier. Negative, NaN and infinite weights are rejected.
    pub fn set_weight(&mut self, tier: RarityTier, weight: f64) -> Result<(), ConfigError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::InvalidWeight { tier, weight });
        }
        self.weights.insert(tier, weight);
        Ok(())
    }

    /// Builder variant of [`set_weight`](Self::set_weight)
    pub fn with_weight(mut self, tier: RarityTier, weight: f64) -> Result<Self, ConfigError> {
        self.set_weight(tier, weight)?;
        Ok(self)
    }

    /// Weight for a tier, if the table has one
    pub fn weight(&self, tier: RarityTier) -> Option<f64> {
        self.weights.get(&tier).copied()
    }

    /// Highest tier present in the table
    pub fn top_tier(&self) -> Option<RarityTier> {
        self.weights.keys().next_back().copied()
    }

    /// Sum of all weights in the table
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Iterate tiers and weights, most common tier first
    pub fn iter(&self) -> impl Iterator<Item = (RarityTier, f64)> + '_ {
        self.weights.iter().map(|(tier, weight)| (*tier, *weight))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl Default for RarityTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<BTreeMap<RarityTier, f64>> for RarityTable {
    type Error = ConfigError;

    fn try_from(weights: BTreeMap<RarityTier, f64>) -> Result<Self, Self::Error> {
        Self::from_weights(weights)
    }
}

impl From<RarityTable> for BTreeMap<RarityTier, f64> {
    fn from(table: RarityTable) -> Self {
        table.weights
    }
}
