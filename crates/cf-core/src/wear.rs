//! Wear values and condition classification

use serde::{Deserialize, Serialize};

/// Upper (inclusive) wear boundary of each condition below Battle-Scarred
const WEAR_BOUNDARIES: [(f64, Condition); 4] = [
    (0.07, Condition::FactoryNew),
    (0.15, Condition::MinimalWear),
    (0.37, Condition::FieldTested),
    (0.45, Condition::WellWorn),
];

/// Decimal places kept before classifying
const WEAR_PRECISION: f64 = 1_000_000.0;

/// Cosmetic wear of a dropped item, in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct WearValue(f64);

impl WearValue {
    pub const MIN: WearValue = WearValue(0.0);
    pub const MAX: WearValue = WearValue(1.0);

    /// Create a wear value. Returns `None` outside [0, 1] or for NaN.
    pub fn new(value: f64) -> Option<Self> {
        (0.0..=1.0).contains(&value).then_some(Self(value))
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Condition for this wear value
    pub fn condition(self) -> Condition {
        classify(self.0)
    }
}

impl TryFrom<f64> for WearValue {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("wear value {value} outside [0, 1]"))
    }
}

impl From<WearValue> for f64 {
    fn from(wear: WearValue) -> Self {
        wear.0
    }
}

/// Item condition derived from its wear value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    FactoryNew,
    MinimalWear,
    FieldTested,
    WellWorn,
    BattleScarred,
    /// Wear value outside [0, 1]
    Invalid,
}

impl Condition {
    /// Valid conditions, least worn first
    pub const ALL: [Condition; 5] = [
        Self::FactoryNew,
        Self::MinimalWear,
        Self::FieldTested,
        Self::WellWorn,
        Self::BattleScarred,
    ];

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FactoryNew => "Factory New",
            Self::MinimalWear => "Minimal Wear",
            Self::FieldTested => "Field-Tested",
            Self::WellWorn => "Well-Worn",
            Self::BattleScarred => "Battle-Scarred",
            Self::Invalid => "Invalid",
        }
    }

    /// Two-letter abbreviation
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::FactoryNew => "FN",
            Self::MinimalWear => "MW",
            Self::FieldTested => "FT",
            Self::WellWorn => "WW",
            Self::BattleScarred => "BS",
            Self::Invalid => "--",
        }
    }

    /// Wear band as (exclusive lower, inclusive upper).
    ///
    /// Factory New also includes 0.0 itself.
    pub fn wear_range(&self) -> Option<(f64, f64)> {
        let mut lower = 0.0;
        for (upper, condition) in WEAR_BOUNDARIES {
            if condition == *self {
                return Some((lower, upper));
            }
            lower = upper;
        }
        match self {
            Self::BattleScarred => Some((lower, 1.0)),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Classify a wear value.
///
/// The value is rounded to six decimals first. A value equal to a boundary
/// stays in the lower (less worn) condition.
pub fn classify(wear: f64) -> Condition {
    if !(0.0..=1.0).contains(&wear) {
        return Condition::Invalid;
    }
    let rounded = (wear * WEAR_PRECISION).round() / WEAR_PRECISION;
    WEAR_BOUNDARIES
        .iter()
        .find(|(upper, _)| rounded <= *upper)
        .map(|(_, condition)| *condition)
        .unwrap_or(Condition::BattleScarred)
}
