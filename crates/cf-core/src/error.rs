//! Error types for Caseforge

use thiserror::Error;

use crate::rarity::RarityTier;

/// Configuration problems that make a spin attempt impossible
///
/// These are deterministic: retrying with the same inputs fails the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Item list is empty")]
    EmptyItems,

    #[error("Total drop weight must be positive, got {0}")]
    NonPositiveWeight(f64),

    #[error("Rarity tier {0:?} has no weight in the rarity table")]
    MissingTier(RarityTier),

    #[error("Invalid weight {weight} for rarity tier {tier:?}")]
    InvalidWeight { tier: RarityTier, weight: f64 },

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),
}

/// Core error type
#[derive(Error, Debug)]
pub enum CfError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Winning slot index {index} out of range for a reel of {len} slots")]
    Index { index: usize, len: usize },

    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Reel did not settle within {steps} steps")]
    StepLimit { steps: usize },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CfError {
    /// Shorthand for an invalid configuration parameter
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Self::Configuration(ConfigError::InvalidParam(msg.into()))
    }

    /// Is this a configuration-time failure (as opposed to a runtime misuse)?
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Index { .. })
    }
}

/// Result type alias
pub type CfResult<T> = Result<T, CfError>;
