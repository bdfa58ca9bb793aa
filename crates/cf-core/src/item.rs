//! Item and case definitions

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rarity::RarityTier;

/// Opaque display asset handles. The engine never resolves them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHandles {
    #[serde(default)]
    pub skin_image: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
}

/// A droppable item (weapon skin)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Weapon type (e.g., "AK-47")
    pub weapon_type: String,
    /// Skin name (e.g., "Redline")
    pub skin_name: String,
    /// Rarity tier
    pub rarity: RarityTier,
    /// Display assets
    #[serde(default)]
    pub assets: AssetHandles,
}

impl Item {
    /// Create an item without display assets
    pub fn new(
        weapon_type: impl Into<String>,
        skin_name: impl Into<String>,
        rarity: RarityTier,
    ) -> Self {
        Self {
            weapon_type: weapon_type.into(),
            skin_name: skin_name.into(),
            rarity,
            assets: AssetHandles::default(),
        }
    }

    /// Attach display assets
    pub fn with_assets(mut self, assets: AssetHandles) -> Self {
        self.assets = assets;
        self
    }

    /// "Weapon | Skin" display name
    pub fn display_name(&self) -> String {
        format!("{} | {}", self.weapon_type, self.skin_name)
    }
}

/// A case: a named, ordered, non-empty list of items
#[derive(Debug, Clone)]
pub struct CaseDefinition {
    name: String,
    image: Option<String>,
    items: Vec<Arc<Item>>,
    key_count: u32,
}

impl CaseDefinition {
    /// Create a case. Fails if `items` is empty.
    pub fn new(name: impl Into<String>, items: Vec<Item>) -> Result<Self, ConfigError> {
        if items.is_empty() {
            return Err(ConfigError::EmptyItems);
        }
        Ok(Self {
            name: name.into(),
            image: None,
            items: items.into_iter().map(Arc::new).collect(),
            key_count: 0,
        })
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_key_count(mut self, key_count: u32) -> Self {
        self.key_count = key_count;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Items in definition order
    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }

    /// Keys held for this case. Owned by the inventory; carried as data only.
    pub fn key_count(&self) -> u32 {
        self.key_count
    }

    /// Distinct tiers present in the case, most common first
    pub fn tiers(&self) -> Vec<RarityTier> {
        let mut tiers: Vec<RarityTier> = self.items.iter().map(|item| item.rarity).collect();
        tiers.sort();
        tiers.dedup();
        tiers
    }

    /// Number of items of a given tier
    pub fn count_of(&self, tier: RarityTier) -> usize {
        self.items.iter().filter(|item| item.rarity == tier).count()
    }
}
