//! Case Parser — Parse case documents into a case and its rarity table
//!
//! Case documents are JSON or YAML:
//!
//! ```json
//! {
//!   "name": "Recoil Case",
//!   "keyCount": 3,
//!   "items": [
//!     { "weaponType": "AWP", "skinName": "Chromatic Aberration", "rarityTier": "covert" },
//!     { "weaponType": "P250", "skinName": "Visions", "color": "#CE494A" }
//!   ]
//! }
//! ```
//!
//! An item names its tier either directly (`rarityTier`) or through the
//! legacy display colour (`color`, exact match only). An optional `weight`
//! overrides the drop weight of that item's tier for this case.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cf_core::{AssetHandles, CaseDefinition, CfError, ConfigError, Item, RarityTable, RarityTier};

/// Case document parser
pub struct CaseParser {
    /// Validation limits
    pub limits: CaseLimits,
    /// Weights used for tiers the document does not override
    pub base_table: RarityTable,
}

/// Parsing limits
#[derive(Debug, Clone)]
pub struct CaseLimits {
    pub max_name_length: usize,
    pub max_items: usize,
}

impl Default for CaseLimits {
    fn default() -> Self {
        Self {
            max_name_length: 256,
            max_items: 500,
        }
    }
}

/// A parsed case together with the table its draws use
#[derive(Debug, Clone)]
pub struct LoadedCase {
    pub case: CaseDefinition,
    pub table: RarityTable,
}

impl CaseParser {
    /// Create a parser using the standard rarity table
    pub fn new() -> Self {
        Self {
            limits: CaseLimits::default(),
            base_table: RarityTable::standard(),
        }
    }

    /// Create parser with custom limits
    pub fn with_limits(mut self, limits: CaseLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Use a different base rarity table
    pub fn with_table(mut self, table: RarityTable) -> Self {
        self.base_table = table;
        self
    }

    /// Parse a JSON case document
    pub fn parse_json(&self, json: &str) -> Result<LoadedCase, CaseParseError> {
        let doc: CaseDocument =
            serde_json::from_str(json).map_err(|e| CaseParseError::JsonError(e.to_string()))?;
        self.build(doc)
    }

    /// Parse a YAML case document
    pub fn parse_yaml(&self, yaml: &str) -> Result<LoadedCase, CaseParseError> {
        let doc: CaseDocument =
            serde_yml::from_str(yaml).map_err(|e| CaseParseError::YamlError(e.to_string()))?;
        self.build(doc)
    }

    /// Load a `.json`, `.yaml` or `.yml` case document
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadedCase, CaseParseError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loading case document {}", path.display());
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => self.parse_yaml(&text),
            _ => self.parse_json(&text),
        }
    }

    fn build(&self, doc: CaseDocument) -> Result<LoadedCase, CaseParseError> {
        if let Err(e) = self.validate(&doc) {
            log::warn!("Rejected case document '{}': {}", doc.name, e);
            return Err(e);
        }
        self.to_loaded_case(doc)
    }

    /// Validate a case document
    pub fn validate(&self, doc: &CaseDocument) -> Result<(), CaseParseError> {
        if doc.name.trim().is_empty() {
            return Err(CaseParseError::MissingField("name".into()));
        }
        if doc.name.len() > self.limits.max_name_length {
            return Err(CaseParseError::ValidationError(format!(
                "Case name too long: {} > {}",
                doc.name.len(),
                self.limits.max_name_length
            )));
        }
        if doc.items.is_empty() {
            return Err(ConfigError::EmptyItems.into());
        }
        if doc.items.len() > self.limits.max_items {
            return Err(CaseParseError::ValidationError(format!(
                "Too many items: {} > {}",
                doc.items.len(),
                self.limits.max_items
            )));
        }

        let mut overrides: BTreeMap<RarityTier, f64> = BTreeMap::new();
        for (index, item) in doc.items.iter().enumerate() {
            if item.weapon_type.trim().is_empty() {
                return Err(CaseParseError::MissingField(format!(
                    "items[{index}].weaponType"
                )));
            }
            if item.skin_name.trim().is_empty() {
                return Err(CaseParseError::MissingField(format!("items[{index}].skinName")));
            }

            let tier = item.tier(index)?;
            if let Some(weight) = item.weight {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(ConfigError::InvalidWeight { tier, weight }.into());
                }
                match overrides.insert(tier, weight) {
                    Some(previous) if previous != weight => {
                        return Err(CaseParseError::ValidationError(format!(
                            "Conflicting weights for {}: {} and {}",
                            tier, previous, weight
                        )));
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn to_loaded_case(&self, doc: CaseDocument) -> Result<LoadedCase, CaseParseError> {
        let mut table = self.base_table.clone();
        let mut items = Vec::with_capacity(doc.items.len());

        for (index, entry) in doc.items.into_iter().enumerate() {
            let tier = entry.tier(index)?;
            if let Some(weight) = entry.weight {
                table.set_weight(tier, weight)?;
            }
            items.push(
                Item::new(entry.weapon_type, entry.skin_name, tier).with_assets(AssetHandles {
                    skin_image: entry.skin_image,
                    background: entry.background,
                }),
            );
        }

        let mut case = CaseDefinition::new(doc.name, items)?.with_key_count(doc.key_count);
        if let Some(image) = doc.image {
            case = case.with_image(image);
        }

        log::info!(
            "Loaded case '{}' with {} items across {} tiers",
            case.name(),
            case.items().len(),
            case.tiers().len()
        );

        Ok(LoadedCase { case, table })
    }
}

impl Default for CaseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Case document structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDocument {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Keys held; carried as data only
    #[serde(default)]
    pub key_count: u32,
    pub items: Vec<CaseItemDoc>,
}

/// Item in a case document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseItemDoc {
    pub weapon_type: String,
    pub skin_name: String,
    #[serde(default)]
    pub rarity_tier: Option<RarityTier>,
    /// Legacy `#RRGGBB` / `#RRGGBBAA` tier colour
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub skin_image: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
}

impl CaseItemDoc {
    /// Resolve the item's tier from `rarityTier` or `color`
    fn tier(&self, index: usize) -> Result<RarityTier, CaseParseError> {
        let from_color = match &self.color {
            Some(hex) => Some(RarityTier::from_hex(hex).ok_or_else(|| {
                CaseParseError::InvalidValue(format!(
                    "items[{index}].color {hex} is not a rarity colour"
                ))
            })?),
            None => None,
        };

        match (self.rarity_tier, from_color) {
            (Some(tier), Some(color)) if tier != color => Err(CaseParseError::InvalidValue(
                format!("items[{index}] rarityTier {tier} disagrees with color {color}"),
            )),
            (Some(tier), _) | (None, Some(tier)) => Ok(tier),
            (None, None) => Err(CaseParseError::MissingField(format!(
                "items[{index}].rarityTier"
            ))),
        }
    }
}

/// Case document parsing errors
#[derive(Debug, thiserror::Error)]
pub enum CaseParseError {
    #[error("JSON parse error: {0}")]
    JsonError(String),

    #[error("YAML parse error: {0}")]
    YamlError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CaseParseError> for CfError {
    fn from(err: CaseParseError) -> Self {
        match err {
            CaseParseError::Config(e) => CfError::Configuration(e),
            CaseParseError::Io(e) => CfError::Io(e),
            other => CfError::Parse(other.to_string()),
        }
    }
}
