//! Drop statistics and batch simulation

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cf_core::{
    CaseDefinition, CfResult, Condition, ConfigError, Item, RarityTable, RarityTier, WearValue,
};

use crate::selector::OutcomeSelector;

/// Drop counts per tier and condition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DropStats {
    pub opens: u64,
    pub by_tier: BTreeMap<RarityTier, u64>,
    pub by_condition: BTreeMap<Condition, u64>,
    /// Selector fallbacks observed while producing these drops
    pub fallbacks: u64,
    pub wear_sum: f64,
}

impl DropStats {
    /// Record one drop
    pub fn record(&mut self, tier: RarityTier, wear: WearValue) {
        self.opens += 1;
        *self.by_tier.entry(tier).or_default() += 1;
        *self.by_condition.entry(wear.condition()).or_default() += 1;
        self.wear_sum += wear.value();
    }

    /// Share of opens that dropped `tier`
    pub fn tier_frequency(&self, tier: RarityTier) -> f64 {
        if self.opens > 0 {
            self.by_tier.get(&tier).copied().unwrap_or(0) as f64 / self.opens as f64
        } else {
            0.0
        }
    }

    /// Share of opens that rolled `condition`
    pub fn condition_frequency(&self, condition: Condition) -> f64 {
        if self.opens > 0 {
            self.by_condition.get(&condition).copied().unwrap_or(0) as f64 / self.opens as f64
        } else {
            0.0
        }
    }

    /// Mean wear value
    pub fn mean_wear(&self) -> f64 {
        if self.opens > 0 {
            self.wear_sum / self.opens as f64
        } else {
            0.0
        }
    }
}

/// Analytic drop chance of every item in the case
pub fn expected_item_odds(
    case: &CaseDefinition,
    table: &RarityTable,
) -> CfResult<Vec<(Arc<Item>, f64)>> {
    let mut weighted = Vec::with_capacity(case.items().len());
    let mut total = 0.0;
    for item in case.items() {
        let weight = table
            .weight(item.rarity)
            .ok_or(ConfigError::MissingTier(item.rarity))?;
        total += weight;
        weighted.push((Arc::clone(item), weight));
    }
    if !total.is_finite() || total <= 0.0 {
        return Err(ConfigError::NonPositiveWeight(total).into());
    }
    Ok(weighted
        .into_iter()
        .map(|(item, weight)| (item, weight / total))
        .collect())
}

/// Analytic drop chance per tier, most common tier first
pub fn expected_tier_odds(
    case: &CaseDefinition,
    table: &RarityTable,
) -> CfResult<Vec<(RarityTier, f64)>> {
    let mut odds: BTreeMap<RarityTier, f64> = BTreeMap::new();
    for (item, chance) in expected_item_odds(case, table)? {
        *odds.entry(item.rarity).or_default() += chance;
    }
    Ok(odds.into_iter().collect())
}

/// Resolves opens without animation: one winning draw plus one wear roll each
pub struct CaseSimulator {
    selector: OutcomeSelector,
}

impl CaseSimulator {
    pub fn new() -> Self {
        Self {
            selector: OutcomeSelector::new(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            selector: OutcomeSelector::seeded(seed),
        }
    }

    /// Simulate `opens` case openings
    pub fn run(
        &mut self,
        case: &CaseDefinition,
        table: &RarityTable,
        opens: u64,
    ) -> CfResult<DropStats> {
        let start_fallbacks = self.selector.fallback_count();
        let mut stats = DropStats::default();
        for _ in 0..opens {
            let tier = self.selector.select(case.items(), table, &[])?.rarity;
            let wear = self.selector.roll_wear();
            stats.record(tier, wear);
        }
        stats.fallbacks = self.selector.fallback_count() - start_fallbacks;

        log::info!(
            "Simulated {} opens of '{}' ({} fallbacks)",
            opens,
            case.name(),
            stats.fallbacks
        );
        Ok(stats)
    }
}

impl Default for CaseSimulator {
    fn default() -> Self {
        Self::new()
    }
}
