//! Weighted outcome lottery

use std::sync::Arc;

use rand::prelude::*;

use cf_core::{
    CaseDefinition, CfError, CfResult, ConfigError, Item, RarityTable, RarityTier, WearValue,
};

use crate::config::ReelLayout;

/// Items drawn for one spin, one per slot, with the outcome slot marked
#[derive(Debug, Clone)]
pub struct SlotAssignment {
    items: Vec<Arc<Item>>,
    winning_index: usize,
}

impl SlotAssignment {
    /// Create an assignment. Fails if `winning_index` is outside the item list.
    pub fn new(items: Vec<Arc<Item>>, winning_index: usize) -> CfResult<Self> {
        if winning_index >= items.len() {
            return Err(CfError::Index {
                index: winning_index,
                len: items.len(),
            });
        }
        Ok(Self {
            items,
            winning_index,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn winning_index(&self) -> usize {
        self.winning_index
    }

    /// The outcome item
    pub fn winning_item(&self) -> &Arc<Item> {
        &self.items[self.winning_index]
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Item>> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }
}

/// Weighted item lottery.
///
/// Owns its random number generator so a session's draws are independent
/// of every other session.
pub struct OutcomeSelector {
    rng: StdRng,
    fallback_count: u64,
}

impl OutcomeSelector {
    /// Create a selector seeded from the OS
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Create a selector with a fixed seed for reproducible draws
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            fallback_count: 0,
        }
    }

    /// Reseed in place
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// How often the cumulative walk ran off the end and fell back to the
    /// last eligible item. Should stay zero.
    pub fn fallback_count(&self) -> u64 {
        self.fallback_count
    }

    /// Draw one item.
    ///
    /// Items whose tier is in `exclude` are skipped. Every remaining item
    /// owns a half-open share `[cum, cum + weight)` of `[0, total)`.
    pub fn select<'a>(
        &mut self,
        items: &'a [Arc<Item>],
        table: &RarityTable,
        exclude: &[RarityTier],
    ) -> CfResult<&'a Arc<Item>> {
        if items.is_empty() {
            return Err(ConfigError::EmptyItems.into());
        }

        let mut eligible = Vec::with_capacity(items.len());
        let mut total = 0.0;
        for item in items.iter().filter(|item| !exclude.contains(&item.rarity)) {
            let weight = table
                .weight(item.rarity)
                .ok_or(ConfigError::MissingTier(item.rarity))?;
            total += weight;
            eligible.push((item, weight));
        }

        if !total.is_finite() || total <= 0.0 {
            return Err(ConfigError::NonPositiveWeight(total).into());
        }

        let roll = self.rng.random_range(0.0..total);
        let mut cumulative = 0.0;
        for &(item, weight) in &eligible {
            cumulative += weight;
            if roll < cumulative {
                return Ok(item);
            }
        }

        self.fallback_count += 1;
        log::warn!(
            "Weighted walk exhausted (roll {} >= cumulative {} of total {}), using last eligible item",
            roll,
            cumulative,
            total
        );
        // total > 0 guarantees at least one eligible entry
        eligible
            .last()
            .map(|&(item, _)| item)
            .ok_or_else(|| ConfigError::NonPositiveWeight(total).into())
    }

    /// Roll a wear value, uniform in [0, 1)
    pub fn roll_wear(&mut self) -> WearValue {
        // random::<f64>() is always in [0, 1)
        WearValue::new(self.rng.random::<f64>()).unwrap_or(WearValue::MIN)
    }

    /// Roll a landing offset inside `[lo, hi]`
    pub fn roll_landing_offset(&mut self, (lo, hi): (f64, f64)) -> f64 {
        if lo >= hi {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }

    /// Draw every slot of a reel.
    ///
    /// The winning slot draws from the full tier set. All other slots
    /// exclude the table's top tier, so the rarest tier can only ever be
    /// shown on the outcome slot.
    pub fn fill_reel(
        &mut self,
        case: &CaseDefinition,
        table: &RarityTable,
        layout: &ReelLayout,
    ) -> CfResult<SlotAssignment> {
        layout.validate()?;

        let reserved: Vec<RarityTier> = table.top_tier().into_iter().collect();
        let items = case.items();

        // Outcome first: it must never depend on the filler draws.
        let winner = Arc::clone(self.select(items, table, &[])?);

        let mut slots = Vec::with_capacity(layout.slot_count);
        for index in 0..layout.slot_count {
            if index == layout.winning_slot {
                slots.push(Arc::clone(&winner));
            } else {
                slots.push(Arc::clone(self.select(items, table, &reserved)?));
            }
        }

        SlotAssignment::new(slots, layout.winning_slot)
    }
}

impl Default for OutcomeSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(tiers: &[RarityTier]) -> Vec<Arc<Item>> {
        tiers
            .iter()
            .enumerate()
            .map(|(i, tier)| Arc::new(Item::new("Weapon", format!("Skin {i}"), *tier)))
            .collect()
    }

    #[test]
    fn test_empty_items() {
        let mut selector = OutcomeSelector::seeded(1);
        let err = selector
            .select(&[], &RarityTable::standard(), &[])
            .unwrap_err();
        assert!(matches!(err, CfError::Configuration(ConfigError::EmptyItems)));
    }

    #[test]
    fn test_missing_tier() {
        let mut selector = OutcomeSelector::seeded(1);
        let table = RarityTable::from_weights([(RarityTier::MilSpec, 1.0)]).unwrap();
        let list = items(&[RarityTier::MilSpec, RarityTier::Covert]);
        let err = selector.select(&list, &table, &[]).unwrap_err();
        assert!(matches!(
            err,
            CfError::Configuration(ConfigError::MissingTier(RarityTier::Covert))
        ));

        // Excluded tiers are not looked up
        assert!(selector.select(&list, &table, &[RarityTier::Covert]).is_ok());
    }

    #[test]
    fn test_zero_total_weight() {
        let mut selector = OutcomeSelector::seeded(1);
        let table = RarityTable::from_weights([(RarityTier::MilSpec, 0.0)]).unwrap();
        let list = items(&[RarityTier::MilSpec]);
        assert!(matches!(
            selector.select(&list, &table, &[]),
            Err(CfError::Configuration(ConfigError::NonPositiveWeight(_)))
        ));

        // Everything excluded is the same failure
        let list = items(&[RarityTier::RareSpecial]);
        assert!(matches!(
            selector.select(&list, &RarityTable::standard(), &[RarityTier::RareSpecial]),
            Err(CfError::Configuration(ConfigError::NonPositiveWeight(_)))
        ));
    }

    #[test]
    fn test_overflowing_total_weight() {
        let mut selector = OutcomeSelector::seeded(1);
        let table = RarityTable::from_weights([
            (RarityTier::MilSpec, 1e308),
            (RarityTier::Restricted, 1e308),
        ])
        .unwrap();
        let list = items(&[RarityTier::MilSpec, RarityTier::Restricted]);
        let err = selector.select(&list, &table, &[]).unwrap_err();
        assert!(matches!(
            err,
            CfError::Configuration(ConfigError::NonPositiveWeight(total)) if total.is_infinite()
        ));
    }

    #[test]
    fn test_zero_weight_item_never_drawn() {
        let mut selector = OutcomeSelector::seeded(7);
        let table = RarityTable::from_weights([
            (RarityTier::MilSpec, 0.0),
            (RarityTier::Restricted, 1.0),
        ])
        .unwrap();
        let list = items(&[RarityTier::MilSpec, RarityTier::Restricted, RarityTier::MilSpec]);
        for _ in 0..1000 {
            let item = selector.select(&list, &table, &[]).unwrap();
            assert_eq!(item.rarity, RarityTier::Restricted);
        }
        assert_eq!(selector.fallback_count(), 0);
    }

    #[test]
    fn test_seeded_draws_repeat() {
        let list = items(&[
            RarityTier::MilSpec,
            RarityTier::Restricted,
            RarityTier::Classified,
        ]);
        let table = RarityTable::standard();
        let mut a = OutcomeSelector::seeded(99);
        let mut b = OutcomeSelector::seeded(99);
        for _ in 0..100 {
            let x = a.select(&list, &table, &[]).unwrap();
            let y = b.select(&list, &table, &[]).unwrap();
            assert!(Arc::ptr_eq(x, y));
        }
    }

    #[test]
    fn test_fill_reel_places_winner() {
        let case = CaseDefinition::new(
            "Test",
            vec![
                Item::new("M4A4", "Howl", RarityTier::RareSpecial),
                Item::new("MP9", "Bulldozer", RarityTier::MilSpec),
            ],
        )
        .unwrap();
        let layout = ReelLayout::standard().with_slot_count(20);
        let mut selector = OutcomeSelector::seeded(5);

        let reel = selector
            .fill_reel(&case, &RarityTable::standard(), &layout)
            .unwrap();
        assert_eq!(reel.len(), 20);
        assert_eq!(reel.winning_index(), 15);
        for (i, item) in reel.items().iter().enumerate() {
            if i != reel.winning_index() {
                assert_eq!(item.rarity, RarityTier::MilSpec);
            }
        }
    }

    #[test]
    fn test_assignment_index_check() {
        let list = items(&[RarityTier::MilSpec]);
        assert!(matches!(
            SlotAssignment::new(list, 1),
            Err(CfError::Index { index: 1, len: 1 })
        ));
    }
}
