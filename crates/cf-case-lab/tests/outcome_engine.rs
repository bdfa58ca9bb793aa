//! Outcome Engine Integration Tests
//!
//! Tests for:
//! - Empirical drop frequencies against the standard rarity table
//! - Top tier reserved for the winning slot
//! - Reel convergence from far away, no overshoot, no movement after settle
//! - Cancel-and-restart isolation of stage events
//! - Error taxonomy across selector, layout and session

use std::sync::Arc;

use cf_case_lab::{
    OutcomeSelector, ReelLayout, ReelPhysics, SessionState, SpinConfig, SpinSession,
};
use cf_core::{CaseDefinition, CfError, ConfigError, Item, RarityTable, RarityTier};
use cf_stage::Stage;

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

const DT: f64 = 1.0 / 60.0;

/// One item per tier, most common first
fn tier_case() -> CaseDefinition {
    let items = RarityTier::ALL
        .iter()
        .map(|tier| Item::new("Weapon", tier.display_name(), *tier))
        .collect();
    CaseDefinition::new("Tier Case", items).unwrap()
}

/// Single-slot reel whose aim point starts `distance` units right of the line
fn far_config(distance: f64) -> SpinConfig {
    SpinConfig::default()
        .with_physics(ReelPhysics::standard())
        .with_layout(ReelLayout {
            slot_count: 1,
            winning_slot: 0,
            slot_width: 373.0,
            spacing: 373.0,
            start_x: distance - 373.0,
            target_line_x: 0.0,
        })
        .with_landing_offset(0.0)
}

fn single_item_case() -> Arc<CaseDefinition> {
    Arc::new(
        CaseDefinition::new(
            "Single",
            vec![Item::new("Nova", "Sand Dune", RarityTier::MilSpec)],
        )
        .unwrap(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// SELECTION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_empirical_frequencies_match_weights() {
    let case = tier_case();
    let table = RarityTable::standard();
    let mut selector = OutcomeSelector::seeded(2024);

    const DRAWS: usize = 200_000;
    let mut counts = [0usize; 5];
    for _ in 0..DRAWS {
        let item = selector.select(case.items(), &table, &[]).unwrap();
        counts[item.rarity as usize] += 1;
    }

    let total = table.total();
    for tier in RarityTier::ALL {
        let expected = table.weight(tier).unwrap() / total;
        let observed = counts[tier as usize] as f64 / DRAWS as f64;
        assert!(
            (observed - expected).abs() < 0.005,
            "{tier}: observed {observed:.5}, expected {expected:.5}"
        );
    }
    assert_eq!(selector.fallback_count(), 0);
}

#[test]
fn test_top_tier_only_on_winning_slot() {
    let case = tier_case();
    let table = RarityTable::standard();
    let layout = ReelLayout::standard();
    let mut selector = OutcomeSelector::seeded(7);

    for _ in 0..200 {
        let reel = selector.fill_reel(&case, &table, &layout).unwrap();
        assert_eq!(reel.len(), layout.slot_count);
        for (index, item) in reel.items().iter().enumerate() {
            if index != reel.winning_index() {
                assert_ne!(item.rarity, RarityTier::RareSpecial, "slot {index}");
            }
        }
    }
}

#[test]
fn test_top_tier_can_still_win() {
    let case = tier_case();
    let table = RarityTable::from_weights([
        (RarityTier::MilSpec, 1.0),
        (RarityTier::Restricted, 1.0),
        (RarityTier::Classified, 1.0),
        (RarityTier::Covert, 1.0),
        (RarityTier::RareSpecial, 1000.0),
    ])
    .unwrap();
    let mut selector = OutcomeSelector::seeded(11);

    let wins = (0..100)
        .map(|_| selector.fill_reel(&case, &table, &ReelLayout::standard()).unwrap())
        .filter(|reel| reel.winning_item().rarity == RarityTier::RareSpecial)
        .count();
    assert!(wins > 90);
}

// ═══════════════════════════════════════════════════════════════════════════════
// REEL CONVERGENCE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_settles_from_far_within_bound() {
    let mut session =
        SpinSession::seeded(single_item_case(), RarityTable::standard(), far_config(20_000.0), 1)
            .unwrap();
    session.open().unwrap();

    let outcome = session.settle(DT, 2_000).unwrap();
    assert!(outcome.steps < 2_000);
    assert_eq!(session.state(), SessionState::Settled);

    let reel = session.animator().unwrap();
    assert!(reel.footprint_contains_target());
    assert!(reel.winning_center_x() >= -1e-6);
    assert!(reel.distance_to_target() <= 373.0 / 2.0 + 1e-6);

    // Offset 0 stops the line on the slot centre
    assert!((reel.positions()[0] + 373.0 / 2.0).abs() < 1e-6);
}

#[test]
fn test_nothing_changes_after_settle() {
    let mut session =
        SpinSession::seeded(single_item_case(), RarityTable::standard(), far_config(20_000.0), 1)
            .unwrap();
    session.open().unwrap();
    session.settle(DT, 2_000).unwrap();
    session.drain_events();

    let positions = session.animator().unwrap().positions().to_vec();
    for _ in 0..50 {
        assert!(session.step(DT).is_err());
    }
    assert_eq!(session.animator().unwrap().positions(), positions.as_slice());
    assert!(session.drain_events().is_empty());
    assert_eq!(session.stats().opens, 1);
}

#[test]
fn test_huge_dt_settles_without_overshoot() {
    let mut session =
        SpinSession::seeded(single_item_case(), RarityTable::standard(), far_config(20_000.0), 1)
            .unwrap();
    session.open().unwrap();

    let result = session.step(3_600.0).unwrap();
    assert!(result.settled);
    let reel = session.animator().unwrap();
    assert!(reel.footprint_contains_target());
    assert!(reel.winning_center_x() >= -1e-6);

    let (left, right) = reel.winning_span();
    assert!(left <= 1e-6 && right >= -1e-6);
}

#[test]
fn test_offset_range_bounds_stop_inside_winning_slot() {
    let layout = ReelLayout::standard();
    let (lo, hi) = SpinConfig::default().landing_offset_range;

    for offset in [lo, hi, -1.0, 1.0] {
        let config = SpinConfig::default().with_landing_offset(offset);
        let mut session =
            SpinSession::seeded(Arc::new(tier_case()), RarityTable::standard(), config, 3)
                .unwrap();
        session.open().unwrap();
        let outcome = session.settle(DT, 10_000).unwrap();
        assert_eq!(outcome.landing_offset, offset);

        let reel = session.animator().unwrap();
        let left = reel.positions()[layout.winning_slot];
        let line = layout.target_line_x;
        assert!(
            left - 1e-6 <= line && line <= left + layout.slot_width + 1e-6,
            "offset {offset}: slot starts at {left}"
        );
        let fraction = (line - left) / layout.slot_width;
        assert!((fraction - (1.0 + offset) / 2.0).abs() < 1e-9, "offset {offset}");
    }
}

#[test]
fn test_standard_reel_settles_on_winner() {
    let case = Arc::new(tier_case());
    let mut session =
        SpinSession::seeded(case, RarityTable::standard(), SpinConfig::default(), 99).unwrap();

    for _ in 0..5 {
        session.open().unwrap();
        let outcome = session.settle(DT, 10_000).unwrap();
        let reel = session.animator().unwrap();
        assert!(reel.footprint_contains_target());
        assert!(Arc::ptr_eq(&outcome.item, reel.assignment().winning_item()));

        let events = session.drain_events();
        let ticks = events
            .iter()
            .filter(|event| matches!(event.stage, Stage::ScrollTick { .. }))
            .count();
        assert!(ticks > 0);
        assert!(ticks <= ReelLayout::standard().slot_count);
    }
    assert_eq!(session.stats().opens, 5);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CANCELLATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_reopen_while_spinning_discards_first_spin() {
    let case = Arc::new(tier_case());
    let mut session =
        SpinSession::seeded(case, RarityTable::standard(), SpinConfig::default(), 5).unwrap();

    let first = session.open().unwrap();
    for _ in 0..120 {
        session.step(DT).unwrap();
    }
    assert!(session.pending_events() > 0);

    let second = session.open().unwrap();
    assert_ne!(first, second);
    session.settle(DT, 10_000).unwrap();

    let events = session.drain_events();
    assert!(events.iter().all(|event| event.spin_id == second));
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event.stage, Stage::SpinStart { .. }))
            .count(),
        1
    );
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event.stage, Stage::Reveal { .. }))
            .count(),
        1
    );
    assert_eq!(session.last_outcome().unwrap().spin_id, second);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_error_taxonomy() {
    let table = RarityTable::standard();
    let mut selector = OutcomeSelector::seeded(1);

    // Empty items
    assert_eq!(
        CaseDefinition::new("Empty", Vec::new()).unwrap_err(),
        ConfigError::EmptyItems
    );
    assert!(matches!(
        selector.select(&[], &table, &[]),
        Err(CfError::Configuration(ConfigError::EmptyItems))
    ));

    // Zero total weight
    let zero = RarityTable::from_weights([(RarityTier::MilSpec, 0.0)]).unwrap();
    assert!(matches!(
        SpinSession::seeded(single_item_case(), zero, SpinConfig::default(), 1),
        Err(CfError::Configuration(ConfigError::NonPositiveWeight(_)))
    ));

    // Missing tier
    let partial = RarityTable::from_weights([(RarityTier::MilSpec, 1.0)]).unwrap();
    assert!(matches!(
        SpinSession::seeded(Arc::new(tier_case()), partial, SpinConfig::default(), 1),
        Err(CfError::Configuration(ConfigError::MissingTier(_)))
    ));

    // Bad winning index
    let mut config = SpinConfig::default();
    config.layout.winning_slot = config.layout.slot_count;
    let err = SpinSession::seeded(single_item_case(), table.clone(), config, 1)
        .err()
        .unwrap();
    assert!(matches!(err, CfError::Index { .. }));
    assert!(err.is_configuration());

    // Invalid state
    let mut session =
        SpinSession::seeded(single_item_case(), table, SpinConfig::default(), 1).unwrap();
    let err = session.step(DT).unwrap_err();
    assert!(matches!(err, CfError::InvalidState { .. }));
    assert!(!err.is_configuration());
    assert_eq!(err.to_string(), "Cannot step while session is idle");
}
