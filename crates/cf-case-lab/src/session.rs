//! Spin Session — One case opening from outcome draw to reveal

use std::collections::VecDeque;
use std::sync::Arc;

use cf_core::{
    CaseDefinition, CfError, CfResult, Condition, ConfigError, Item, RarityTable, RarityTier,
    WearValue, classify,
};
use cf_stage::{SoundCategory, Stage, StageEvent};

use crate::config::SpinConfig;
use crate::reel::{ReelAnimator, ReelPhase, StepResult};
use crate::selector::OutcomeSelector;
use crate::stats::DropStats;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Spinning,
    Settled,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Spinning => "spinning",
            Self::Settled => "settled",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a settled spin
#[derive(Debug, Clone)]
pub struct SpinOutcome {
    pub spin_id: u64,
    pub item: Arc<Item>,
    pub wear: WearValue,
    pub condition: Condition,
    pub tier: RarityTier,
    pub sound: SoundCategory,
    /// Where the line stopped inside the winning slot, -1 left edge to +1 right edge
    pub landing_offset: f64,
    /// Frames stepped before settling
    pub steps: usize,
    pub elapsed_ms: f64,
}

/// State of the spin currently on the reel
struct ActiveSpin {
    spin_id: u64,
    animator: ReelAnimator,
    wear: WearValue,
    elapsed_ms: f64,
}

/// Drives case openings for one case.
///
/// Single-threaded and frame-stepped: nothing moves unless the caller
/// invokes [`step`](Self::step). Stage events are queued and handed out by
/// [`drain_events`](Self::drain_events). Every spin gets a new id; events of
/// a spin cancelled by `open` or `close` are dropped from the queue.
pub struct SpinSession {
    case: Arc<CaseDefinition>,
    table: RarityTable,
    config: SpinConfig,
    selector: OutcomeSelector,
    state: SessionState,
    /// Last issued spin id
    generation: u64,
    active: Option<ActiveSpin>,
    events: VecDeque<StageEvent>,
    last_outcome: Option<SpinOutcome>,
    stats: DropStats,
}

impl SpinSession {
    /// Create a session with an OS-seeded selector.
    ///
    /// Validates everything a spin needs up front, so a bad case or table
    /// is reported here rather than on the first `open`.
    pub fn new(
        case: Arc<CaseDefinition>,
        table: RarityTable,
        config: SpinConfig,
    ) -> CfResult<Self> {
        Self::with_selector(case, table, config, OutcomeSelector::new())
    }

    /// Create a session with reproducible draws
    pub fn seeded(
        case: Arc<CaseDefinition>,
        table: RarityTable,
        config: SpinConfig,
        seed: u64,
    ) -> CfResult<Self> {
        Self::with_selector(case, table, config, OutcomeSelector::seeded(seed))
    }

    fn with_selector(
        case: Arc<CaseDefinition>,
        table: RarityTable,
        config: SpinConfig,
        selector: OutcomeSelector,
    ) -> CfResult<Self> {
        config.validate()?;
        check_drawable(&case, &table, config.layout.slot_count)?;

        Ok(Self {
            case,
            table,
            config,
            selector,
            state: SessionState::Idle,
            generation: 0,
            active: None,
            events: VecDeque::new(),
            last_outcome: None,
            stats: DropStats::default(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn case(&self) -> &CaseDefinition {
        &self.case
    }

    pub fn table(&self) -> &RarityTable {
        &self.table
    }

    pub fn config(&self) -> &SpinConfig {
        &self.config
    }

    /// Id of the spin on the reel (running or settled)
    pub fn spin_id(&self) -> Option<u64> {
        self.active.as_ref().map(|spin| spin.spin_id)
    }

    /// Reel of the spin on the reel, for rendering
    pub fn animator(&self) -> Option<&ReelAnimator> {
        self.active.as_ref().map(|spin| &spin.animator)
    }

    /// Most recent settled outcome
    pub fn last_outcome(&self) -> Option<&SpinOutcome> {
        self.last_outcome.as_ref()
    }

    /// Drops of every settled spin in this session
    pub fn stats(&self) -> &DropStats {
        &self.stats
    }

    /// Selector fallbacks so far (diagnostic)
    pub fn fallback_count(&self) -> u64 {
        self.selector.fallback_count()
    }

    /// Number of queued events
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Reseed the selector
    pub fn seed(&mut self, seed: u64) {
        self.selector.seed(seed);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start a new spin and return its id.
    ///
    /// A running spin is cancelled first. The outcome, wear value and
    /// landing offset are all drawn here, before the first frame. On error
    /// the session is left idle.
    pub fn open(&mut self) -> CfResult<u64> {
        if self.state == SessionState::Spinning {
            self.cancel();
        }
        self.active = None;
        self.state = SessionState::Idle;

        let layout = &self.config.layout;
        let assignment = self.selector.fill_reel(&self.case, &self.table, layout)?;
        let wear = self.selector.roll_wear();
        let landing_offset = self
            .selector
            .roll_landing_offset(self.config.landing_offset_range);
        let animator =
            ReelAnimator::new(assignment, layout, &self.config.physics, landing_offset)?;

        self.generation += 1;
        let spin_id = self.generation;

        log::info!(
            "Spin {} started: '{}' on slot {} of {}",
            spin_id,
            animator.assignment().winning_item().display_name(),
            layout.winning_slot,
            layout.slot_count
        );

        self.events.push_back(StageEvent::new(
            Stage::SpinStart {
                slot_count: layout.slot_count,
                winning_slot: layout.winning_slot,
            },
            spin_id,
            0.0,
        ));
        if animator.phase() == ReelPhase::Slowing {
            self.events
                .push_back(StageEvent::new(Stage::ReelSlowing, spin_id, 0.0));
        }

        self.active = Some(ActiveSpin {
            spin_id,
            animator,
            wear,
            elapsed_ms: 0.0,
        });
        self.state = SessionState::Spinning;
        Ok(spin_id)
    }

    /// Advance the running spin by `dt` seconds.
    ///
    /// Fails with `InvalidState` unless a spin is running; the session is
    /// not touched in that case.
    pub fn step(&mut self, dt: f64) -> CfResult<StepResult> {
        let spin = match (self.state, self.active.as_mut()) {
            (SessionState::Spinning, Some(spin)) => spin,
            _ => {
                return Err(CfError::InvalidState {
                    operation: "step",
                    state: self.state.name(),
                });
            }
        };

        let was_cruising = spin.animator.phase() == ReelPhase::Cruising;
        let result = spin.animator.step(dt);
        if dt.is_finite() && dt > 0.0 {
            spin.elapsed_ms += dt * 1000.0;
        }

        for &slot_index in &result.ticks {
            self.events.push_back(StageEvent::new(
                Stage::ScrollTick { slot_index },
                spin.spin_id,
                spin.elapsed_ms,
            ));
        }
        if was_cruising && spin.animator.phase() != ReelPhase::Cruising {
            self.events.push_back(StageEvent::new(
                Stage::ReelSlowing,
                spin.spin_id,
                spin.elapsed_ms,
            ));
        }

        if result.settled {
            self.finish();
        }
        Ok(result)
    }

    /// Step with a fixed `dt` until the reel settles.
    ///
    /// Fails with `StepLimit` if it has not settled after `max_steps`
    /// frames; the spin is left running.
    pub fn settle(&mut self, dt: f64, max_steps: usize) -> CfResult<SpinOutcome> {
        if self.state != SessionState::Spinning {
            return Err(CfError::InvalidState {
                operation: "settle",
                state: self.state.name(),
            });
        }
        for _ in 0..max_steps {
            if self.step(dt)?.settled {
                break;
            }
        }
        match (self.state, self.last_outcome.as_ref()) {
            (SessionState::Settled, Some(outcome)) => Ok(outcome.clone()),
            _ => Err(CfError::StepLimit { steps: max_steps }),
        }
    }

    /// Return to idle. A running spin is cancelled; from idle this is a no-op.
    ///
    /// Case and key data are never touched.
    pub fn close(&mut self) {
        match self.state {
            SessionState::Spinning => self.cancel(),
            SessionState::Settled => {}
            SessionState::Idle => return,
        }
        self.active = None;
        self.state = SessionState::Idle;
    }

    /// Hand all queued events to the caller, oldest first
    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        self.events.drain(..).collect()
    }

    /// Drop the running spin and every event it queued
    fn cancel(&mut self) {
        if let Some(spin) = self.active.take() {
            let before = self.events.len();
            self.events.retain(|event| event.spin_id != spin.spin_id);
            log::info!(
                "Spin {} cancelled after {:.1}ms ({} queued events dropped)",
                spin.spin_id,
                spin.elapsed_ms,
                before - self.events.len()
            );
        }
        self.state = SessionState::Idle;
    }

    fn finish(&mut self) {
        let Some(spin) = self.active.as_ref() else {
            return;
        };

        let item = Arc::clone(spin.animator.assignment().winning_item());
        let condition = classify(spin.wear.value());
        let tier = item.rarity;
        let sound = SoundCategory::for_tier(tier);
        let outcome = SpinOutcome {
            spin_id: spin.spin_id,
            item: Arc::clone(&item),
            wear: spin.wear,
            condition,
            tier,
            sound,
            landing_offset: spin.animator.landing_offset(),
            steps: spin.animator.steps(),
            elapsed_ms: spin.elapsed_ms,
        };

        self.events.push_back(StageEvent::new(
            Stage::ReelSettled {
                steps: outcome.steps,
            },
            outcome.spin_id,
            outcome.elapsed_ms,
        ));
        self.events.push_back(StageEvent::new(
            Stage::Reveal {
                item: (*item).clone(),
                wear: outcome.wear.value(),
                condition,
                tier,
                sound,
            },
            outcome.spin_id,
            outcome.elapsed_ms,
        ));

        log::info!(
            "Spin {} settled after {} steps: {} ({}, wear {:.6})",
            outcome.spin_id,
            outcome.steps,
            item.display_name(),
            condition,
            outcome.wear.value()
        );

        self.stats.record(tier, outcome.wear);
        self.stats.fallbacks = self.selector.fallback_count();
        self.last_outcome = Some(outcome);
        self.state = SessionState::Settled;
    }
}

/// Check that both the winning draw and the filler draws can succeed
fn check_drawable(case: &CaseDefinition, table: &RarityTable, slot_count: usize) -> CfResult<()> {
    let reserved = table.top_tier();
    let mut total = 0.0;
    let mut filler_total = 0.0;
    for item in case.items() {
        let weight = table
            .weight(item.rarity)
            .ok_or(ConfigError::MissingTier(item.rarity))?;
        total += weight;
        if Some(item.rarity) != reserved {
            filler_total += weight;
        }
    }

    if !total.is_finite() || total <= 0.0 {
        return Err(ConfigError::NonPositiveWeight(total).into());
    }
    if slot_count > 1 && filler_total <= 0.0 {
        return Err(ConfigError::NonPositiveWeight(filler_total).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn test_case() -> Arc<CaseDefinition> {
        Arc::new(
            CaseDefinition::new(
                "Test Case",
                vec![
                    Item::new("Glock-18", "Candy Apple", RarityTier::MilSpec),
                    Item::new("MP7", "Nemesis", RarityTier::Restricted),
                    Item::new("M4A1-S", "Hyper Beast", RarityTier::Covert),
                    Item::new("Karambit", "Doppler", RarityTier::RareSpecial),
                ],
            )
            .unwrap(),
        )
    }

    fn session(seed: u64) -> SpinSession {
        SpinSession::seeded(
            test_case(),
            RarityTable::standard(),
            SpinConfig::default(),
            seed,
        )
        .unwrap()
    }

    #[test]
    fn test_full_lifecycle() {
        let mut session = session(1);
        assert_eq!(session.state(), SessionState::Idle);

        let spin_id = session.open().unwrap();
        assert_eq!(session.state(), SessionState::Spinning);

        let outcome = session.settle(DT, 10_000).unwrap();
        assert_eq!(session.state(), SessionState::Settled);
        assert_eq!(outcome.spin_id, spin_id);
        assert_eq!(outcome.condition, classify(outcome.wear.value()));
        assert_eq!(outcome.sound, SoundCategory::for_tier(outcome.tier));

        let events = session.drain_events();
        assert_eq!(events.first().unwrap().type_name(), "spin_start");
        let n = events.len();
        assert_eq!(events[n - 2].type_name(), "reel_settled");
        match &events[n - 1].stage {
            Stage::Reveal { item, tier, .. } => {
                assert_eq!(item, outcome.item.as_ref());
                assert_eq!(*tier, outcome.tier);
            }
            other => panic!("expected reveal, got {other:?}"),
        }
        assert!(events.iter().all(|event| event.spin_id == spin_id));
        assert_eq!(
            events
                .iter()
                .filter(|event| event.type_name() == "reel_slowing")
                .count(),
            1
        );

        session.close();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.stats().opens, 1);
    }

    #[test]
    fn test_timestamps_are_monotonic() {
        let mut session = session(2);
        session.open().unwrap();
        session.settle(DT, 10_000).unwrap();
        let events = session.drain_events();
        for pair in events.windows(2) {
            assert!(pair[0].timestamp_ms <= pair[1].timestamp_ms);
        }
        let outcome = session.last_outcome().unwrap();
        assert!((outcome.elapsed_ms - outcome.steps as f64 * DT * 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_step_requires_spinning() {
        let mut session = session(3);
        let err = session.step(DT).unwrap_err();
        assert!(matches!(
            err,
            CfError::InvalidState {
                operation: "step",
                state: "idle"
            }
        ));
        assert_eq!(session.state(), SessionState::Idle);

        session.open().unwrap();
        session.settle(DT, 10_000).unwrap();
        let pending = session.pending_events();
        assert!(matches!(
            session.step(DT),
            Err(CfError::InvalidState {
                state: "settled",
                ..
            })
        ));
        assert_eq!(session.pending_events(), pending);
        assert_eq!(session.state(), SessionState::Settled);
    }

    #[test]
    fn test_reopen_discards_cancelled_events() {
        let mut session = session(4);
        let first = session.open().unwrap();
        for _ in 0..30 {
            session.step(DT).unwrap();
        }
        let second = session.open().unwrap();
        assert!(second > first);

        session.settle(DT, 10_000).unwrap();
        let events = session.drain_events();
        assert!(!events.is_empty());
        assert!(events.iter().all(|event| event.spin_id == second));
        assert_eq!(session.stats().opens, 1);
    }

    #[test]
    fn test_close_cancels_running_spin() {
        let mut session = session(5);
        session.open().unwrap();
        session.step(DT).unwrap();
        session.close();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.pending_events(), 0);
        assert!(session.spin_id().is_none());
        assert!(session.last_outcome().is_none());

        // Closing an idle session is a no-op
        session.close();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_reopen_after_settle_keeps_previous_events() {
        let mut session = session(6);
        let first = session.open().unwrap();
        session.settle(DT, 10_000).unwrap();
        let second = session.open().unwrap();

        let events = session.drain_events();
        assert!(events.iter().any(|event| event.spin_id == first));
        assert_eq!(events.last().unwrap().spin_id, second);
    }

    #[test]
    fn test_settle_step_limit() {
        let mut session = session(7);
        session.open().unwrap();
        assert!(matches!(
            session.settle(DT, 3),
            Err(CfError::StepLimit { steps: 3 })
        ));
        assert_eq!(session.state(), SessionState::Spinning);
        assert!(session.settle(DT, 10_000).is_ok());
    }

    #[test]
    fn test_seeded_sessions_repeat() {
        let mut a = session(42);
        let mut b = session(42);
        for _ in 0..5 {
            a.open().unwrap();
            b.open().unwrap();
            let x = a.settle(DT, 10_000).unwrap();
            let y = b.settle(DT, 10_000).unwrap();
            assert_eq!(x.item, y.item);
            assert_eq!(x.wear, y.wear);
            assert_eq!(x.steps, y.steps);
        }
    }

    #[test]
    fn test_new_rejects_missing_tier() {
        let table = RarityTable::from_weights([
            (RarityTier::MilSpec, 80.0),
            (RarityTier::Restricted, 20.0),
        ])
        .unwrap();
        let err = SpinSession::seeded(test_case(), table, SpinConfig::default(), 1)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            CfError::Configuration(ConfigError::MissingTier(RarityTier::Covert))
        ));
    }

    #[test]
    fn test_new_rejects_top_tier_only_case() {
        let case = Arc::new(
            CaseDefinition::new(
                "Gold only",
                vec![Item::new("Karambit", "Fade", RarityTier::RareSpecial)],
            )
            .unwrap(),
        );
        let err = SpinSession::seeded(case, RarityTable::standard(), SpinConfig::default(), 1)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            CfError::Configuration(ConfigError::NonPositiveWeight(_))
        ));
    }

    #[test]
    fn test_new_rejects_overflowing_weights() {
        let case = Arc::new(
            CaseDefinition::new(
                "Overflow",
                vec![
                    Item::new("P250", "Sand Dune", RarityTier::MilSpec),
                    Item::new("Tec-9", "Isaac", RarityTier::Restricted),
                ],
            )
            .unwrap(),
        );
        let table = RarityTable::from_weights([
            (RarityTier::MilSpec, 1e308),
            (RarityTier::Restricted, 1e308),
        ])
        .unwrap();
        let err = SpinSession::seeded(case, table, SpinConfig::default(), 1)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            CfError::Configuration(ConfigError::NonPositiveWeight(_))
        ));
    }

    #[test]
    fn test_default_spins_stop_inside_winning_slot() {
        let mut session = session(8);
        for _ in 0..300 {
            session.open().unwrap();
            session.settle(DT, 10_000).unwrap();
            let reel = session.animator().unwrap();
            let (left, right) = reel.winning_span();
            let line = SpinConfig::default().layout.target_line_x;
            assert!(
                left - 1e-6 <= line && line <= right + 1e-6,
                "offset {}: slot [{left}, {right}]",
                reel.landing_offset()
            );
            session.drain_events();
        }
    }

    #[test]
    fn test_new_rejects_bad_winning_slot() {
        let mut config = SpinConfig::default();
        config.layout.winning_slot = 60;
        let err = SpinSession::seeded(test_case(), RarityTable::standard(), config, 1)
            .err()
            .unwrap();
        assert!(matches!(err, CfError::Index { index: 60, len: 50 }));
    }
}
