//! Reel animator — frame-stepped convergence onto a fixed outcome
//!
//! The reel is a single rigid strip moving toward negative X. Every frame
//! the caller supplies `dt`; the animator moves the strip, applies the
//! ease-out speed law and tests whether the win line has entered the
//! footprint around the aim point.
//!
//! The aim point sits half a slot width behind the landing point, so the
//! footprint's leading edge is the landing point itself. The landing
//! offset picks that point inside the winning slot: -1 is its left edge,
//! 0 its centre, +1 its right edge.
//!
//! ```text
//!            win line
//!               │
//!   ◄── travel  │         landing point
//!               │              ▼ ┌──── footprint ────┐
//!               │              │ │         ● aim     │
//!   [slot][slot]│[slot][ WINNING ][slot][slot]
//! ```

use serde::{Deserialize, Serialize};

use cf_core::{CfError, CfResult, ConfigError};

use crate::config::{ReelLayout, ReelPhysics};
use crate::selector::SlotAssignment;

/// Sign of the reel's travel along X
const TRAVEL_DIRECTION: f64 = -1.0;

/// Slack for float rounding when the reel lands exactly on the footprint edge
const SETTLE_EPSILON: f64 = 1e-9;

/// Animation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReelPhase {
    /// Full speed, outside the slowdown zone
    Cruising,
    /// Inside the slowdown zone, easing toward the minimum speed
    Slowing,
    /// Win line inside the winning footprint. Terminal.
    Settled,
}

/// Result of one animation frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    /// Reel has stopped on the outcome
    pub settled: bool,
    /// Slots whose centre crossed the win line this frame, in slot order
    pub ticks: Vec<usize>,
}

/// Frame-stepped reel state machine for one spin
#[derive(Debug, Clone)]
pub struct ReelAnimator {
    assignment: SlotAssignment,
    /// Left edge of every slot
    positions: Vec<f64>,
    /// One-shot "crossed the win line" latch per slot
    crossed: Vec<bool>,
    speed: f64,
    phase: ReelPhase,
    physics: ReelPhysics,
    slot_width: f64,
    target_line_x: f64,
    landing_offset: f64,
    steps: usize,
}

impl ReelAnimator {
    /// Create an animator with every slot at its initial layout position.
    ///
    /// Fails if the assignment does not match the layout, if the winning
    /// index is out of range, if the landing offset is outside [-1, 1], or
    /// if the landing point already lies past the win line (the reel could
    /// never stop there).
    pub fn new(
        assignment: SlotAssignment,
        layout: &ReelLayout,
        physics: &ReelPhysics,
        landing_offset: f64,
    ) -> CfResult<Self> {
        layout.validate()?;
        physics.validate()?;

        if assignment.len() != layout.slot_count {
            return Err(ConfigError::InvalidParam(format!(
                "slot assignment has {} slots, layout expects {}",
                assignment.len(),
                layout.slot_count
            ))
            .into());
        }
        if assignment.winning_index() != layout.winning_slot {
            return Err(CfError::Index {
                index: assignment.winning_index(),
                len: layout.slot_count,
            });
        }
        if !(-1.0..=1.0).contains(&landing_offset) {
            return Err(CfError::invalid_param(format!(
                "landing offset {landing_offset} outside [-1, 1]"
            )));
        }

        let positions = layout.initial_positions();
        let half = layout.slot_width / 2.0;
        let crossed = positions
            .iter()
            .map(|left| left + half <= layout.target_line_x)
            .collect();

        let mut animator = Self {
            assignment,
            positions,
            crossed,
            speed: physics.initial_speed,
            phase: ReelPhase::Cruising,
            physics: physics.clone(),
            slot_width: layout.slot_width,
            target_line_x: layout.target_line_x,
            landing_offset,
            steps: 0,
        };

        if animator.landing_x() < animator.target_line_x - SETTLE_EPSILON {
            return Err(CfError::invalid_param(format!(
                "winning slot starts {:.1} units past the win line and can never settle",
                animator.target_line_x - animator.landing_x()
            )));
        }

        animator.speed = physics.speed_at(animator.distance_to_target());
        if animator.distance_to_target() <= physics.slowdown_distance {
            animator.phase = ReelPhase::Slowing;
        }

        Ok(animator)
    }

    /// Advance one frame.
    ///
    /// Once settled, further calls are no-ops that report `settled` and no ticks.
    pub fn step(&mut self, dt: f64) -> StepResult {
        if self.phase == ReelPhase::Settled {
            return StepResult {
                settled: true,
                ticks: Vec::new(),
            };
        }

        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            log::debug!("Ignoring invalid frame delta {}", dt);
            0.0
        };
        self.steps += 1;

        // Never carry the landing point past the line, however large dt gets
        let remaining = (self.landing_x() - self.target_line_x).max(0.0);
        let travel = (self.speed * dt).min(remaining);
        for position in &mut self.positions {
            *position += TRAVEL_DIRECTION * travel;
        }

        let ticks = self.latch_crossings();

        let distance = self.distance_to_target();
        self.speed = self.physics.speed_at(distance);
        if distance <= self.physics.slowdown_distance {
            self.phase = ReelPhase::Slowing;
        }

        if self.footprint_contains_target() {
            self.phase = ReelPhase::Settled;
            log::trace!(
                "Reel settled after {} steps, line {:.2} units from aim point",
                self.steps,
                distance
            );
        }

        StepResult {
            settled: self.phase == ReelPhase::Settled,
            ticks,
        }
    }

    fn latch_crossings(&mut self) -> Vec<usize> {
        let half = self.slot_width / 2.0;
        let mut ticks = Vec::new();
        for (index, (left, crossed)) in self
            .positions
            .iter()
            .zip(self.crossed.iter_mut())
            .enumerate()
        {
            if !*crossed && left + half <= self.target_line_x {
                *crossed = true;
                ticks.push(index);
            }
        }
        ticks
    }

    /// X of the aim point: half a slot width behind the landing point
    pub fn winning_center_x(&self) -> f64 {
        self.landing_x() - TRAVEL_DIRECTION * self.slot_width / 2.0
    }

    /// X of the point inside the winning slot where the win line stops
    pub fn landing_x(&self) -> f64 {
        let left = self.positions[self.assignment.winning_index()];
        left + self.slot_width / 2.0 * (1.0 + self.landing_offset)
    }

    /// Left and right edge of the winning slot
    pub fn winning_span(&self) -> (f64, f64) {
        let left = self.positions[self.assignment.winning_index()];
        (left, left + self.slot_width)
    }

    /// |target line - aim point|
    pub fn distance_to_target(&self) -> f64 {
        (self.target_line_x - self.winning_center_x()).abs()
    }

    /// Is the win line inside `[aim - w/2, aim + w/2]`?
    pub fn footprint_contains_target(&self) -> bool {
        let center = self.winning_center_x();
        let half = self.slot_width / 2.0;
        (center - half - SETTLE_EPSILON..=center + half).contains(&self.target_line_x)
    }

    pub fn phase(&self) -> ReelPhase {
        self.phase
    }

    pub fn is_settled(&self) -> bool {
        self.phase == ReelPhase::Settled
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Frames stepped so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn landing_offset(&self) -> f64 {
        self.landing_offset
    }

    pub fn assignment(&self) -> &SlotAssignment {
        &self.assignment
    }
}
