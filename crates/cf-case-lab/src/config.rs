//! Reel layout, physics and spin configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use cf_core::{CfError, CfResult};

/// Physics profile for the reel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinProfile {
    /// Normal opening
    Standard,
    /// Fast opening
    Turbo,
    /// Short, snappy reel with a tight slowdown zone
    Classic,
    /// Hand-tuned physics
    Custom,
}

impl Default for SpinProfile {
    fn default() -> Self {
        Self::Standard
    }
}

/// Geometry of the reel, in screen units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelLayout {
    /// Number of slots on the reel
    pub slot_count: usize,
    /// Index of the slot that carries the outcome
    pub winning_slot: usize,
    /// Visual width of one slot
    pub slot_width: f64,
    /// Distance between the left edges of neighbouring slots
    pub spacing: f64,
    /// Left edge of slot 0 when the spin starts
    pub start_x: f64,
    /// X of the fixed win line
    pub target_line_x: f64,
}

impl ReelLayout {
    /// 50 slots, the outcome five from the end
    pub fn standard() -> Self {
        Self {
            slot_count: 50,
            winning_slot: 45,
            slot_width: 373.0,
            spacing: 373.0,
            start_x: -800.0,
            target_line_x: 0.0,
        }
    }

    /// Narrow 30-unit showcases packed edge to edge, paired with
    /// [`ReelPhysics::classic`]
    pub fn classic() -> Self {
        Self {
            slot_width: 30.0,
            spacing: 30.0,
            ..Self::standard()
        }
    }

    /// Winning slot placed five from the end of a reel of `slot_count`
    pub fn with_slot_count(mut self, slot_count: usize) -> Self {
        self.slot_count = slot_count;
        self.winning_slot = slot_count.saturating_sub(5);
        self
    }

    /// Left edge of a slot in the initial layout
    pub fn initial_left(&self, index: usize) -> f64 {
        self.start_x + index as f64 * self.spacing
    }

    /// Initial left edges of all slots
    pub fn initial_positions(&self) -> Vec<f64> {
        (0..self.slot_count).map(|i| self.initial_left(i)).collect()
    }

    /// Validate geometry
    pub fn validate(&self) -> CfResult<()> {
        if self.slot_count == 0 {
            return Err(CfError::invalid_param("reel needs at least one slot"));
        }
        if self.winning_slot >= self.slot_count {
            return Err(CfError::Index {
                index: self.winning_slot,
                len: self.slot_count,
            });
        }
        if !(self.slot_width.is_finite() && self.slot_width > 0.0) {
            return Err(CfError::invalid_param(format!(
                "slot width must be positive, got {}",
                self.slot_width
            )));
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(CfError::invalid_param(format!(
                "slot spacing must be positive, got {}",
                self.spacing
            )));
        }
        if !self.start_x.is_finite() || !self.target_line_x.is_finite() {
            return Err(CfError::invalid_param("reel coordinates must be finite"));
        }
        Ok(())
    }
}

impl Default for ReelLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Speed law parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelPhysics {
    /// Cruise speed (units per second)
    pub initial_speed: f64,
    /// Speed floor reached at the target
    pub minimum_speed: f64,
    /// Distance from the target where slowdown begins
    pub slowdown_distance: f64,
}

impl ReelPhysics {
    pub fn standard() -> Self {
        Self {
            initial_speed: 5000.0,
            minimum_speed: 200.0,
            slowdown_distance: 6000.0,
        }
    }

    pub fn turbo() -> Self {
        Self {
            initial_speed: 9000.0,
            minimum_speed: 400.0,
            slowdown_distance: 4000.0,
        }
    }

    pub fn classic() -> Self {
        Self {
            initial_speed: 3000.0,
            minimum_speed: 200.0,
            slowdown_distance: 500.0,
        }
    }

    /// Get physics for profile
    pub fn from_profile(profile: SpinProfile) -> Self {
        match profile {
            SpinProfile::Standard => Self::standard(),
            SpinProfile::Turbo => Self::turbo(),
            SpinProfile::Classic => Self::classic(),
            SpinProfile::Custom => Self::standard(),
        }
    }

    /// Scale both speeds by factor (> 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            initial_speed: self.initial_speed * factor,
            minimum_speed: self.minimum_speed * factor,
            slowdown_distance: self.slowdown_distance,
        }
    }

    /// Speed for a given distance to the target
    pub fn speed_at(&self, distance: f64) -> f64 {
        if distance <= self.slowdown_distance {
            let t = (distance / self.slowdown_distance).clamp(0.0, 1.0);
            self.minimum_speed + (self.initial_speed - self.minimum_speed) * t
        } else {
            self.initial_speed
        }
    }

    /// Validate: `initial_speed >= minimum_speed > 0`, `slowdown_distance > 0`
    pub fn validate(&self) -> CfResult<()> {
        if !(self.minimum_speed.is_finite() && self.minimum_speed > 0.0) {
            return Err(CfError::invalid_param(format!(
                "minimum speed must be positive, got {}",
                self.minimum_speed
            )));
        }
        if !(self.initial_speed.is_finite() && self.initial_speed >= self.minimum_speed) {
            return Err(CfError::invalid_param(format!(
                "initial speed {} must be at least the minimum speed {}",
                self.initial_speed, self.minimum_speed
            )));
        }
        if !(self.slowdown_distance.is_finite() && self.slowdown_distance > 0.0) {
            return Err(CfError::invalid_param(format!(
                "slowdown distance must be positive, got {}",
                self.slowdown_distance
            )));
        }
        Ok(())
    }
}

impl Default for ReelPhysics {
    fn default() -> Self {
        Self::standard()
    }
}

/// Complete spin configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinConfig {
    #[serde(default)]
    pub profile: SpinProfile,
    #[serde(default)]
    pub layout: ReelLayout,
    #[serde(default)]
    pub physics: ReelPhysics,
    /// Landing offset bounds: where the line stops inside the winning
    /// slot, -1 at its left edge and +1 at its right edge
    #[serde(default = "default_landing_offset_range")]
    pub landing_offset_range: (f64, f64),
}

fn default_landing_offset_range() -> (f64, f64) {
    (-0.75, 0.15)
}

impl SpinConfig {
    /// Config for a physics profile with the standard layout
    pub fn from_profile(profile: SpinProfile) -> Self {
        let layout = match profile {
            SpinProfile::Classic => ReelLayout::classic(),
            _ => ReelLayout::standard(),
        };
        Self {
            profile,
            layout,
            physics: ReelPhysics::from_profile(profile),
            ..Self::default()
        }
    }

    /// Replace the physics, marking the profile custom
    pub fn with_physics(mut self, physics: ReelPhysics) -> Self {
        self.profile = SpinProfile::Custom;
        self.physics = physics;
        self
    }

    pub fn with_layout(mut self, layout: ReelLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Fixed landing offset (both bounds equal)
    pub fn with_landing_offset(mut self, offset: f64) -> Self {
        self.landing_offset_range = (offset, offset);
        self
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> CfResult<()> {
        self.layout.validate()?;
        self.physics.validate()?;

        let (lo, hi) = self.landing_offset_range;
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(CfError::invalid_param(format!(
                "invalid landing offset range [{lo}, {hi}]"
            )));
        }
        if lo < -1.0 || hi > 1.0 {
            return Err(CfError::invalid_param(format!(
                "landing offset range [{lo}, {hi}] reaches outside the winning slot"
            )));
        }

        // Leftmost landing point is at the lower offset bound
        let layout = &self.layout;
        let landing =
            layout.initial_left(layout.winning_slot) + layout.slot_width / 2.0 * (1.0 + lo);
        if landing < layout.target_line_x {
            return Err(CfError::invalid_param(format!(
                "winning slot {} starts past the win line",
                layout.winning_slot
            )));
        }
        Ok(())
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> CfResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CfError::Parse(format!("Invalid spin config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from YAML
    pub fn from_yaml(yaml: &str) -> CfResult<Self> {
        let config: Self = serde_yml::from_str(yaml)
            .map_err(|e| CfError::Parse(format!("Invalid spin config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> CfResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&text),
            _ => Self::from_json(&text),
        }
    }

    /// Export as pretty JSON
    pub fn to_json(&self) -> CfResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CfError::Parse(e.to_string()))
    }
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            profile: SpinProfile::Standard,
            layout: ReelLayout::standard(),
            physics: ReelPhysics::standard(),
            landing_offset_range: default_landing_offset_range(),
        }
    }
}
