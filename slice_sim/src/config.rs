//! Tunable round constants.
//!
//! Every field has a default matching the shipped game; a JSON file only
//! needs the keys it wants to change.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::Millis;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path:   String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ════════════════════════════════════════════════════════════════════════════
// LaunchProfile
// ════════════════════════════════════════════════════════════════════════════

/// Launch kinematics and sizes for one class of screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaunchProfile {
    /// Horizontal velocity is drawn from `±vx_spread / 2` px/tick.
    pub vx_spread:        f32,
    /// Vertical launch velocity is `vy_base - U[0, vy_spread)` px/tick.
    pub vy_base:          f32,
    pub vy_spread:        f32,
    pub common_size_min:  f32,
    pub common_size_span: f32,
    pub bonus_size:       f32,
    pub hazard_size:      f32,
}

impl LaunchProfile {
    pub fn desktop() -> Self {
        LaunchProfile {
            vx_spread:        2.0,
            vy_base:          -8.0,
            vy_spread:        6.0,
            common_size_min:  70.0,
            common_size_span: 30.0,
            bonus_size:       80.0,
            hazard_size:      60.0,
        }
    }

    pub fn narrow() -> Self {
        LaunchProfile {
            vx_spread:        1.5,
            vy_base:          -6.0,
            vy_spread:        4.0,
            common_size_min:  50.0,
            common_size_span: 20.0,
            bonus_size:       60.0,
            hazard_size:      45.0,
        }
    }
}

impl Default for LaunchProfile {
    fn default() -> Self { Self::desktop() }
}

/// A partial profile from JSON. Missing keys keep the base profile's values.
#[derive(Debug, Deserialize)]
struct ProfileOverride {
    vx_spread:        Option<f32>,
    vy_base:          Option<f32>,
    vy_spread:        Option<f32>,
    common_size_min:  Option<f32>,
    common_size_span: Option<f32>,
    bonus_size:       Option<f32>,
    hazard_size:      Option<f32>,
}

impl ProfileOverride {
    fn onto(self, base: LaunchProfile) -> LaunchProfile {
        LaunchProfile {
            vx_spread:        self.vx_spread.unwrap_or(base.vx_spread),
            vy_base:          self.vy_base.unwrap_or(base.vy_base),
            vy_spread:        self.vy_spread.unwrap_or(base.vy_spread),
            common_size_min:  self.common_size_min.unwrap_or(base.common_size_min),
            common_size_span: self.common_size_span.unwrap_or(base.common_size_span),
            bonus_size:       self.bonus_size.unwrap_or(base.bonus_size),
            hazard_size:      self.hazard_size.unwrap_or(base.hazard_size),
        }
    }
}

fn desktop_profile<'de, D: Deserializer<'de>>(d: D) -> Result<LaunchProfile, D::Error> {
    ProfileOverride::deserialize(d).map(|o| o.onto(LaunchProfile::desktop()))
}

fn narrow_profile<'de, D: Deserializer<'de>>(d: D) -> Result<LaunchProfile, D::Error> {
    ProfileOverride::deserialize(d).map(|o| o.onto(LaunchProfile::narrow()))
}

// ════════════════════════════════════════════════════════════════════════════
// GameConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub round_duration_secs:  u32,
    /// Added to vertical velocity every tick (px/tick²).
    pub gravity:              f32,
    /// Spawn gate threshold is drawn from `[min, max)` ms on every check.
    pub spawn_interval_min_ms: Millis,
    pub spawn_interval_max_ms: Millis,
    pub bonus_cooldown_ms:    Millis,
    pub bonus_probability:    f64,
    pub hazard_probability:   f64,
    /// Applied once on a hazard hit, never multiplied by the combo.
    pub hazard_penalty:       i32,
    pub bonus_points:         u32,
    pub common_points:        u32,
    pub combo_decay_ms:       Millis,
    /// Extra reach added to an object's radius for blade contact.
    pub hit_margin:           f32,
    pub sliced_display_ms:    Millis,
    /// Unsliced objects below `height + offscreen_margin` are dropped.
    pub offscreen_margin:     f32,
    /// Spawn x is kept this far from both side edges.
    pub spawn_edge_margin:    f32,
    /// Objects start this far below the bottom edge.
    pub spawn_depth:          f32,
    /// Rotation rate is drawn from `±rotation_spread / 2` degrees/tick.
    pub rotation_spread:      f32,
    #[serde(deserialize_with = "desktop_profile")]
    pub desktop:              LaunchProfile,
    #[serde(deserialize_with = "narrow_profile")]
    pub narrow:               LaunchProfile,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            round_duration_secs:   60,
            gravity:               0.15,
            spawn_interval_min_ms: 1_000,
            spawn_interval_max_ms: 2_500,
            bonus_cooldown_ms:     10_000,
            bonus_probability:     0.2,
            hazard_probability:    0.15,
            hazard_penalty:        -25,
            bonus_points:          50,
            common_points:         10,
            combo_decay_ms:        3_000,
            hit_margin:            20.0,
            sliced_display_ms:     1_500,
            offscreen_margin:      100.0,
            spawn_edge_margin:     50.0,
            spawn_depth:           50.0,
            rotation_spread:       5.0,
            desktop:               LaunchProfile::desktop(),
            narrow:                LaunchProfile::narrow(),
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: GameConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.round_duration_secs == 0 {
            return invalid("round_duration_secs must be positive");
        }
        if self.spawn_interval_min_ms > self.spawn_interval_max_ms {
            return invalid("spawn_interval_min_ms exceeds spawn_interval_max_ms");
        }
        for (name, p) in [
            ("bonus_probability", self.bonus_probability),
            ("hazard_probability", self.hazard_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1]")));
            }
        }
        if self.hazard_penalty > 0 {
            return invalid("hazard_penalty must not be positive");
        }
        if self.hit_margin < 0.0 || self.offscreen_margin < 0.0 || self.spawn_edge_margin < 0.0 {
            return invalid("margins must not be negative");
        }
        Ok(())
    }

    /// Launch tuning for the current screen class.
    pub fn profile(&self, narrow: bool) -> &LaunchProfile {
        if narrow { &self.narrow } else { &self.desktop }
    }
}
