//! # Engine Configuration
//!
//! One TOML document configures a whole engine instance. Every section and
//! every field is optional:
//!
//! ```toml
//! [world]
//! max_entities = 5000
//! diagnostics_interval_ms = 1000
//!
//! [frame]
//! target_fps = 60
//! max_delta_time = 0.1
//!
//! [physics]
//! epsilon = 0.01
//! bounce_offset = 0.01
//! sat_bias = 0.001
//! ```

use std::path::Path;
use std::time::Duration;

use lodestar_core::WorldConfig;
use lodestar_shared::constants::MAX_DELTA_TIME;
use lodestar_shared::{BOUNCE_OFFSET, COLLISION_EPSILON, SAT_BIAS, TARGET_FPS};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Frame pacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    /// Frame cap. Zero disables the cap.
    pub target_fps: u32,
    /// Longest delta time handed to systems, in seconds.
    pub max_delta_time: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            target_fps: TARGET_FPS,
            max_delta_time: MAX_DELTA_TIME,
        }
    }
}

impl FrameConfig {
    /// Minimum duration of one frame, or `None` when uncapped.
    #[must_use]
    pub fn frame_duration(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(self.target_fps)))
    }
}

/// Collision tolerances.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    /// Overlap tolerance; smaller velocity components count as stationary.
    pub epsilon: f32,
    /// Extra push past contact applied to bouncing bodies.
    pub bounce_offset: f32,
    /// Added to SAT penetration depth.
    pub sat_bias: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            epsilon: COLLISION_EPSILON,
            bounce_offset: BOUNCE_OFFSET,
            sat_bias: SAT_BIAS,
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// ECS sizing and diagnostics.
    pub world: WorldConfig,
    /// Frame pacing.
    pub frame: FrameConfig,
    /// Collision tolerances.
    pub physics: PhysicsConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] on malformed TOML or
    /// out-of-range values.
    pub fn from_toml_str(source: &str) -> EngineResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Io`] if the file cannot be read
    /// - [`EngineError::InvalidConfig`] if its content is invalid
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Io(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded engine configuration");
        Ok(config)
    }

    /// Checks value ranges in every section.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> EngineResult<()> {
        self.world.validate()?;

        if !(self.frame.max_delta_time.is_finite() && self.frame.max_delta_time > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "frame.max_delta_time must be positive, got {}",
                self.frame.max_delta_time
            )));
        }

        let physics = [
            ("physics.epsilon", self.physics.epsilon),
            ("physics.bounce_offset", self.physics.bounce_offset),
            ("physics.sat_bias", self.physics.sat_bias),
        ];
        for (name, value) in physics {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.physics.epsilon == 0.0 {
            return Err(EngineError::InvalidConfig(
                "physics.epsilon must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
