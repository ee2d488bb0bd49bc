//! # World Configuration
//!
//! Sizing and diagnostics knobs for a [`World`](crate::World), loaded once at
//! startup. Every field has a default, so an empty TOML table is valid.
//!
//! ```toml
//! max_entities = 5000
//! diagnostics_interval_ms = 1000
//! ```

use std::time::Duration;

use lodestar_shared::constants::ENTITY_ID_LIMIT;
use lodestar_shared::{DIAGNOSTICS_INTERVAL_MS, MAX_ENTITIES};
use serde::{Deserialize, Serialize};

use crate::error::{EcsError, EcsResult};

/// Configuration of the ECS core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Maximum number of concurrently live entities (1..=65536).
    pub max_entities: usize,
    /// Interval between per-system runtime reports, in milliseconds.
    pub diagnostics_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: MAX_ENTITIES,
            diagnostics_interval_ms: DIAGNOSTICS_INTERVAL_MS,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] on malformed TOML or out-of-range
    /// values.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_entities == 0 || self.max_entities > ENTITY_ID_LIMIT {
            return Err(EcsError::InvalidConfig(format!(
                "max_entities must be in 1..={ENTITY_ID_LIMIT}, got {}",
                self.max_entities
            )));
        }
        Ok(())
    }

    /// Reporting interval as a [`Duration`].
    #[must_use]
    pub fn diagnostics_interval(&self) -> Duration {
        Duration::from_millis(self.diagnostics_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = WorldConfig::from_toml_str("").unwrap();
        assert_eq!(config, WorldConfig::default());
        assert_eq!(config.max_entities, 5000);
    }

    #[test]
    fn test_override() {
        let config = WorldConfig::from_toml_str("max_entities = 64\n").unwrap();
        assert_eq!(config.max_entities, 64);
        assert_eq!(config.diagnostics_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            WorldConfig::from_toml_str("max_entities = 0"),
            Err(EcsError::InvalidConfig(_))
        ));
        assert!(WorldConfig::from_toml_str("max_entities = 70000").is_err());
    }

    #[test]
    fn test_rejects_unknown_field() {
        assert!(WorldConfig::from_toml_str("max_entites = 10").is_err());
    }
}
