//! Configuration for the collate pipeline.
//! TOML-backed, every section and field optional with defaults.

pub mod cluster_config;
pub mod corpus_config;
pub mod defaults;
pub mod entity_config;
pub mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use cluster_config::ClusterConfig;
pub use corpus_config::{CollectionSource, CorpusConfig};
pub use entity_config::EntityConfig;
pub use storage_config::StorageConfig;

use crate::errors::{CollateResult, ConfigError};

/// Root configuration object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollateConfig {
    pub corpus: CorpusConfig,
    pub cluster: ClusterConfig,
    pub entities: EntityConfig,
    pub storage: StorageConfig,
}

impl CollateConfig {
    /// Parse a TOML document. Missing sections and fields fall back to
    /// defaults.
    pub fn from_toml(raw: &str) -> CollateResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::ParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a config file.
    pub fn from_file(path: &Path) -> CollateResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CollateResult<()> {
        if !(0.0..=1.0).contains(&self.cluster.similarity_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "cluster.similarity_threshold".to_string(),
                message: format!(
                    "{} is outside [0.0, 1.0]",
                    self.cluster.similarity_threshold
                ),
            }
            .into());
        }
        if !(0.0..=1.0).contains(&self.entities.jaro_winkler_floor) {
            return Err(ConfigError::InvalidValue {
                field: "entities.jaro_winkler_floor".to_string(),
                message: format!("{} is outside [0.0, 1.0]", self.entities.jaro_winkler_floor),
            }
            .into());
        }
        Ok(())
    }
}
