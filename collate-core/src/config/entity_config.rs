use serde::{Deserialize, Serialize};

use super::defaults;

/// Entity normalization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    /// Path to the seed alias TOML file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_seed_path: Option<String>,
    /// Maximum per-token edit distance for fuzzy mention matching.
    pub max_edit_distance: usize,
    /// Jaro-Winkler floor for whole-name fuzzy matching.
    pub jaro_winkler_floor: f64,
    /// Capacity of the per-run mention resolution cache.
    pub mention_cache_capacity: u64,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            alias_seed_path: None,
            max_edit_distance: defaults::DEFAULT_MAX_EDIT_DISTANCE,
            jaro_winkler_floor: defaults::DEFAULT_JARO_WINKLER_FLOOR,
            mention_cache_capacity: defaults::DEFAULT_MENTION_CACHE_CAPACITY,
        }
    }
}
