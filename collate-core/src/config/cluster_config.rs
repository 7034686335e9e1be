use serde::{Deserialize, Serialize};

use super::defaults;
use crate::constants;

/// Duplicate clustering and canonical selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Estimated-Jaccard threshold for fuzzy duplicate merging.
    pub similarity_threshold: f64,
    /// Collection priority for canonical selection, best first.
    /// Collections absent from the list rank below every listed one.
    pub collection_priority: Vec<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: defaults::DEFAULT_SIMILARITY_THRESHOLD,
            collection_priority: constants::DEFAULT_COLLECTION_PRIORITY
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
