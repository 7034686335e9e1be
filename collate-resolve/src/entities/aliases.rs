//! Alias snapshots and the correction log.
//!
//! A snapshot is immutable for the duration of a run: every mention in
//! a batch resolves against the same table, so outcomes cannot depend
//! on processing order. Operator corrections append to a log and are
//! folded into the next snapshot version, never into a live one.

use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::info;

use collate_core::errors::ResolveError;
use collate_core::types::{AliasBinding, AliasSource, Correction, EntityId, EntityKind};

use super::clean;

/// One entry of the seed alias file.
#[derive(Debug, Clone, Deserialize)]
struct SeedEntry {
    alias: String,
    canonical: String,
    #[serde(default)]
    kind: Option<EntityKind>,
}

#[derive(Debug, Clone, Deserialize)]
struct SeedFile {
    #[serde(default = "default_seed_version")]
    version: u64,
    #[serde(default)]
    aliases: Vec<SeedEntry>,
}

fn default_seed_version() -> u64 {
    1
}

/// Immutable alias table used by one run.
#[derive(Debug, Clone)]
pub struct AliasSnapshot {
    version: u64,
    bindings: FxHashMap<String, EntityId>,
}

impl AliasSnapshot {
    /// Empty snapshot, version zero. Used when no seed file and no
    /// stored aliases exist yet.
    pub fn empty() -> Self {
        Self { version: 0, bindings: FxHashMap::default() }
    }

    /// Snapshot from stored bindings (already cleaned, already
    /// flattened).
    pub fn from_bindings(
        version: u64,
        bindings: impl IntoIterator<Item = AliasBinding>,
    ) -> Result<Self, ResolveError> {
        let mut map = FxHashMap::default();
        for binding in bindings {
            if binding.alias.trim().is_empty() {
                return Err(ResolveError::InvalidAlias {
                    alias: binding.alias,
                    reason: "empty alias".to_string(),
                });
            }
            map.insert(binding.alias, binding.entity_id);
        }
        Ok(Self { version, bindings: map })
    }

    /// Load the reviewed seed file and flatten alias chains so every
    /// lookup resolves in one step. A chain deeper than the table size
    /// is a cycle and rejected.
    pub fn load_seed(path: &Path) -> Result<Self, ResolveError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ResolveError::AliasFileUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let seed: SeedFile = toml::from_str(&raw).map_err(|e| ResolveError::AliasFileUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // Cleaned alias -> (cleaned canonical, kind).
        let mut name_map: FxHashMap<String, (String, EntityKind)> = FxHashMap::default();
        for entry in &seed.aliases {
            let alias = clean::clean(&entry.alias);
            let canonical = clean::clean(&entry.canonical);
            if alias.is_empty() || canonical.is_empty() {
                return Err(ResolveError::InvalidAlias {
                    alias: entry.alias.clone(),
                    reason: "alias or canonical cleans to empty".to_string(),
                });
            }
            name_map.insert(alias, (canonical, entry.kind.unwrap_or(EntityKind::Person)));
        }

        let mut bindings = FxHashMap::default();
        for alias in name_map.keys() {
            let (target, kind) = flatten(alias, &name_map)?;
            bindings.insert(alias.clone(), EntityId::derive(&target, kind));
        }

        info!(
            path = %path.display(),
            aliases = bindings.len(),
            version = seed.version,
            "loaded alias seed"
        );
        Ok(Self { version: seed.version, bindings })
    }

    /// Next snapshot: this one plus the given corrections, version
    /// bumped. The receiver is untouched.
    pub fn with_corrections(&self, corrections: &[Correction]) -> Self {
        let mut bindings = self.bindings.clone();
        for correction in corrections {
            bindings.insert(clean::clean(&correction.alias), correction.entity_id.clone());
        }
        Self { version: self.version + 1, bindings }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Resolve a cleaned form through the table. One step, by
    /// construction.
    pub fn resolve(&self, cleaned: &str) -> Option<&EntityId> {
        self.bindings.get(cleaned)
    }

    /// Bindings for persistence, sorted by alias.
    pub fn to_bindings(&self, source: AliasSource) -> Vec<AliasBinding> {
        let mut out: Vec<AliasBinding> = self
            .bindings
            .iter()
            .map(|(alias, entity_id)| AliasBinding {
                alias: alias.clone(),
                entity_id: entity_id.clone(),
                source,
            })
            .collect();
        out.sort_by(|a, b| a.alias.cmp(&b.alias));
        out
    }
}

/// Follow alias-of-alias chains to the terminal name. Depth is capped
/// by the table size; exceeding it means a cycle.
fn flatten(
    alias: &str,
    name_map: &FxHashMap<String, (String, EntityKind)>,
) -> Result<(String, EntityKind), ResolveError> {
    let (mut target, mut kind) = name_map
        .get(alias)
        .cloned()
        .unwrap_or_else(|| (alias.to_string(), EntityKind::Person));
    let mut hops = 0usize;
    while let Some((next, next_kind)) = name_map.get(&target) {
        if *next == target {
            break;
        }
        target = next.clone();
        kind = *next_kind;
        hops += 1;
        if hops > name_map.len() {
            return Err(ResolveError::InvalidAlias {
                alias: alias.to_string(),
                reason: "alias chain forms a cycle".to_string(),
            });
        }
    }
    Ok((target, kind))
}
