//! Mention normalization: every raw mention resolves to exactly one
//! canonical entity id, and resolution never fails.
//!
//! Resolution order: exact canonical-name match, duplicated-leading-
//! token collapse, alias snapshot, bounded fuzzy match against
//! same-kind same-surname candidates, deterministic mint. Fuzzy
//! matching handles the two artifacts scanned corpora actually
//! produce: truncated given names ("je" for "jeffrey") and small OCR
//! edit noise ("ghislane" for "ghislaine"). Single-character tokens
//! never fuzzy-match anything.

use moka::sync::Cache;
use rustc_hash::FxHashMap;
use strsim::{jaro_winkler, levenshtein};
use tracing::debug;

use collate_core::config::EntityConfig;
use collate_core::constants::MIN_TRUNCATION_PREFIX;
use collate_core::types::{
    AliasBinding, AliasSource, CanonicalEntity, EntityId, EntityKind, EntityMention, Resolution,
    ResolutionMethod, RunId,
};

use super::aliases::AliasSnapshot;
use super::clean;

/// In-memory view of the canonical entities known to this run. Grows
/// monotonically: entities are minted, never removed.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entries: Vec<RegistryEntry>,
    by_name: FxHashMap<(String, EntityKind), usize>,
    by_surname: FxHashMap<(String, EntityKind), Vec<usize>>,
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    id: EntityId,
    cleaned_name: String,
    kind: EntityKind,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded from stored canonical entities.
    pub fn from_entities<'a>(entities: impl IntoIterator<Item = &'a CanonicalEntity>) -> Self {
        let mut registry = Self::new();
        for entity in entities {
            registry.insert(entity.id.clone(), entity.cleaned_name.clone(), entity.kind);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, id: EntityId, cleaned_name: String, kind: EntityKind) {
        let idx = self.entries.len();
        if let Some(surname) = clean::surname(&cleaned_name) {
            self.by_surname
                .entry((surname.to_string(), kind))
                .or_default()
                .push(idx);
        }
        self.by_name.insert((cleaned_name.clone(), kind), idx);
        self.entries.push(RegistryEntry { id, cleaned_name, kind });
    }

    fn exact(&self, cleaned: &str, kind: EntityKind) -> Option<&EntityId> {
        self.by_name
            .get(&(cleaned.to_string(), kind))
            .map(|&idx| &self.entries[idx].id)
    }

    fn surname_bucket(&self, surname: &str, kind: EntityKind) -> &[usize] {
        self.by_surname
            .get(&(surname.to_string(), kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// The normalizer: one per run, holding the run's alias snapshot and
/// the growing registry.
pub struct MentionNormalizer {
    snapshot: AliasSnapshot,
    registry: EntityRegistry,
    config: EntityConfig,
    run: RunId,
    cache: Cache<(String, EntityKind), (EntityId, ResolutionMethod)>,
}

impl MentionNormalizer {
    pub fn new(
        snapshot: AliasSnapshot,
        registry: EntityRegistry,
        config: EntityConfig,
        run: RunId,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.mention_cache_capacity)
            .build();
        Self { snapshot, registry, config, run, cache }
    }

    pub fn snapshot_version(&self) -> u64 {
        self.snapshot.version()
    }

    /// Number of canonical entities currently known.
    pub fn known_entities(&self) -> usize {
        self.registry.len()
    }

    /// Resolve one mention. Total: every mention gets an id.
    pub fn resolve(&mut self, mention: &EntityMention) -> Resolution {
        let kind = mention.kind_hint.unwrap_or(EntityKind::Person);
        let mut cleaned = clean::clean(&mention.raw);
        if cleaned.is_empty() {
            // Nothing survived cleaning; fall back to the trimmed raw
            // form so distinct garbage stays distinct.
            cleaned = mention.raw.trim().to_lowercase();
        }

        if let Some((id, method)) = self.cache.get(&(cleaned.clone(), kind)) {
            return Resolution { entity_id: id, method, minted: None, learned: None };
        }

        let resolution = self.resolve_cleaned(&cleaned, &mention.raw, kind);
        self.cache.insert(
            (cleaned, kind),
            (resolution.entity_id.clone(), resolution.method),
        );
        resolution
    }

    fn resolve_cleaned(&mut self, cleaned: &str, raw: &str, kind: EntityKind) -> Resolution {
        // Exact canonical name.
        if let Some(id) = self.registry.exact(cleaned, kind) {
            return Resolution {
                entity_id: id.clone(),
                method: ResolutionMethod::Exact,
                minted: None,
                learned: None,
            };
        }

        // OCR stutter: collapse and try the collapsed form against
        // names and aliases.
        let collapsed = clean::collapse_leading_stutter(cleaned);
        if let Some(ref collapsed) = collapsed {
            let hit = self
                .registry
                .exact(collapsed, kind)
                .or_else(|| self.snapshot.resolve(collapsed))
                .cloned();
            if let Some(id) = hit {
                return self.learned_resolution(cleaned, id, ResolutionMethod::ArtifactCollapse);
            }
        }

        // Alias snapshot.
        if let Some(id) = self.snapshot.resolve(cleaned) {
            return Resolution {
                entity_id: id.clone(),
                method: ResolutionMethod::Alias,
                minted: None,
                learned: None,
            };
        }

        // Bounded fuzzy match, on the collapsed form when one exists.
        let form = collapsed.as_deref().unwrap_or(cleaned);
        if let Some(id) = self.fuzzy_match(form, kind) {
            return self.learned_resolution(cleaned, id, ResolutionMethod::Fuzzy);
        }

        // Mint. The collapsed form is the name: "je je epstein" mints
        // "je epstein" even when no existing entity matched.
        let entity = CanonicalEntity::mint(form, raw.trim(), kind, self.run.clone());
        debug!(id = %entity.id, name = %entity.cleaned_name, "minted entity");
        self.registry
            .insert(entity.id.clone(), entity.cleaned_name.clone(), kind);
        Resolution {
            entity_id: entity.id.clone(),
            method: ResolutionMethod::Minted,
            minted: Some(entity),
            learned: None,
        }
    }

    /// A non-exact resolution binds the variant form as a learned
    /// alias so the next snapshot resolves it in one step.
    fn learned_resolution(
        &self,
        cleaned: &str,
        id: EntityId,
        method: ResolutionMethod,
    ) -> Resolution {
        Resolution {
            entity_id: id.clone(),
            method,
            minted: None,
            learned: Some(AliasBinding {
                alias: cleaned.to_string(),
                entity_id: id,
                source: AliasSource::Learned,
            }),
        }
    }

    /// Fuzzy candidate search: same kind, same surname, best
    /// Jaro-Winkler score wins, ties to the smallest entity id.
    fn fuzzy_match(&self, form: &str, kind: EntityKind) -> Option<EntityId> {
        let surname = clean::surname(form)?;
        let mut best: Option<(f64, &EntityId)> = None;
        for &idx in self.registry.surname_bucket(surname, kind) {
            let candidate = &self.registry.entries[idx];
            if !self.tokens_compatible(form, &candidate.cleaned_name) {
                continue;
            }
            let score = jaro_winkler(form, &candidate.cleaned_name);
            let better = match best {
                None => true,
                Some((best_score, best_id)) => {
                    score > best_score || (score == best_score && candidate.id < *best_id)
                }
            };
            if better {
                best = Some((score, &candidate.id));
            }
        }
        best.map(|(_, id)| id.clone())
    }

    /// Whether two cleaned same-surname names plausibly denote the
    /// same entity. Given tokens align left to right; each aligned
    /// pair must match by truncation prefix or bounded edit distance,
    /// or the whole names must clear the Jaro-Winkler floor.
    fn tokens_compatible(&self, a: &str, b: &str) -> bool {
        let a_tokens: Vec<&str> = clean::tokens(a).collect();
        let b_tokens: Vec<&str> = clean::tokens(b).collect();
        // Drop the shared surname.
        let a_given = &a_tokens[..a_tokens.len().saturating_sub(1)];
        let b_given = &b_tokens[..b_tokens.len().saturating_sub(1)];

        if a_given.is_empty() || b_given.is_empty() {
            // Surname-only mentions are ambiguous; never guess.
            return false;
        }

        let aligned_ok = a_given
            .iter()
            .zip(b_given.iter())
            .all(|(ta, tb)| self.token_match(ta, tb));
        aligned_ok || jaro_winkler(a, b) >= self.config.jaro_winkler_floor
    }

    fn token_match(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        if a.len() < MIN_TRUNCATION_PREFIX || b.len() < MIN_TRUNCATION_PREFIX {
            return false;
        }
        if a.starts_with(b) || b.starts_with(a) {
            return true;
        }
        levenshtein(a, b) <= self.config.max_edit_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer(snapshot: AliasSnapshot, registry: EntityRegistry) -> MentionNormalizer {
        MentionNormalizer::new(snapshot, registry, EntityConfig::default(), RunId::new())
    }

    fn registry_with(names: &[&str]) -> EntityRegistry {
        let mut registry = EntityRegistry::new();
        for name in names {
            let cleaned = clean::clean(name);
            registry.insert(
                EntityId::derive(&cleaned, EntityKind::Person),
                cleaned,
                EntityKind::Person,
            );
        }
        registry
    }

    #[test]
    fn exact_name_resolves_without_minting() {
        let mut n = normalizer(AliasSnapshot::empty(), registry_with(&["Jeffrey Epstein"]));
        let r = n.resolve(&EntityMention::new("  JEFFREY  Epstein "));
        assert_eq!(r.method, ResolutionMethod::Exact);
        assert_eq!(r.entity_id, EntityId::derive("jeffrey epstein", EntityKind::Person));
        assert!(r.minted.is_none());
    }

    #[test]
    fn stutter_collapses_onto_existing_entity() {
        let mut n = normalizer(AliasSnapshot::empty(), registry_with(&["Je Epstein"]));
        let r = n.resolve(&EntityMention::new("Je Je Epstein"));
        assert_eq!(r.method, ResolutionMethod::ArtifactCollapse);
        assert_eq!(r.entity_id, EntityId::derive("je epstein", EntityKind::Person));
        assert!(r.learned.is_some());
    }

    #[test]
    fn stuttered_truncation_reaches_full_name() {
        // "Je Je Epstein": stutter collapse to "je epstein", then
        // fuzzy truncation prefix onto "jeffrey epstein".
        let mut n = normalizer(AliasSnapshot::empty(), registry_with(&["Jeffrey Epstein"]));
        let r = n.resolve(&EntityMention::new("Je Je Epstein"));
        assert_eq!(r.method, ResolutionMethod::Fuzzy);
        assert_eq!(r.entity_id, EntityId::derive("jeffrey epstein", EntityKind::Person));
    }

    #[test]
    fn alias_snapshot_resolves_in_one_step() {
        let jeffrey = EntityId::derive("jeffrey epstein", EntityKind::Person);
        let snapshot = AliasSnapshot::from_bindings(
            1,
            vec![AliasBinding {
                alias: "j epstein".to_string(),
                entity_id: jeffrey.clone(),
                source: AliasSource::Seed,
            }],
        )
        .unwrap();
        let mut n = normalizer(snapshot, EntityRegistry::new());
        let r = n.resolve(&EntityMention::new("J. Epstein"));
        assert_eq!(r.method, ResolutionMethod::Alias);
        assert_eq!(r.entity_id, jeffrey);
    }

    #[test]
    fn small_edit_noise_fuzzy_matches() {
        let mut n = normalizer(AliasSnapshot::empty(), registry_with(&["Ghislaine Maxwell"]));
        let r = n.resolve(&EntityMention::new("Ghislane Maxwell"));
        assert_eq!(r.method, ResolutionMethod::Fuzzy);
        assert_eq!(
            r.entity_id,
            EntityId::derive("ghislaine maxwell", EntityKind::Person)
        );
    }

    #[test]
    fn single_character_tokens_never_fuzzy_match() {
        let mut n = normalizer(AliasSnapshot::empty(), registry_with(&["Jeffrey Epstein"]));
        let r = n.resolve(&EntityMention::new("J Epstein"));
        assert_eq!(r.method, ResolutionMethod::Minted);
    }

    #[test]
    fn surname_only_mention_mints_its_own_entity() {
        let mut n = normalizer(AliasSnapshot::empty(), registry_with(&["Jeffrey Epstein"]));
        let r = n.resolve(&EntityMention::new("Epstein"));
        assert_eq!(r.method, ResolutionMethod::Minted);
        assert_eq!(r.entity_id, EntityId::derive("epstein", EntityKind::Person));
    }

    #[test]
    fn different_kinds_never_merge() {
        let mut n = normalizer(AliasSnapshot::empty(), registry_with(&["Southern Trust"]));
        let r = n.resolve(&EntityMention::with_kind("Southern Trust", EntityKind::Organization));
        assert_eq!(r.method, ResolutionMethod::Minted);
        assert_ne!(
            r.entity_id,
            EntityId::derive("southern trust", EntityKind::Person)
        );
    }

    #[test]
    fn minting_is_deterministic_and_monotonic() {
        let mut n = normalizer(AliasSnapshot::empty(), EntityRegistry::new());
        let first = n.resolve(&EntityMention::new("Sarah Kellen"));
        assert_eq!(first.method, ResolutionMethod::Minted);
        let before = n.known_entities();

        // The same mention again: resolved, not re-minted.
        let second = n.resolve(&EntityMention::new("Sarah Kellen"));
        assert_eq!(second.entity_id, first.entity_id);
        assert!(second.minted.is_none());
        assert_eq!(n.known_entities(), before);
    }

    #[test]
    fn unrelated_names_do_not_merge() {
        let mut n = normalizer(AliasSnapshot::empty(), registry_with(&["Jeffrey Epstein"]));
        let r = n.resolve(&EntityMention::new("Mark Epstein"));
        assert_eq!(r.method, ResolutionMethod::Minted);
    }

    #[test]
    fn empty_mention_still_resolves() {
        let mut n = normalizer(AliasSnapshot::empty(), EntityRegistry::new());
        let r = n.resolve(&EntityMention::new("???"));
        assert_eq!(r.method, ResolutionMethod::Minted);
    }

    #[test]
    fn fuzzy_tie_breaks_to_smallest_id() {
        // Two candidates both one edit away; the winner must be the
        // same whatever the registry order.
        let a = registry_with(&["Jon Smith", "Jan Smith"]);
        let b = registry_with(&["Jan Smith", "Jon Smith"]);
        let mut na = normalizer(AliasSnapshot::empty(), a);
        let mut nb = normalizer(AliasSnapshot::empty(), b);
        let ra = na.resolve(&EntityMention::new("Jen Smith"));
        let rb = nb.resolve(&EntityMention::new("Jen Smith"));
        assert_eq!(ra.entity_id, rb.entity_id);
    }
}
