//! Entity records: mentions as extracted, canonical entities as
//! resolved, and the alias bindings connecting them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::identifiers::{EntityId, RunId};

/// Kind tag carried by every canonical entity. Mentions with different
/// kinds never merge, whatever their string similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    Organization,
    Location,
    Other,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
            Self::Location => "location",
            Self::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "person" => Some(Self::Person),
            "organization" => Some(Self::Organization),
            "location" => Some(Self::Location),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A raw entity mention as delivered by the upstream extraction step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityMention {
    pub raw: String,
    /// Kind asserted by the extractor, when it knows one.
    pub kind_hint: Option<EntityKind>,
}

impl EntityMention {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into(), kind_hint: None }
    }

    pub fn with_kind(raw: impl Into<String>, kind: EntityKind) -> Self {
        Self { raw: raw.into(), kind_hint: Some(kind) }
    }
}

/// Canonical entity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    pub id: EntityId,
    /// Cleaned, lowercased form the id is derived from.
    pub cleaned_name: String,
    /// Presentation form: the raw mention that minted this entity.
    pub display_name: String,
    pub kind: EntityKind,
    /// Run that minted this entity.
    pub minted_in: RunId,
    pub created_at: DateTime<Utc>,
}

impl CanonicalEntity {
    pub fn mint(cleaned_name: impl Into<String>, display_name: impl Into<String>, kind: EntityKind, run: RunId) -> Self {
        let cleaned_name = cleaned_name.into();
        Self {
            id: EntityId::derive(&cleaned_name, kind),
            cleaned_name,
            display_name: display_name.into(),
            kind,
            minted_in: run,
            created_at: Utc::now(),
        }
    }
}

/// How a mention was resolved. Recorded per resolution for stats and
/// for the correction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Cleaned form matched a canonical name exactly.
    Exact,
    /// Cleaned form was bound in the alias table.
    Alias,
    /// Matched after collapsing a duplicated leading token.
    ArtifactCollapse,
    /// Matched by bounded fuzzy comparison.
    Fuzzy,
    /// No match anywhere; a new entity was minted.
    Minted,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Alias => "alias",
            Self::ArtifactCollapse => "artifact_collapse",
            Self::Fuzzy => "fuzzy",
            Self::Minted => "minted",
        }
    }
}

/// Outcome of resolving one mention.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub entity_id: EntityId,
    pub method: ResolutionMethod,
    /// Present only when the resolution minted a new entity.
    pub minted: Option<CanonicalEntity>,
    /// Alias binding learned from a non-exact resolution, recorded so
    /// the next run resolves the same variant in one step.
    pub learned: Option<AliasBinding>,
}

/// Where an alias binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasSource {
    /// Seeded from the reviewed alias file.
    Seed,
    /// Appended by an operator correction.
    Correction,
    /// Learned during a run (artifact collapse or fuzzy match).
    Learned,
}

impl AliasSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Correction => "correction",
            Self::Learned => "learned",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "seed" => Some(Self::Seed),
            "correction" => Some(Self::Correction),
            "learned" => Some(Self::Learned),
            _ => None,
        }
    }
}

/// One alias binding: a cleaned variant form mapped to its canonical
/// entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasBinding {
    pub alias: String,
    pub entity_id: EntityId,
    pub source: AliasSource,
}

/// One reviewed correction, appended to the correction log and applied
/// to the next snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub alias: String,
    pub entity_id: EntityId,
    pub recorded_at: DateTime<Utc>,
}
