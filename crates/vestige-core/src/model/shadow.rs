use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

use super::atom::{AtomId, Connection};
use super::dna::{Dna, DnaFingerprint};

/// A globally unique identifier for a shadow.
/// Generated as UUID v4 hex (no dashes), used as the fanout path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShadowId(pub String);

impl ShadowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().as_simple().to_string())
    }

    /// Parse and validate an ID string. Must be at least 2 characters.
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.len() < 2 {
            return Err(CoreError::InvalidId(format!(
                "shadow ID must be at least 2 characters, got {}",
                s.len()
            )));
        }
        Ok(Self(s))
    }

    /// The 2-char prefix used for fanout in shadows/<ab>/<full-id>.json
    pub fn fanout_prefix(&self) -> &str {
        if self.0.len() >= 2 {
            &self.0[..2]
        } else {
            "00"
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ShadowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShadowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ShadowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ShadowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowStatus {
    /// Dead with no known successor.
    Deleted,
    /// A successor atom was linked to this shadow.
    Replaced,
    /// Absorbed into another atom together with siblings.
    Merged,
    /// Split into several successor atoms.
    Split,
}

/// How a dead atom relates to the successor that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionType {
    /// Same structure, different name.
    Renamed,
    /// Same operation pattern, higher complexity.
    Expanded,
    /// Same operation pattern, lower complexity.
    Shrunk,
    /// Same operation pattern, comparable complexity.
    Refactor,
    /// Different structure serving a different semantic domain.
    DomainChange,
    /// Rebuilt from scratch for the same purpose.
    Reimplemented,
}

/// Persisted tombstone for a deleted atom.
///
/// Immutable after creation except for `status`/`replaced_by`/
/// `death.replacement_id` (via mark-replaced) and appends to
/// `lineage.child_shadow_ids` when a descendant shadow is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shadow {
    pub shadow_id: ShadowId,
    pub original_id: AtomId,
    pub status: ShadowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_by: Option<AtomId>,
    pub born_at: DateTime<Utc>,
    pub died_at: DateTime<Utc>,
    pub lifespan_days: i64,
    pub dna: Dna,
    pub metadata: ShadowMetadata,
    pub lineage: ShadowLineage,
    pub inheritance: Inheritance,
    pub death: DeathRecord,
}

/// Compact description of the dead atom, enough for reporting without the
/// original source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShadowMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<FlowSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<SemanticSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default)]
    pub is_exported: bool,
}

/// Counts-only summary of the dead atom's data flow.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowSummary {
    pub inputs: usize,
    pub outputs: usize,
    pub transformations: usize,
}

/// Summary of the dead atom's semantic analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SemanticSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

/// Position of this shadow in its ancestry chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShadowLineage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_shadow_id: Option<ShadowId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_shadow_ids: Vec<ShadowId>,
    /// Set when a successor is linked; absent on freshly created shadows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evolution_type: Option<EvolutionType>,
    #[serde(default)]
    pub generation: u32,
}

/// Context a successor atom inherits from this shadow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Inheritance {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
    pub connection_count: usize,
    pub vibration_score: f64,
    pub dna_fingerprint: DnaFingerprint,
}

/// Circumstances of the atom's death.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeathRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commits_involved: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_introduced: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_id: Option<AtomId>,
}
