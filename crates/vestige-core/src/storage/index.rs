use std::collections::BTreeMap;
use std::fs;
use std::io::{Read as _, Write as _};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::atom::AtomId;
use crate::model::dna::FlowType;
use crate::model::shadow::{Shadow, ShadowId, ShadowStatus};

/// One row of the secondary index: enough to filter candidates without
/// loading full shadow bodies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    pub shadow_id: ShadowId,
    pub original_id: AtomId,
    pub status: ShadowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_by: Option<AtomId>,
    pub died_at: DateTime<Utc>,
    pub flow_type: FlowType,
    pub pattern_hash: String,
    pub generation: u32,
}

impl IndexEntry {
    pub fn from_shadow(shadow: &Shadow) -> Self {
        Self {
            shadow_id: shadow.shadow_id.clone(),
            original_id: shadow.original_id.clone(),
            status: shadow.status,
            replaced_by: shadow.replaced_by.clone(),
            died_at: shadow.died_at,
            flow_type: shadow.dna.flow_type,
            pattern_hash: shadow.dna.pattern_hash.clone(),
            generation: shadow.lineage.generation,
        }
    }

    pub fn matches(&self, filter: &ShadowFilter) -> bool {
        if let Some(status) = filter.status {
            if self.status != status {
                return false;
            }
        }
        if let Some(flow_type) = filter.flow_type {
            if self.flow_type != flow_type {
                return false;
            }
        }
        if let Some(pattern_hash) = &filter.pattern_hash {
            if &self.pattern_hash != pattern_hash {
                return false;
            }
        }
        true
    }
}

/// Filters for listing index entries.
#[derive(Debug, Clone, Default)]
pub struct ShadowFilter {
    pub status: Option<ShadowStatus>,
    pub flow_type: Option<FlowType>,
    pub pattern_hash: Option<String>,
    pub limit: Option<usize>,
}

/// The single shared index document, persisted as `index.json` in the
/// store root. All mutation goes through the store's mutex; this type only
/// knows how to hold, load and save the data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShadowIndex {
    #[serde(default)]
    pub shadows: BTreeMap<String, IndexEntry>,
    /// Parent shadow id to child shadow ids, mirroring the per-shadow
    /// `lineage` blocks for cheap descendant lookups.
    #[serde(default)]
    pub lineages: BTreeMap<String, Vec<ShadowId>>,
}

impl ShadowIndex {
    /// Insert or replace the entry for a shadow.
    pub fn upsert(&mut self, entry: IndexEntry) {
        self.shadows.insert(entry.shadow_id.as_str().to_string(), entry);
    }

    pub fn get(&self, id: &ShadowId) -> Option<&IndexEntry> {
        self.shadows.get(id.as_str())
    }

    /// Record a parent -> child lineage edge. Idempotent.
    pub fn link_child(&mut self, parent: &ShadowId, child: &ShadowId) {
        let children = self
            .lineages
            .entry(parent.as_str().to_string())
            .or_default();
        if !children.contains(child) {
            children.push(child.clone());
        }
    }

    pub fn children_of(&self, parent: &ShadowId) -> &[ShadowId] {
        self.lineages
            .get(parent.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.shadows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shadows.is_empty()
    }

    /// Load the index document, using a shared file lock. A missing file is
    /// an empty index, not an error.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let file = match fs::OpenOptions::new().read(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(CoreError::Io(e)),
        };
        fs2::FileExt::lock_shared(&file).map_err(CoreError::Io)?;
        let mut data = String::new();
        let result = (&file).read_to_string(&mut data);
        fs2::FileExt::unlock(&file).map_err(CoreError::Io)?;
        result?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Save the index document, using an exclusive file lock.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(self)?;
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        fs2::FileExt::lock_exclusive(&file).map_err(CoreError::Io)?;
        let result = (&file).write_all(json.as_bytes());
        fs2::FileExt::unlock(&file).map_err(CoreError::Io)?;
        result?;
        Ok(())
    }
}
