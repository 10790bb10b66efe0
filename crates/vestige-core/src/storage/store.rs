use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::config::RegistryConfig;
use crate::error::CoreError;
use crate::fingerprint::compute_dna;
use crate::model::ancestry::vibration_score_parts;
use crate::model::atom::{Atom, AtomId};
use crate::model::dna::DnaFingerprint;
use crate::model::shadow::{
    DeathRecord, EvolutionType, Inheritance, Shadow, ShadowId, ShadowLineage, ShadowStatus,
};
use crate::validate::lineage::extract_metadata;

use super::backend::FileBackend;
use super::cache::FifoCache;
use super::index::{IndexEntry, ShadowFilter, ShadowIndex};

/// Caller-supplied circumstances of an atom's death.
#[derive(Debug, Clone, Default)]
pub struct DeathContext {
    pub reason: Option<String>,
    pub replacement_id: Option<AtomId>,
    pub commits: Vec<String>,
    pub risk: Option<f64>,
}

/// The tombstone store: one JSON record per shadow plus one shared index
/// document.
///
/// An explicit handle, constructed once and passed by reference; there is
/// no process-wide registry. Every index mutation runs its whole
/// load-mutate-save cycle under one mutex, so two death registrations can
/// never interleave and lose an update. Across processes the store is
/// single-writer by convention; the index file is additionally guarded by
/// advisory locks against torn reads.
pub struct ShadowStore {
    backend: FileBackend,
    config: RegistryConfig,
    index: Mutex<ShadowIndex>,
    cache: Mutex<FifoCache<ShadowId, Shadow>>,
}

/// Mutex poisoning only means another thread panicked mid-operation; the
/// guarded data is a plain map that is rewritten wholesale on save, so
/// recovering the inner value is safe.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ShadowStore {
    /// Open a store at the given root, reading `config.json` if present.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let root = root.into();
        let config = RegistryConfig::load(&root)?;
        Self::open_with_config(root, config)
    }

    /// Open a store with an explicit configuration.
    pub fn open_with_config(
        root: impl Into<PathBuf>,
        config: RegistryConfig,
    ) -> Result<Self, CoreError> {
        let backend = FileBackend::open(root)?;
        let index = ShadowIndex::load(&backend.index_path())?;
        let cache = FifoCache::new(config.store.cache_capacity);
        Ok(Self {
            backend,
            config,
            index: Mutex::new(index),
            cache: Mutex::new(cache),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register an atom's death: fingerprint it if needed, build the
    /// tombstone, persist it, and update the index. When the dying atom was
    /// itself a descendant, the new shadow is linked under its ancestor.
    pub fn create_shadow(&self, atom: &Atom, death: DeathContext) -> Result<Shadow, CoreError> {
        let dna = atom.dna.clone().unwrap_or_else(|| compute_dna(atom));
        let now = Utc::now();
        let born_at = atom.created_at.unwrap_or(now);

        let status = if death.replacement_id.is_some() {
            ShadowStatus::Replaced
        } else {
            ShadowStatus::Deleted
        };
        let (parent_shadow_id, generation) = match &atom.ancestry {
            Some(ancestry) => (ancestry.replaced.clone(), ancestry.generation),
            None => (None, 0),
        };

        let shadow = Shadow {
            shadow_id: ShadowId::new(),
            original_id: atom.id.clone(),
            status,
            replaced_by: death.replacement_id.clone(),
            born_at,
            died_at: now,
            lifespan_days: (now - born_at).num_days(),
            metadata: extract_metadata(atom),
            lineage: ShadowLineage {
                parent_shadow_id: parent_shadow_id.clone(),
                child_shadow_ids: Vec::new(),
                evolution_type: None,
                generation,
            },
            inheritance: Inheritance {
                connections: atom.connections.clone(),
                connection_count: atom.connections.len(),
                vibration_score: vibration_score_parts(&atom.connections, Some(&dna)),
                dna_fingerprint: DnaFingerprint::from(&dna),
            },
            death: DeathRecord {
                reason: death.reason,
                commits_involved: death.commits,
                risk_introduced: death.risk,
                replacement_id: death.replacement_id,
            },
            dna,
        };

        self.backend.write_shadow(&shadow)?;

        let mut index = lock(&self.index);
        index.upsert(IndexEntry::from_shadow(&shadow));
        if let Some(parent_id) = &parent_shadow_id {
            self.append_child(&mut index, parent_id, &shadow.shadow_id)?;
        }
        index.save(&self.backend.index_path())?;
        drop(index);

        lock(&self.cache).insert(shadow.shadow_id.clone(), shadow.clone());
        Ok(shadow)
    }

    /// Append a freshly created shadow under its ancestor, persisting the
    /// ancestor record and the index lineage map. Called with the index
    /// mutex held.
    fn append_child(
        &self,
        index: &mut ShadowIndex,
        parent_id: &ShadowId,
        child_id: &ShadowId,
    ) -> Result<(), CoreError> {
        let Some(mut parent) = self.load_shadow(parent_id)? else {
            tracing::warn!("Ancestor shadow {parent_id} missing; lineage link skipped");
            return Ok(());
        };
        if !parent.lineage.child_shadow_ids.contains(child_id) {
            parent.lineage.child_shadow_ids.push(child_id.clone());
        }
        self.backend.write_shadow(&parent)?;
        index.upsert(IndexEntry::from_shadow(&parent));
        index.link_child(parent_id, child_id);
        lock(&self.cache).insert(parent.shadow_id.clone(), parent);
        Ok(())
    }

    /// Flip a shadow to `replaced` by the given atom. No-op when the shadow
    /// does not exist.
    pub fn mark_replaced(
        &self,
        shadow_id: &ShadowId,
        replacement: &AtomId,
    ) -> Result<(), CoreError> {
        self.mark_replaced_as(shadow_id, replacement, None)
    }

    /// Like [`Self::mark_replaced`], also recording how the successor
    /// relates to the dead atom.
    pub fn mark_replaced_as(
        &self,
        shadow_id: &ShadowId,
        replacement: &AtomId,
        evolution: Option<EvolutionType>,
    ) -> Result<(), CoreError> {
        let mut index = lock(&self.index);
        let Some(mut shadow) = self.load_shadow(shadow_id)? else {
            tracing::debug!("mark_replaced: shadow {shadow_id} not found, skipping");
            return Ok(());
        };
        shadow.status = ShadowStatus::Replaced;
        shadow.replaced_by = Some(replacement.clone());
        shadow.death.replacement_id = Some(replacement.clone());
        if evolution.is_some() {
            shadow.lineage.evolution_type = evolution;
        }
        self.backend.write_shadow(&shadow)?;
        index.upsert(IndexEntry::from_shadow(&shadow));
        index.save(&self.backend.index_path())?;
        drop(index);

        lock(&self.cache).insert(shadow.shadow_id.clone(), shadow);
        Ok(())
    }

    /// Cache-first point lookup.
    pub fn get_shadow(&self, id: &ShadowId) -> Result<Option<Shadow>, CoreError> {
        self.load_shadow(id)
    }

    fn load_shadow(&self, id: &ShadowId) -> Result<Option<Shadow>, CoreError> {
        if let Some(shadow) = lock(&self.cache).get(id) {
            return Ok(Some(shadow.clone()));
        }
        let Some(shadow) = self.backend.read_shadow(id)? else {
            return Ok(None);
        };
        lock(&self.cache).insert(id.clone(), shadow.clone());
        Ok(Some(shadow))
    }

    /// The full ancestor chain of a shadow, root first, the queried shadow
    /// last. A missing hop ends the walk; a cycle in the parent links is a
    /// fatal consistency error.
    pub fn get_lineage(&self, id: &ShadowId) -> Result<Vec<ShadowId>, CoreError> {
        let Some(shadow) = self.load_shadow(id)? else {
            return Err(CoreError::NotFound {
                id: id.as_str().to_string(),
            });
        };

        let mut chain = vec![id.clone()];
        let mut visited: HashSet<ShadowId> = chain.iter().cloned().collect();
        let mut next = shadow.lineage.parent_shadow_id;
        while let Some(parent_id) = next {
            if !visited.insert(parent_id.clone()) {
                return Err(CoreError::LineageCycle {
                    id: parent_id.as_str().to_string(),
                });
            }
            let Some(parent) = self.load_shadow(&parent_id)? else {
                tracing::warn!("Lineage hop {parent_id} missing; chain truncated");
                break;
            };
            chain.insert(0, parent_id);
            next = parent.lineage.parent_shadow_id;
        }
        Ok(chain)
    }

    /// Filtered scan over index entries, newest deaths first. Never loads
    /// shadow bodies.
    pub fn list_shadows(&self, filter: &ShadowFilter) -> Vec<IndexEntry> {
        let index = lock(&self.index);
        let mut entries: Vec<IndexEntry> = index
            .shadows
            .values()
            .filter(|e| e.matches(filter))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.died_at.cmp(&a.died_at));
        if let Some(limit) = filter.limit {
            entries.truncate(limit);
        }
        entries
    }

    /// Snapshot of every index entry, for callers that need a filter the
    /// [`ShadowFilter`] cannot express (similarity search excludes a
    /// status instead of requiring one).
    pub fn index_snapshot(&self) -> Vec<IndexEntry> {
        lock(&self.index).shadows.values().cloned().collect()
    }

    /// Rebuild the index document from the shadow records on disk.
    /// Unreadable records are skipped with a warning.
    pub fn rebuild_index(&self) -> Result<usize, CoreError> {
        let shadows = self.backend.scan_shadows()?;

        let mut rebuilt = ShadowIndex::default();
        for shadow in &shadows {
            rebuilt.upsert(IndexEntry::from_shadow(shadow));
            if let Some(parent_id) = &shadow.lineage.parent_shadow_id {
                rebuilt.link_child(parent_id, &shadow.shadow_id);
            }
        }
        let count = rebuilt.len();

        let mut index = lock(&self.index);
        *index = rebuilt;
        index.save(&self.backend.index_path())?;
        drop(index);

        tracing::info!("Indexed {count} shadows");
        Ok(count)
    }
}
