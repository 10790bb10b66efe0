use std::path::PathBuf;

use vestige_core::config::RegistryConfig;
use vestige_core::error::CoreError;
use vestige_core::model::atom::{Atom, AtomId};
use vestige_core::model::shadow::{Shadow, ShadowId};
use vestige_core::storage::{DeathContext, IndexEntry, ShadowFilter, ShadowStore};
use vestige_query::ancestry::{AncestryPropagator, Enrichment};
use vestige_query::error::QueryError;
use vestige_query::search::{ScoredShadow, SearchOptions, SimilarityEngine};

/// One handle over the whole lineage system: the tombstone store plus the
/// search and propagation engines, constructed once and passed around
/// explicitly.
pub struct ShadowRegistry {
    store: ShadowStore,
    engine: SimilarityEngine,
    propagator: AncestryPropagator,
}

impl ShadowRegistry {
    /// Open a registry rooted at the given directory, reading its
    /// `config.json` if one exists.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let store = ShadowStore::open(root)?;
        Ok(Self::wrap(store))
    }

    /// Open a registry with an explicit configuration.
    pub fn open_with_config(
        root: impl Into<PathBuf>,
        config: RegistryConfig,
    ) -> Result<Self, CoreError> {
        let store = ShadowStore::open_with_config(root, config)?;
        Ok(Self::wrap(store))
    }

    fn wrap(store: ShadowStore) -> Self {
        let config = store.config().clone();
        Self {
            store,
            engine: SimilarityEngine::new(config.clone()),
            propagator: AncestryPropagator::new(config),
        }
    }

    /// The underlying store, for callers composing their own queries.
    pub fn store(&self) -> &ShadowStore {
        &self.store
    }

    /// Register an atom's death and persist its tombstone.
    pub fn create_shadow(&self, atom: &Atom, death: DeathContext) -> Result<Shadow, CoreError> {
        self.store.create_shadow(atom, death)
    }

    /// Flip a shadow to replaced by the given atom. No-op when absent.
    pub fn mark_replaced(
        &self,
        shadow_id: &ShadowId,
        replacement: &AtomId,
    ) -> Result<(), CoreError> {
        self.store.mark_replaced(shadow_id, replacement)
    }

    /// Cache-first point lookup of one shadow.
    pub fn get_shadow(&self, id: &ShadowId) -> Result<Option<Shadow>, CoreError> {
        self.store.get_shadow(id)
    }

    /// Full ancestor chain of a shadow, root first.
    pub fn get_lineage(&self, id: &ShadowId) -> Result<Vec<ShadowId>, CoreError> {
        self.store.get_lineage(id)
    }

    /// Filtered scan over index entries, newest deaths first.
    pub fn list_shadows(&self, filter: &ShadowFilter) -> Vec<IndexEntry> {
        self.store.list_shadows(filter)
    }

    /// Rebuild the index document from the records on disk.
    pub fn rebuild_index(&self) -> Result<usize, CoreError> {
        self.store.rebuild_index()
    }

    /// Shadows similar to the given atom, best first.
    pub fn find_similar(
        &self,
        atom: &Atom,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredShadow>, QueryError> {
        self.engine.find_similar(&self.store, atom, options)
    }

    /// The single best candidate ancestor, if any clears the strict
    /// threshold.
    pub fn find_best_match(&self, atom: &Atom) -> Result<Option<ScoredShadow>, QueryError> {
        self.engine.find_best_match(&self.store, atom)
    }

    /// Attach ancestry to a newly appeared atom, marking its matched
    /// ancestor replaced.
    pub fn enrich_with_ancestry(&self, atom: &mut Atom) -> Result<Enrichment, QueryError> {
        self.propagator.enrich_with_ancestry(&self.store, atom)
    }
}
