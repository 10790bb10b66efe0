//! High-level Rust SDK for the Vestige lineage tracking system.
//!
//! # Example
//! ```no_run
//! use vestige_sdk::{Atom, DeathContext, ShadowRegistry};
//!
//! let registry = ShadowRegistry::open(".vestige").unwrap();
//!
//! // An extractor noticed that `getUser` disappeared from the codebase.
//! let dead = Atom::new("fn_a1", "getUser");
//! let shadow = registry
//!     .create_shadow(&dead, DeathContext { reason: Some("file rewrite".into()), ..Default::default() })
//!     .unwrap();
//! println!("tombstone: {}", shadow.shadow_id);
//!
//! // Later, a new atom appears; link it back to its ancestor.
//! let mut fresh = Atom::new("fn_b2", "fetchUser");
//! let enrichment = registry.enrich_with_ancestry(&mut fresh).unwrap();
//! if let Some(matched) = enrichment.matched {
//!     println!("replaces {} (similarity {:.2})", matched.shadow_id, matched.similarity);
//! }
//! ```

mod registry;

pub use registry::ShadowRegistry;

// Re-export the types SDK users need without touching the inner crates.
pub use vestige_core::config::{MatchThresholds, RegistryConfig, SimilarityWeights};
pub use vestige_core::error::CoreError;
pub use vestige_core::model::{
    Ancestry, AncestryWarning, Atom, AtomId, Dna, EvolutionType, FlowType, Shadow, ShadowId,
    ShadowStatus,
};
pub use vestige_core::storage::{DeathContext, IndexEntry, ShadowFilter};
pub use vestige_core::validate::{validate_for_lineage, LineageValidation, ValidationOptions};
pub use vestige_query::ancestry::{Enrichment, MatchedAncestor};
pub use vestige_query::error::QueryError;
pub use vestige_query::search::{ScoredShadow, SearchOptions};
