//! Core data model, fingerprint engine and shadow storage for Vestige.
//!
//! Vestige tracks the identity of code entities ("atoms") across their
//! lifetime without version-control history: each atom gets a structural
//! and behavioral fingerprint (its DNA), deleted atoms leave persisted
//! tombstones ("shadows"), and new atoms are matched against those
//! tombstones so accumulated context survives deletes and rewrites.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod storage;
pub mod validate;

pub use config::{MatchThresholds, RegistryConfig, SimilarityWeights, StoreSettings};
pub use error::CoreError;
pub use fingerprint::{compare_dna, compute_dna};
pub use model::{Ancestry, Atom, AtomId, Dna, FlowType, Shadow, ShadowId, ShadowStatus};
pub use storage::{DeathContext, IndexEntry, ShadowFilter, ShadowStore};
pub use validate::{validate_for_lineage, validate_match, LineageValidation, MatchDecision};
