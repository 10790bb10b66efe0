//! Similarity search and ancestry propagation over the Vestige shadow
//! store: find the dead atom a new one most plausibly replaces, then carry
//! the accumulated context forward.

pub mod ancestry;
pub mod error;
pub mod search;

pub use ancestry::{detect_evolution, AncestryPropagator, Enrichment, MatchedAncestor};
pub use error::QueryError;
pub use search::{ScoredShadow, SearchOptions, SimilarityEngine};
