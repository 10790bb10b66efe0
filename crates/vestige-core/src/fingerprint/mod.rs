pub mod compare;
pub mod engine;

pub use compare::compare_dna;
pub use engine::{compute_dna, semantic_fingerprint};
