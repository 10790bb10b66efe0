pub mod ancestry;
pub mod atom;
pub mod dna;
pub mod shadow;

pub use ancestry::{vibration_score, vibration_score_parts, Ancestry, AncestryWarning};
pub use atom::{
    Atom, AtomId, Connection, DataFlow, FlowInput, FlowOutput, Semantic, Standardized,
    TransformSource, Transformation,
};
pub use dna::{Dna, DnaFingerprint, DnaValidation, FlowType};
pub use shadow::{
    DeathRecord, EvolutionType, FlowSummary, Inheritance, SemanticSummary, Shadow, ShadowId,
    ShadowLineage, ShadowMetadata, ShadowStatus,
};
