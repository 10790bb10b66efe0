pub mod lineage;
pub mod matching;

pub use lineage::{
    validate_for_lineage, Confidence, LineageValidation, ValidationOptions, RECOGNIZED_VERBS,
};
pub use matching::{validate_match, MatchDecision};
