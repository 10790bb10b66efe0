pub mod settings;

pub use settings::{MatchThresholds, RegistryConfig, SimilarityWeights, StoreSettings};
