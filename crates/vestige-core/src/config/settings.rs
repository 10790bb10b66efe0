use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const CONFIG_FILE: &str = "config.json";

/// Weights for the DNA similarity score. Partial-credit weights apply only
/// when the corresponding full-credit comparison fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimilarityWeights {
    /// Equal structural hashes.
    pub structural: f64,
    /// Equal pattern hashes.
    pub pattern: f64,
    /// Equal flow types when the pattern hashes differ.
    pub flow_type: f64,
    /// Exactly equal operation sequences.
    pub sequence: f64,
    /// Same-length operation sequences with different content.
    pub sequence_length: f64,
    /// Equal semantic fingerprints.
    pub semantic: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            structural: 0.4,
            pattern: 0.3,
            flow_type: 0.15,
            sequence: 0.2,
            sequence_length: 0.1,
            semantic: 0.1,
        }
    }
}

/// Gates applied when linking a live atom to a candidate ancestor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchThresholds {
    /// Below this, a candidate pair is rejected outright.
    pub min_match_similarity: f64,
    /// Above this, differing semantic verb AND domain reject the pair.
    /// Guards against structurally identical but unrelated functions.
    pub semantic_guard: f64,
    /// Default floor for similarity search results.
    pub min_search_similarity: f64,
    /// Floor for accepting a best match during ancestry enrichment.
    pub best_match_similarity: f64,
    /// Default result cap for similarity search.
    pub search_limit: usize,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            min_match_similarity: 0.6,
            semantic_guard: 0.8,
            min_search_similarity: 0.75,
            best_match_similarity: 0.85,
            search_limit: 5,
        }
    }
}

/// Tunables for the on-disk shadow store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreSettings {
    /// Point-lookup cache capacity. Eviction is FIFO, not LRU.
    pub cache_capacity: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { cache_capacity: 100 }
    }
}

/// Full configuration for a shadow registry, persisted as `config.json`
/// in the store root.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    pub weights: SimilarityWeights,
    pub thresholds: MatchThresholds,
    pub store: StoreSettings,
}

impl RegistryConfig {
    /// Load config from the store root, falling back to defaults when the
    /// file does not exist.
    pub fn load(root: &Path) -> Result<Self, CoreError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)?;
        serde_json::from_str(&data)
            .map_err(|e| CoreError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Write config to the store root.
    pub fn save(&self, root: &Path) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("failed to serialize config: {e}")))?;
        fs::write(root.join(CONFIG_FILE), json)?;
        Ok(())
    }
}
