use vestige_core::config::RegistryConfig;
use vestige_core::fingerprint::compare_dna;
use vestige_core::model::atom::Atom;
use vestige_core::model::dna::FlowType;
use vestige_core::model::shadow::{Shadow, ShadowStatus};
use vestige_core::storage::ShadowStore;
use vestige_core::validate::validate_match;

use crate::error::QueryError;

/// Options for a similarity search. Unset fields fall back to the
/// configured thresholds.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub min_similarity: Option<f64>,
    pub limit: Option<usize>,
    pub include_replaced: bool,
}

/// A candidate ancestor together with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredShadow {
    pub shadow: Shadow,
    pub similarity: f64,
}

/// Ranks shadows by fingerprint similarity against a live atom.
pub struct SimilarityEngine {
    config: RegistryConfig,
}

impl SimilarityEngine {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    /// Find shadows similar to the given atom, best first.
    ///
    /// Candidate generation scans index entries only: shadows already
    /// replaced are skipped (unless asked for), and so are shadows with a
    /// different flow type. The flow-type prune is purely an I/O saving;
    /// a candidate with a different flow type can score at most 0.5, below
    /// every usable threshold, so the prune never hides a viable match.
    pub fn find_similar(
        &self,
        store: &ShadowStore,
        atom: &Atom,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredShadow>, QueryError> {
        let Some(dna) = &atom.dna else {
            return Ok(Vec::new());
        };
        if dna.flow_type == FlowType::Unknown {
            return Ok(Vec::new());
        }

        let min_similarity = options
            .min_similarity
            .unwrap_or(self.config.thresholds.min_search_similarity);
        let limit = options.limit.unwrap_or(self.config.thresholds.search_limit);

        let mut matches = Vec::new();
        for entry in store.index_snapshot() {
            if !options.include_replaced && entry.status == ShadowStatus::Replaced {
                continue;
            }
            if entry.flow_type != dna.flow_type {
                continue;
            }
            let Some(shadow) = store.get_shadow(&entry.shadow_id)? else {
                tracing::warn!("Indexed shadow {} missing on disk", entry.shadow_id);
                continue;
            };
            let similarity = compare_dna(dna, &shadow.dna, &self.config.weights);
            if similarity < min_similarity {
                continue;
            }
            let decision = validate_match(atom, &shadow, &self.config.weights, &self.config.thresholds);
            if !decision.valid {
                tracing::debug!(
                    "Rejected candidate {}: {}",
                    shadow.shadow_id,
                    decision.reason.as_deref().unwrap_or("no reason")
                );
                continue;
            }
            matches.push(ScoredShadow { shadow, similarity });
        }

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        Ok(matches)
    }

    /// The single best candidate at the (stricter) best-match threshold.
    pub fn find_best_match(
        &self,
        store: &ShadowStore,
        atom: &Atom,
    ) -> Result<Option<ScoredShadow>, QueryError> {
        let options = SearchOptions {
            min_similarity: Some(self.config.thresholds.best_match_similarity),
            limit: Some(1),
            include_replaced: false,
        };
        Ok(self.find_similar(store, atom, &options)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vestige_core::fingerprint::compute_dna;
    use vestige_core::model::atom::{DataFlow, FlowInput, FlowOutput, Semantic, Transformation};
    use vestige_core::storage::DeathContext;
    use tempfile::TempDir;

    fn make_atom(id: &str, name: &str, verb: &str, ops: &[&str]) -> Atom {
        let mut atom = Atom::new(id, name);
        atom.data_flow = Some(DataFlow {
            inputs: vec![FlowInput {
                name: Some("id".into()),
                ty: Some("string".into()),
                usage: vec!["read".into()],
            }],
            outputs: vec![FlowOutput {
                ty: Some("User".into()),
                target: None,
                side_effect: false,
            }],
            transformations: ops
                .iter()
                .map(|o| Transformation {
                    operation: Some(o.to_string()),
                    from: None,
                })
                .collect(),
        });
        atom.semantic = Some(Semantic {
            verb: Some(verb.into()),
            domain: Some("user".into()),
            entity: Some("User".into()),
            operation_type: Some("query".into()),
        });
        atom.dna = Some(compute_dna(&atom));
        atom
    }

    fn engine() -> SimilarityEngine {
        SimilarityEngine::new(RegistryConfig::default())
    }

    #[test]
    fn test_empty_store_finds_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = ShadowStore::open(tmp.path()).unwrap();
        let atom = make_atom("fn_a", "getUser", "get", &["fetch"]);
        let results = engine().find_similar(&store, &atom, &SearchOptions::default()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_finds_identical_twin() {
        let tmp = TempDir::new().unwrap();
        let store = ShadowStore::open(tmp.path()).unwrap();

        let dead = make_atom("fn_old", "getUser", "get", &["fetch"]);
        let shadow = store.create_shadow(&dead, DeathContext::default()).unwrap();

        let live = make_atom("fn_new", "fetchUser", "get", &["fetch"]);
        let results = engine().find_similar(&store, &live, &SearchOptions::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].shadow.shadow_id, shadow.shadow_id);
        assert!((results[0].similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_or_unknown_dna_short_circuits() {
        let tmp = TempDir::new().unwrap();
        let store = ShadowStore::open(tmp.path()).unwrap();
        let dead = make_atom("fn_old", "getUser", "get", &["fetch"]);
        store.create_shadow(&dead, DeathContext::default()).unwrap();

        let mut no_dna = make_atom("fn_a", "getUser", "get", &["fetch"]);
        no_dna.dna = None;
        assert!(engine()
            .find_similar(&store, &no_dna, &SearchOptions::default())
            .unwrap()
            .is_empty());

        // Sentinel DNA has an unknown flow type.
        let mut flowless = Atom::new("fn_b", "config");
        flowless.dna = Some(compute_dna(&flowless));
        assert!(engine()
            .find_similar(&store, &flowless, &SearchOptions::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_replaced_shadows_are_pruned_unless_requested() {
        let tmp = TempDir::new().unwrap();
        let store = ShadowStore::open(tmp.path()).unwrap();

        let dead = make_atom("fn_old", "getUser", "get", &["fetch"]);
        let shadow = store.create_shadow(&dead, DeathContext::default()).unwrap();
        store.mark_replaced(&shadow.shadow_id, &"fn_mid".into()).unwrap();

        let live = make_atom("fn_new", "getUser", "get", &["fetch"]);
        let default = engine().find_similar(&store, &live, &SearchOptions::default()).unwrap();
        assert!(default.is_empty());

        let with_replaced = engine()
            .find_similar(
                &store,
                &live,
                &SearchOptions {
                    include_replaced: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(with_replaced.len(), 1);
    }

    #[test]
    fn test_ranking_and_limit() {
        let tmp = TempDir::new().unwrap();
        let store = ShadowStore::open(tmp.path()).unwrap();

        // An identical twin, and a cousin with the same flow and pattern
        // but a different input type: scores 0.6, clearing the match floor
        // but ranking below the twin.
        let twin = make_atom("fn_twin", "getUser", "get", &["fetch"]);
        let twin_shadow = store.create_shadow(&twin, DeathContext::default()).unwrap();
        let mut cousin = make_atom("fn_cousin", "getAccount", "get", &["fetch"]);
        cousin.data_flow.as_mut().unwrap().inputs[0].ty = Some("number".into());
        cousin.dna = Some(compute_dna(&cousin));
        store.create_shadow(&cousin, DeathContext::default()).unwrap();

        let live = make_atom("fn_live", "getUser", "get", &["fetch"]);
        let results = engine()
            .find_similar(
                &store,
                &live,
                &SearchOptions {
                    min_similarity: Some(0.5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].shadow.shadow_id, twin_shadow.shadow_id);
        assert!(results[0].similarity > results[1].similarity);

        let top_one = engine()
            .find_similar(
                &store,
                &live,
                &SearchOptions {
                    min_similarity: Some(0.5),
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].shadow.shadow_id, twin_shadow.shadow_id);
    }

    #[test]
    fn test_best_match_uses_strict_threshold() {
        let tmp = TempDir::new().unwrap();
        let store = ShadowStore::open(tmp.path()).unwrap();

        // Same flow type and pattern, different input shape: similarity
        // 0.6, well under the 0.85 best-match floor.
        let mut distant = make_atom("fn_far", "getOrder", "get", &["fetch"]);
        distant.data_flow.as_mut().unwrap().inputs[0].ty = Some("number".into());
        distant.dna = Some(compute_dna(&distant));
        store.create_shadow(&distant, DeathContext::default()).unwrap();

        let live = make_atom("fn_live", "getUser", "get", &["fetch"]);
        let best = engine().find_best_match(&store, &live).unwrap();
        assert!(best.is_none());
    }
}
