use crate::config::{MatchThresholds, SimilarityWeights};
use crate::fingerprint::compare_dna;
use crate::model::atom::Atom;
use crate::model::shadow::Shadow;

/// Verdict on one candidate ancestor/descendant pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    pub valid: bool,
    pub similarity: f64,
    pub reason: Option<String>,
}

impl MatchDecision {
    fn reject(similarity: f64, reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            similarity,
            reason: Some(reason.into()),
        }
    }
}

/// Score and gate a candidate pair.
///
/// Rejects below the similarity floor. Above the semantic-guard threshold a
/// pair whose semantic verbs differ AND whose domains differ is rejected
/// even on a near-perfect structural match: two structurally identical but
/// unrelated functions (say, two CRUD getters over different tables) must
/// not be linked.
pub fn validate_match(
    atom: &Atom,
    shadow: &Shadow,
    weights: &SimilarityWeights,
    thresholds: &MatchThresholds,
) -> MatchDecision {
    let Some(dna) = &atom.dna else {
        return MatchDecision::reject(0.0, "atom has no fingerprint");
    };

    let similarity = compare_dna(dna, &shadow.dna, weights);
    if similarity < thresholds.min_match_similarity {
        return MatchDecision::reject(
            similarity,
            format!(
                "similarity {similarity:.2} below threshold {:.2}",
                thresholds.min_match_similarity
            ),
        );
    }

    if similarity > thresholds.semantic_guard {
        let atom_verb = atom.semantic.as_ref().and_then(|s| s.verb.as_deref());
        let atom_domain = atom.semantic.as_ref().and_then(|s| s.domain.as_deref());
        let shadow_semantic = shadow.metadata.semantic.as_ref();
        let shadow_verb = shadow_semantic.and_then(|s| s.verb.as_deref());
        let shadow_domain = shadow_semantic.and_then(|s| s.domain.as_deref());
        if atom_verb != shadow_verb && atom_domain != shadow_domain {
            return MatchDecision::reject(
                similarity,
                format!(
                    "semantic mismatch: verb {:?} vs {:?}, domain {:?} vs {:?}",
                    atom_verb, shadow_verb, atom_domain, shadow_domain
                ),
            );
        }
    }

    MatchDecision {
        valid: true,
        similarity,
        reason: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::compute_dna;
    use crate::model::atom::{DataFlow, FlowInput, FlowOutput, Semantic, Transformation};
    use crate::model::dna::DnaFingerprint;
    use crate::model::shadow::{
        DeathRecord, Inheritance, SemanticSummary, Shadow, ShadowLineage, ShadowMetadata,
        ShadowStatus,
    };
    use chrono::Utc;

    fn make_atom(verb: &str, domain: &str) -> Atom {
        let mut atom = Atom::new("fn_live", "liveFn");
        atom.data_flow = Some(DataFlow {
            inputs: vec![FlowInput {
                name: Some("id".into()),
                ty: Some("string".into()),
                usage: vec!["read".into()],
            }],
            outputs: vec![FlowOutput {
                ty: Some("Row".into()),
                target: None,
                side_effect: false,
            }],
            transformations: vec![Transformation {
                operation: Some("fetch".into()),
                from: None,
            }],
        });
        atom.semantic = Some(Semantic {
            verb: Some(verb.into()),
            domain: Some(domain.into()),
            entity: Some("Row".into()),
            operation_type: Some("query".into()),
        });
        atom.dna = Some(compute_dna(&atom));
        atom
    }

    fn shadow_of(atom: &Atom) -> Shadow {
        let dna = atom.dna.clone().unwrap();
        Shadow {
            shadow_id: "deadbeef".into(),
            original_id: atom.id.clone(),
            status: ShadowStatus::Deleted,
            replaced_by: None,
            born_at: Utc::now(),
            died_at: Utc::now(),
            lifespan_days: 0,
            dna: dna.clone(),
            metadata: ShadowMetadata {
                name: atom.name.clone(),
                flow: None,
                semantic: atom.semantic.as_ref().map(|s| SemanticSummary {
                    verb: s.verb.clone(),
                    domain: s.domain.clone(),
                    entity: s.entity.clone(),
                }),
                file_path: None,
                line_number: None,
                is_exported: false,
            },
            lineage: ShadowLineage::default(),
            inheritance: Inheritance {
                connections: vec![],
                connection_count: 0,
                vibration_score: 0.0,
                dna_fingerprint: DnaFingerprint::from(&dna),
            },
            death: DeathRecord::default(),
        }
    }

    #[test]
    fn test_accepts_identical_pair() {
        let atom = make_atom("get", "user");
        let shadow = shadow_of(&atom);
        let decision = validate_match(
            &atom,
            &shadow,
            &SimilarityWeights::default(),
            &MatchThresholds::default(),
        );
        assert!(decision.valid);
        assert!((decision.similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_missing_fingerprint() {
        let mut atom = make_atom("get", "user");
        let shadow = shadow_of(&atom);
        atom.dna = None;
        let decision = validate_match(
            &atom,
            &shadow,
            &SimilarityWeights::default(),
            &MatchThresholds::default(),
        );
        assert!(!decision.valid);
        assert_eq!(decision.similarity, 0.0);
    }

    #[test]
    fn test_semantic_guard_rejects_unrelated_twins() {
        // Structurally identical atoms with different verb AND domain:
        // similarity is far above the guard, but the pair must be rejected.
        let dead = make_atom("get", "user");
        let shadow = shadow_of(&dead);
        let live = make_atom("delete", "invoice");
        let decision = validate_match(
            &live,
            &shadow,
            &SimilarityWeights::default(),
            &MatchThresholds::default(),
        );
        assert!(decision.similarity > 0.8, "got {}", decision.similarity);
        assert!(!decision.valid);
        assert!(decision.reason.unwrap().contains("semantic mismatch"));
    }

    #[test]
    fn test_shared_domain_survives_the_guard() {
        let dead = make_atom("get", "user");
        let shadow = shadow_of(&dead);
        let live = make_atom("fetch", "user");
        let decision = validate_match(
            &live,
            &shadow,
            &SimilarityWeights::default(),
            &MatchThresholds::default(),
        );
        assert!(decision.valid, "reason: {:?}", decision.reason);
    }

    #[test]
    fn test_rejects_below_similarity_floor() {
        let dead = make_atom("get", "user");
        let shadow = shadow_of(&dead);
        let mut live = Atom::new("fn_other", "emitter");
        live.data_flow = Some(DataFlow {
            inputs: vec![],
            outputs: vec![FlowOutput {
                ty: Some("void".into()),
                target: Some("bus".into()),
                side_effect: true,
            }],
            transformations: vec![
                Transformation {
                    operation: Some("serialize".into()),
                    from: None,
                },
                Transformation {
                    operation: Some("write".into()),
                    from: None,
                },
            ],
        });
        live.dna = Some(compute_dna(&live));
        let decision = validate_match(
            &live,
            &shadow,
            &SimilarityWeights::default(),
            &MatchThresholds::default(),
        );
        assert!(!decision.valid);
        assert!(decision.reason.unwrap().contains("below threshold"));
    }
}
