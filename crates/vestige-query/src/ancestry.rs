use vestige_core::config::RegistryConfig;
use vestige_core::fingerprint::compute_dna;
use vestige_core::model::ancestry::{Ancestry, AncestryWarning};
use vestige_core::model::atom::Atom;
use vestige_core::model::dna::Dna;
use vestige_core::model::shadow::{EvolutionType, Shadow, ShadowId};
use vestige_core::storage::ShadowStore;

use crate::error::QueryError;
use crate::search::{ScoredShadow, SimilarityEngine};

/// A successor must be this much simpler than its ancestor before a
/// complexity-drop warning fires.
const COMPLEXITY_DROP_GAP: u8 = 3;

/// The ancestor a live atom was linked to during enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedAncestor {
    pub shadow_id: ShadowId,
    pub similarity: f64,
    pub evolution: EvolutionType,
}

/// Result of enriching a live atom with ancestry.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub ancestry: Ancestry,
    /// `None` for genesis atoms.
    pub matched: Option<MatchedAncestor>,
}

impl Enrichment {
    pub fn is_genesis(&self) -> bool {
        self.matched.is_none()
    }
}

/// Links new atoms to their most plausible dead ancestor and carries the
/// accumulated context forward.
pub struct AncestryPropagator {
    engine: SimilarityEngine,
}

impl AncestryPropagator {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            engine: SimilarityEngine::new(config),
        }
    }

    /// Attach ancestry to a newly appeared atom.
    ///
    /// The atom is fingerprinted first if needed. Without a plausible
    /// ancestor the atom is genesis (generation 0, empty lineage). With
    /// one, inheritance is propagated and the matched shadow is marked
    /// replaced by this atom, the one write this operation performs.
    pub fn enrich_with_ancestry(
        &self,
        store: &ShadowStore,
        atom: &mut Atom,
    ) -> Result<Enrichment, QueryError> {
        if atom.dna.is_none() {
            atom.dna = Some(compute_dna(atom));
        }

        let Some(ScoredShadow { shadow, similarity }) =
            self.engine.find_best_match(store, atom)?
        else {
            let ancestry = Ancestry::genesis();
            atom.ancestry = Some(ancestry.clone());
            return Ok(Enrichment {
                ancestry,
                matched: None,
            });
        };

        let ancestry = self.propagate_inheritance(store, &shadow, atom, similarity)?;
        let evolution = detect_evolution(Some(&shadow.dna), atom.dna.as_ref());
        store.mark_replaced_as(&shadow.shadow_id, &atom.id, Some(evolution))?;

        atom.ancestry = Some(ancestry.clone());
        Ok(Enrichment {
            ancestry,
            matched: Some(MatchedAncestor {
                shadow_id: shadow.shadow_id,
                similarity,
                evolution,
            }),
        })
    }

    /// Compute the ancestry a successor inherits from a matched shadow.
    /// Pure with respect to the store: reads the ancestor chain, writes
    /// nothing.
    pub fn propagate_inheritance(
        &self,
        store: &ShadowStore,
        shadow: &Shadow,
        atom: &Atom,
        similarity: f64,
    ) -> Result<Ancestry, QueryError> {
        tracing::debug!(
            "Propagating inheritance from {} to {} (similarity {similarity:.2})",
            shadow.shadow_id,
            atom.id
        );

        // Root-first chain, flipped to nearest-ancestor-first.
        let lineage: Vec<ShadowId> = store
            .get_lineage(&shadow.shadow_id)?
            .into_iter()
            .rev()
            .collect();

        let targets = atom.connection_targets();
        let mut strong_connections = Vec::new();
        let mut lost_targets = Vec::new();
        for connection in &shadow.inheritance.connections {
            if targets.contains(connection.target.as_str()) {
                strong_connections.push(connection.clone());
            } else {
                lost_targets.push(connection.target.clone());
            }
        }

        let mut warnings = Vec::new();
        if !lost_targets.is_empty() {
            warnings.push(AncestryWarning::RupturedLineage {
                count: lost_targets.len(),
                lost_targets,
            });
        }
        if let Some(dna) = &atom.dna {
            if shadow.dna.complexity_score > dna.complexity_score + COMPLEXITY_DROP_GAP {
                warnings.push(AncestryWarning::ComplexityDrop {
                    ancestor: shadow.dna.complexity_score,
                    current: dna.complexity_score,
                });
            }
            if shadow.dna.flow_type != dna.flow_type {
                warnings.push(AncestryWarning::FlowTypeChange {
                    ancestor: shadow.dna.flow_type,
                    current: dna.flow_type,
                });
            }
        }

        Ok(Ancestry {
            replaced: Some(shadow.shadow_id.clone()),
            lineage,
            generation: shadow.lineage.generation + 1,
            // Historical significance travels unchanged; it is never
            // recomputed from the live atom.
            vibration_score: shadow.inheritance.vibration_score,
            strong_connections,
            warnings,
        })
    }
}

/// Classify how a successor relates to its dead ancestor.
///
/// Missing DNA on either side falls back to `Refactor`, the conservative
/// default.
pub fn detect_evolution(ancestor: Option<&Dna>, successor: Option<&Dna>) -> EvolutionType {
    let (Some(old), Some(new)) = (ancestor, successor) else {
        return EvolutionType::Refactor;
    };
    if old.structural_hash == new.structural_hash {
        EvolutionType::Renamed
    } else if old.pattern_hash == new.pattern_hash {
        if new.complexity_score > old.complexity_score {
            EvolutionType::Expanded
        } else if new.complexity_score < old.complexity_score {
            EvolutionType::Shrunk
        } else {
            EvolutionType::Refactor
        }
    } else if old.semantic_fingerprint != new.semantic_fingerprint {
        EvolutionType::DomainChange
    } else {
        EvolutionType::Reimplemented
    }
}
