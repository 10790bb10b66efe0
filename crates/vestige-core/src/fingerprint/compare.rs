use crate::config::SimilarityWeights;
use crate::model::dna::Dna;

/// Weighted similarity between two fingerprints, in `[0, 1]`.
///
/// Each comparison category contributes its weight to the normalizer
/// whether or not it scores, so the result stays in range for any weight
/// configuration, not just ones that sum to 1.
pub fn compare_dna(a: &Dna, b: &Dna, weights: &SimilarityWeights) -> f64 {
    let mut score = 0.0;
    let mut applied = 0.0;

    applied += weights.structural;
    if a.structural_hash == b.structural_hash {
        score += weights.structural;
    }

    applied += weights.pattern;
    if a.pattern_hash == b.pattern_hash {
        score += weights.pattern;
    } else if a.flow_type == b.flow_type {
        // Partial credit: same shape of work, different detail.
        score += weights.flow_type;
    }

    applied += weights.sequence;
    if a.operation_sequence == b.operation_sequence {
        score += weights.sequence;
    } else if a.operation_sequence.len() == b.operation_sequence.len() {
        score += weights.sequence_length;
    }

    applied += weights.semantic;
    if a.semantic_fingerprint == b.semantic_fingerprint {
        score += weights.semantic;
    }

    if applied <= 0.0 {
        return 0.0;
    }
    score / applied
}
