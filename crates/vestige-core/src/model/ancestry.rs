use serde::{Deserialize, Serialize};

use super::atom::{Atom, Connection};
use super::dna::{Dna, FlowType};
use super::shadow::ShadowId;

/// Complexity factor assumed for atoms that die before being fingerprinted.
const DEFAULT_COMPLEXITY_FACTOR: f64 = 5.0;

/// Lineage metadata attached to a live atom after enrichment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ancestry {
    /// The shadow this atom replaced; absent for genesis atoms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced: Option<ShadowId>,
    /// Ancestor shadow ids, nearest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lineage: Vec<ShadowId>,
    /// 0 for genesis.
    #[serde(default)]
    pub generation: u32,
    /// Carried forward unchanged from the matched shadow; historical
    /// significance, never recomputed from the live atom.
    #[serde(default)]
    pub vibration_score: f64,
    /// Inherited connections whose targets the new atom still touches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strong_connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<AncestryWarning>,
}

impl Ancestry {
    /// Ancestry of an atom with no detected ancestor.
    pub fn genesis() -> Self {
        Self::default()
    }

    pub fn is_genesis(&self) -> bool {
        self.replaced.is_none()
    }
}

/// Notices raised while propagating inheritance to a successor atom.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AncestryWarning {
    /// Connections present on the ancestor but gone from the successor.
    RupturedLineage {
        count: usize,
        lost_targets: Vec<String>,
    },
    /// The successor is markedly simpler than its ancestor.
    ComplexityDrop { ancestor: u8, current: u8 },
    /// The successor does a different shape of work.
    FlowTypeChange {
        ancestor: FlowType,
        current: FlowType,
    },
}

/// Heuristic measure of an atom's historical connectivity and significance,
/// snapshotted into a shadow's inheritance block at death registration.
///
/// `clamp(avg(weight) * connection_count * complexity_factor / 100, 0, 1)`.
pub fn vibration_score(atom: &Atom) -> f64 {
    vibration_score_parts(&atom.connections, atom.dna.as_ref())
}

/// Same as [`vibration_score`], for callers that fingerprinted the atom
/// separately from the record they hold.
pub fn vibration_score_parts(connections: &[Connection], dna: Option<&Dna>) -> f64 {
    if connections.is_empty() {
        return 0.0;
    }
    let count = connections.len() as f64;
    let avg_weight = connections.iter().map(|c| c.weight).sum::<f64>() / count;
    let complexity_factor = dna
        .map(|d| f64::from(d.complexity_score))
        .unwrap_or(DEFAULT_COMPLEXITY_FACTOR);
    (avg_weight * count * complexity_factor / 100.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Connection;

    fn conn(target: &str, weight: f64) -> Connection {
        Connection {
            target: target.into(),
            kind: "calls".into(),
            weight,
            via: None,
        }
    }

    #[test]
    fn test_genesis_ancestry() {
        let ancestry = Ancestry::genesis();
        assert!(ancestry.is_genesis());
        assert_eq!(ancestry.generation, 0);
        assert!(ancestry.lineage.is_empty());
        assert_eq!(ancestry.vibration_score, 0.0);
    }

    #[test]
    fn test_vibration_score_no_connections() {
        let atom = Atom::new("fn_a", "isolated");
        assert_eq!(vibration_score(&atom), 0.0);
    }

    #[test]
    fn test_vibration_score_default_complexity_factor() {
        let mut atom = Atom::new("fn_a", "hub");
        atom.connections = vec![conn("x", 0.5), conn("y", 0.5)];
        // avg 0.5 * 2 connections * default factor 5 / 100 = 0.05
        assert!((vibration_score(&atom) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_vibration_score_clamped() {
        let mut atom = Atom::new("fn_a", "superhub");
        atom.connections = (0..60).map(|i| conn(&format!("t{i}"), 5.0)).collect();
        assert_eq!(vibration_score(&atom), 1.0);
    }

    #[test]
    fn test_warning_wire_format() {
        let warning = AncestryWarning::RupturedLineage {
            count: 2,
            lost_targets: vec!["fn_gone".into(), "fn_lost".into()],
        };
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("\"kind\":\"ruptured_lineage\""));
        let parsed: AncestryWarning = serde_json::from_str(&json).unwrap();
        assert_eq!(warning, parsed);
    }
}
