use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

use super::ancestry::Ancestry;
use super::dna::Dna;

/// Identifier of a tracked code entity. Assigned by the upstream extraction
/// layer, opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtomId(pub String);

impl AtomId {
    /// Parse and validate an ID string. Must be non-empty.
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(CoreError::InvalidId("atom ID must not be empty".into()));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AtomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AtomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AtomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for AtomId {
    fn default() -> Self {
        Self(String::new())
    }
}

/// A tracked code entity (typically a function) as produced by the upstream
/// extraction layer.
///
/// Everything except `dna` and `ancestry` is consumed read-only; those two
/// slots are filled by the fingerprint engine and the ancestry propagator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Atom {
    pub id: AtomId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default)]
    pub is_exported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_flow: Option<DataFlow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<Semantic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standardized: Option<Standardized>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dna: Option<Dna>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestry: Option<Ancestry>,
}

impl Atom {
    /// Create a bare atom with the given identity. Used mostly by tests and
    /// by callers assembling atoms field by field.
    pub fn new(id: impl Into<AtomId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Targets of this atom's current connections, for rupture detection.
    pub fn connection_targets(&self) -> std::collections::HashSet<&str> {
        self.connections.iter().map(|c| c.target.as_str()).collect()
    }
}

/// Data-flow description extracted from the atom's body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DataFlow {
    #[serde(default)]
    pub inputs: Vec<FlowInput>,
    #[serde(default)]
    pub outputs: Vec<FlowOutput>,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
}

/// One declared input. The `name` is deliberately excluded from structural
/// fingerprinting; renaming a parameter must not change identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FlowInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    /// Usage-pattern tags, e.g. "read", "mutated", "iterated".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage: Vec<String>,
}

/// One transformation step inside the atom.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Transformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<TransformSource>,
}

impl Transformation {
    /// Arity of the step: 1 for a single source, the list length otherwise.
    pub fn arity(&self) -> usize {
        match &self.from {
            Some(TransformSource::Many(list)) => list.len(),
            _ => 1,
        }
    }
}

/// Source of a transformation: a single value or a list of values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TransformSource {
    One(String),
    Many(Vec<String>),
}

/// One produced output: a return value or a side effect.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FlowOutput {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub side_effect: bool,
}

/// Semantic analysis of the atom's name and role.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Semantic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
}

/// An edge from this atom to another entity it touches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
}

/// Result of upstream name standardization. Only its presence matters to
/// lineage validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Standardized {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_id_parse_validation() {
        assert!(AtomId::parse("fn_getUser").is_ok());
        assert!(AtomId::parse("").is_err());
        assert!(AtomId::parse("   ").is_err());
    }

    #[test]
    fn test_transformation_arity() {
        let single = Transformation {
            operation: Some("map".into()),
            from: Some(TransformSource::One("users".into())),
        };
        assert_eq!(single.arity(), 1);

        let multi = Transformation {
            operation: Some("merge".into()),
            from: Some(TransformSource::Many(vec!["a".into(), "b".into(), "c".into()])),
        };
        assert_eq!(multi.arity(), 3);

        let bare = Transformation::default();
        assert_eq!(bare.arity(), 1);
    }

    #[test]
    fn test_atom_serde_roundtrip() {
        let atom = Atom {
            id: "fn_a1".into(),
            name: "getUser".into(),
            created_at: Some(Utc::now()),
            file_path: Some("src/users.ts".into()),
            line_number: Some(42),
            is_exported: true,
            data_flow: Some(DataFlow {
                inputs: vec![FlowInput {
                    name: Some("userId".into()),
                    ty: Some("string".into()),
                    usage: vec!["read".into()],
                }],
                outputs: vec![FlowOutput {
                    ty: Some("User".into()),
                    target: None,
                    side_effect: false,
                }],
                transformations: vec![Transformation {
                    operation: Some("fetch".into()),
                    from: Some(TransformSource::One("db".into())),
                }],
            }),
            semantic: Some(Semantic {
                verb: Some("get".into()),
                domain: Some("user".into()),
                entity: Some("User".into()),
                operation_type: Some("query".into()),
            }),
            connections: vec![Connection {
                target: "fn_b2".into(),
                kind: "calls".into(),
                weight: 0.8,
                via: Some("import".into()),
            }],
            standardized: None,
            dna: None,
            ancestry: None,
        };
        let json = serde_json::to_string_pretty(&atom).unwrap();
        let parsed: Atom = serde_json::from_str(&json).unwrap();
        assert_eq!(atom, parsed);
    }

    #[test]
    fn test_transform_source_untagged() {
        let json = r#"{"operation":"merge","from":["a","b"]}"#;
        let t: Transformation = serde_json::from_str(json).unwrap();
        assert_eq!(t.arity(), 2);

        let json = r#"{"operation":"map","from":"xs"}"#;
        let t: Transformation = serde_json::from_str(json).unwrap();
        assert_eq!(t.arity(), 1);
    }

    #[test]
    fn test_connection_targets() {
        let mut atom = Atom::new("fn_x", "handler");
        atom.connections = vec![
            Connection {
                target: "fn_y".into(),
                kind: "calls".into(),
                weight: 1.0,
                via: None,
            },
            Connection {
                target: "fn_z".into(),
                kind: "reads".into(),
                weight: 0.5,
                via: None,
            },
        ];
        let targets = atom.connection_targets();
        assert!(targets.contains("fn_y"));
        assert!(targets.contains("fn_z"));
        assert!(!targets.contains("fn_w"));
    }
}
