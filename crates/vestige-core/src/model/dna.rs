use serde::{Deserialize, Serialize};

/// Sentinel hash values used when an atom has no data flow to fingerprint.
/// Atoms without data flow (config files, trivial re-exports) must still be
/// trackable, just with minimal fidelity.
pub const SENTINEL_STRUCTURAL_HASH: &str = "0000000000000000";
pub const SENTINEL_PATTERN_HASH: &str = "000000000000";
pub const SENTINEL_DNA_ID: &str = "0000000000000000";

/// Fingerprint label when no semantic analysis is available.
pub const UNKNOWN_FINGERPRINT: &str = "unknown";

/// Coarse classification of an atom's data flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowType {
    ReadTransformPersistReturn,
    ReadTransformReturn,
    ReadPersist,
    TransformReturn,
    ReadReturn,
    SideEffectOnly,
    Unknown,
}

impl FlowType {
    /// Whether this flow involves reading external data.
    pub fn involves_read(self) -> bool {
        matches!(
            self,
            FlowType::ReadTransformPersistReturn
                | FlowType::ReadTransformReturn
                | FlowType::ReadPersist
                | FlowType::ReadReturn
        )
    }

    /// Whether this flow involves persisting data or other side effects.
    pub fn involves_persist(self) -> bool {
        matches!(
            self,
            FlowType::ReadTransformPersistReturn | FlowType::ReadPersist | FlowType::SideEffectOnly
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowType::ReadTransformPersistReturn => "read-transform-persist-return",
            FlowType::ReadTransformReturn => "read-transform-return",
            FlowType::ReadPersist => "read-persist",
            FlowType::TransformReturn => "transform-return",
            FlowType::ReadReturn => "read-return",
            FlowType::SideEffectOnly => "side-effect-only",
            FlowType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural/behavioral fingerprint of an atom, immutable once computed.
///
/// Two DNAs with identical `(structural_hash, pattern_hash,
/// semantic_fingerprint)` triples have identical `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dna {
    /// 16 hex chars derived from the other hashes.
    pub id: String,
    /// 16 hex chars over the name-erased structural shape.
    pub structural_hash: String,
    /// 12 hex chars over the ordered transformation operations.
    pub pattern_hash: String,
    pub flow_type: FlowType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operation_sequence: Vec<String>,
    /// 1..=10.
    pub complexity_score: u8,
    #[serde(default)]
    pub input_count: usize,
    #[serde(default)]
    pub output_count: usize,
    #[serde(default)]
    pub transformation_count: usize,
    /// `verb:domain:entity`, or `unknown` when no semantic analysis exists.
    pub semantic_fingerprint: String,
}

impl Dna {
    /// Check internal consistency. Never fails hard; callers decide what an
    /// invalid DNA means for them.
    pub fn validate(&self) -> DnaValidation {
        let mut errors = Vec::new();
        if self.id.is_empty() {
            errors.push("missing dna id".to_string());
        }
        if self.structural_hash.is_empty() {
            errors.push("missing structural hash".to_string());
        }
        if self.pattern_hash.is_empty() {
            errors.push("missing pattern hash".to_string());
        }
        if self.flow_type == FlowType::Unknown {
            errors.push("flow type is unknown".to_string());
        }
        if !(1..=10).contains(&self.complexity_score) {
            errors.push(format!(
                "complexity score {} outside 1..=10",
                self.complexity_score
            ));
        }
        DnaValidation {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Whether this is the sentinel fingerprint of a flow-less atom.
    pub fn is_sentinel(&self) -> bool {
        self.structural_hash == SENTINEL_STRUCTURAL_HASH
            && self.pattern_hash == SENTINEL_PATTERN_HASH
    }
}

/// Outcome of [`Dna::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnaValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// The reduced fingerprint snapshot stored in a shadow's inheritance block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DnaFingerprint {
    pub structural_hash: String,
    pub pattern_hash: String,
    pub flow_type: FlowType,
}

impl From<&Dna> for DnaFingerprint {
    fn from(dna: &Dna) -> Self {
        Self {
            structural_hash: dna.structural_hash.clone(),
            pattern_hash: dna.pattern_hash.clone(),
            flow_type: dna.flow_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dna() -> Dna {
        Dna {
            id: "abcdef0123456789".into(),
            structural_hash: "1111222233334444".into(),
            pattern_hash: "aaaabbbbcccc".into(),
            flow_type: FlowType::ReadReturn,
            operation_sequence: vec!["receive".into(), "read".into(), "return".into()],
            complexity_score: 3,
            input_count: 1,
            output_count: 1,
            transformation_count: 1,
            semantic_fingerprint: "get:user:User".into(),
        }
    }

    #[test]
    fn test_validate_ok() {
        let report = make_dna().validate();
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_validate_unknown_flow_and_bad_complexity() {
        let mut dna = make_dna();
        dna.flow_type = FlowType::Unknown;
        dna.complexity_score = 0;
        let report = dna.validate();
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_validate_missing_hashes() {
        let mut dna = make_dna();
        dna.id.clear();
        dna.structural_hash.clear();
        dna.pattern_hash.clear();
        let report = dna.validate();
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn test_flow_type_wire_format() {
        let json = serde_json::to_string(&FlowType::ReadTransformPersistReturn).unwrap();
        assert_eq!(json, "\"read-transform-persist-return\"");
        let parsed: FlowType = serde_json::from_str("\"side-effect-only\"").unwrap();
        assert_eq!(parsed, FlowType::SideEffectOnly);
    }

    #[test]
    fn test_flow_type_families() {
        assert!(FlowType::ReadPersist.involves_read());
        assert!(FlowType::ReadPersist.involves_persist());
        assert!(FlowType::SideEffectOnly.involves_persist());
        assert!(!FlowType::TransformReturn.involves_read());
        assert!(!FlowType::ReadReturn.involves_persist());
        assert!(!FlowType::Unknown.involves_read());
    }

    #[test]
    fn test_dna_serde_roundtrip() {
        let dna = make_dna();
        let json = serde_json::to_string(&dna).unwrap();
        let parsed: Dna = serde_json::from_str(&json).unwrap();
        assert_eq!(dna, parsed);
    }
}
