use sha2::{Digest, Sha256};

use crate::model::atom::{Atom, DataFlow};
use crate::model::dna::{
    Dna, FlowType, SENTINEL_DNA_ID, SENTINEL_PATTERN_HASH, SENTINEL_STRUCTURAL_HASH,
    UNKNOWN_FINGERPRINT,
};

/// Operation tags that read external data.
pub(crate) const READ_OPS: &[&str] = &["read", "fetch"];
/// Operation tags that persist data.
const WRITE_OPS: &[&str] = &["write", "persist", "save", "store"];
/// Tag substituted for a transformation without an operation.
const UNTAGGED_OP: &str = "unknown";

/// Derive an atom's fingerprint from its data-flow description.
///
/// Atoms without data flow get the sentinel fingerprint instead of an error;
/// they remain trackable with minimal fidelity.
pub fn compute_dna(atom: &Atom) -> Dna {
    let semantic = semantic_fingerprint(atom);
    let Some(flow) = &atom.data_flow else {
        return sentinel_dna(semantic);
    };

    let structural = structural_hash(flow);
    let pattern = pattern_hash(flow);
    let id = dna_id(&structural, &pattern, &semantic);

    Dna {
        id,
        structural_hash: structural,
        pattern_hash: pattern,
        flow_type: classify_flow(flow),
        operation_sequence: operation_sequence(flow),
        complexity_score: complexity_score(flow),
        input_count: flow.inputs.len(),
        output_count: flow.outputs.len(),
        transformation_count: flow.transformations.len(),
        semantic_fingerprint: semantic,
    }
}

/// `verb:domain:entity`, each slot defaulting to `unknown`; the bare
/// `unknown` literal when no semantic analysis exists at all.
pub fn semantic_fingerprint(atom: &Atom) -> String {
    match &atom.semantic {
        None => UNKNOWN_FINGERPRINT.to_string(),
        Some(semantic) => {
            let verb = semantic.verb.as_deref().unwrap_or(UNKNOWN_FINGERPRINT);
            let domain = semantic.domain.as_deref().unwrap_or(UNKNOWN_FINGERPRINT);
            let entity = semantic.entity.as_deref().unwrap_or(UNKNOWN_FINGERPRINT);
            format!("{verb}:{domain}:{entity}")
        }
    }
}

/// The DNA id is a pure function of the other hashes: identical
/// `(structural, pattern, semantic)` triples always yield identical ids.
fn dna_id(structural: &str, pattern: &str, semantic: &str) -> String {
    short_hash(&format!("{structural}:{pattern}:{semantic}"), 16)
}

fn sentinel_dna(semantic_fingerprint: String) -> Dna {
    Dna {
        id: SENTINEL_DNA_ID.to_string(),
        structural_hash: SENTINEL_STRUCTURAL_HASH.to_string(),
        pattern_hash: SENTINEL_PATTERN_HASH.to_string(),
        flow_type: FlowType::Unknown,
        operation_sequence: Vec::new(),
        complexity_score: 1,
        input_count: 0,
        output_count: 0,
        transformation_count: 0,
        semantic_fingerprint,
    }
}

/// Hash over the name-erased shape of the flow. Parameter names are
/// excluded on purpose: renaming must not change structural identity.
fn structural_hash(flow: &DataFlow) -> String {
    let mut parts = Vec::with_capacity(
        flow.inputs.len() + flow.transformations.len() + flow.outputs.len(),
    );
    for input in &flow.inputs {
        let mut usage: Vec<&str> = input.usage.iter().map(String::as_str).collect();
        usage.sort_unstable();
        parts.push(format!(
            "in:{}:{}",
            input.ty.as_deref().unwrap_or("any"),
            usage.join(",")
        ));
    }
    for t in &flow.transformations {
        parts.push(format!(
            "tx:{}:{}",
            t.operation.as_deref().unwrap_or(UNTAGGED_OP),
            t.arity()
        ));
    }
    for output in &flow.outputs {
        parts.push(format!(
            "out:{}:{}",
            output.ty.as_deref().unwrap_or("any"),
            u8::from(output.side_effect)
        ));
    }
    short_hash(&parts.join("|"), 16)
}

/// Hash over the ordered operation tags. Order matters: this is what
/// distinguishes read-then-write from write-then-read.
fn pattern_hash(flow: &DataFlow) -> String {
    let ops: Vec<&str> = flow
        .transformations
        .iter()
        .map(|t| t.operation.as_deref().unwrap_or(UNTAGGED_OP))
        .collect();
    short_hash(&ops.join("->"), 12)
}

fn classify_flow(flow: &DataFlow) -> FlowType {
    let has_read = flow
        .transformations
        .iter()
        .any(|t| matches_family(t.operation.as_deref(), READ_OPS));
    let has_write = flow.outputs.iter().any(|o| o.side_effect)
        || flow
            .transformations
            .iter()
            .any(|t| matches_family(t.operation.as_deref(), WRITE_OPS));
    let has_transform = flow.transformations.iter().any(|t| {
        !matches_family(t.operation.as_deref(), READ_OPS)
            && !matches_family(t.operation.as_deref(), WRITE_OPS)
    });
    let has_return = flow.outputs.iter().any(|o| !o.side_effect);

    if has_read && has_transform && has_write && has_return {
        FlowType::ReadTransformPersistReturn
    } else if has_read && has_transform && has_return {
        FlowType::ReadTransformReturn
    } else if has_read && has_write {
        FlowType::ReadPersist
    } else if has_transform && has_return {
        FlowType::TransformReturn
    } else if has_read && has_return {
        FlowType::ReadReturn
    } else if has_write {
        FlowType::SideEffectOnly
    } else {
        FlowType::Unknown
    }
}

fn matches_family(op: Option<&str>, family: &[&str]) -> bool {
    op.is_some_and(|op| family.contains(&op))
}

/// `receive` when inputs exist, each operation tag in order, then `emit`
/// per side effect and `return` per returned value.
fn operation_sequence(flow: &DataFlow) -> Vec<String> {
    let mut sequence = Vec::new();
    if !flow.inputs.is_empty() {
        sequence.push("receive".to_string());
    }
    for t in &flow.transformations {
        sequence.push(t.operation.clone().unwrap_or_else(|| UNTAGGED_OP.to_string()));
    }
    for output in &flow.outputs {
        sequence.push(if output.side_effect { "emit" } else { "return" }.to_string());
    }
    sequence
}

fn complexity_score(flow: &DataFlow) -> u8 {
    let side_effect_bonus = if flow.outputs.iter().any(|o| o.side_effect) {
        2.0
    } else {
        0.0
    };
    let raw = 1.0
        + 0.5 * flow.inputs.len() as f64
        + 0.8 * flow.transformations.len() as f64
        + 0.5 * flow.outputs.len() as f64
        + side_effect_bonus;
    raw.clamp(1.0, 10.0).round() as u8
}

/// SHA-256, hex-formatted, truncated to `len` chars.
fn short_hash(input: &str, len: usize) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(len);
    hex
}
