use serde::{Deserialize, Serialize};

use crate::fingerprint::engine::READ_OPS;
use crate::model::atom::Atom;
use crate::model::shadow::{FlowSummary, SemanticSummary, ShadowMetadata};

/// Verbs the semantic analyzer is expected to emit.
pub const RECOGNIZED_VERBS: &[&str] = &[
    "get", "set", "update", "delete", "validate", "process", "handle", "create", "fetch",
];

/// Operation tags that back up a `validate` verb claim.
const VALIDATION_OPS: &[&str] = &["validation", "check", "verify"];

/// Options for [`validate_for_lineage`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Promote semantic warnings to errors.
    pub strict: bool,
}

/// Confidence band derived from the validation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Report produced by [`validate_for_lineage`]. Metadata-quality problems
/// are surfaced here, never as `Err`; callers may proceed and merely log.
#[derive(Debug, Clone)]
pub struct LineageValidation {
    pub valid: bool,
    pub score: i32,
    pub confidence: Confidence,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Extracted tombstone metadata; present only when there are no errors.
    pub metadata: Option<ShadowMetadata>,
}

/// Score and gate an atom's metadata before it may enter lineage.
///
/// Structural and coherence problems are errors; soft gaps are warnings;
/// semantic problems are warnings unless `strict`, which promotes them.
pub fn validate_for_lineage(atom: &Atom, options: &ValidationOptions) -> LineageValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Structural checks.
    if atom.id.as_str().trim().is_empty() {
        errors.push("missing atom id".to_string());
    }
    if atom.name.trim().is_empty() {
        errors.push("missing atom name".to_string());
    }
    if let Some(dna) = &atom.dna {
        let report = dna.validate();
        for problem in report.errors {
            errors.push(format!("invalid dna: {problem}"));
        }
    }

    // Soft checks.
    let outputs = atom.data_flow.as_ref().map(|f| f.outputs.as_slice()).unwrap_or(&[]);
    let transformations = atom
        .data_flow
        .as_ref()
        .map(|f| f.transformations.as_slice())
        .unwrap_or(&[]);
    if outputs.is_empty() && transformations.is_empty() {
        warnings.push("atom has no outputs or transformations".to_string());
    }
    if outputs.iter().any(|o| o.ty.is_none()) {
        warnings.push("output without a declared type".to_string());
    }
    if atom.semantic.is_none() {
        warnings.push("missing semantic analysis".to_string());
    }

    // Coherence checks: cross-validate what the metadata claims against
    // what the data flow actually shows.
    let has_op_in = |family: &[&str]| {
        transformations
            .iter()
            .any(|t| t.operation.as_deref().is_some_and(|op| family.contains(&op)))
    };
    if atom
        .semantic
        .as_ref()
        .and_then(|s| s.verb.as_deref())
        == Some("validate")
        && !has_op_in(VALIDATION_OPS)
    {
        errors.push("verb claims validate but no validation transformation exists".to_string());
    }
    if let Some(dna) = &atom.dna {
        if dna.flow_type.involves_read() && !has_op_in(READ_OPS) {
            errors.push("flow type claims read but no read or fetch transformation exists".to_string());
        }
        if dna.flow_type.involves_persist() && !outputs.iter().any(|o| o.side_effect) {
            errors.push("flow type claims persist but no side-effect output exists".to_string());
        }
    }

    // Semantic checks: warnings by default, errors under strict.
    let mut semantic_issues = Vec::new();
    if let Some(semantic) = &atom.semantic {
        match semantic.verb.as_deref() {
            None => semantic_issues.push("semantic verb missing".to_string()),
            Some(verb) if !RECOGNIZED_VERBS.contains(&verb) => {
                semantic_issues.push(format!("unrecognized semantic verb `{verb}`"));
            }
            Some(_) => {}
        }
        if semantic.operation_type.is_none() {
            semantic_issues.push("semantic operation type missing".to_string());
        }
    }
    if options.strict {
        errors.append(&mut semantic_issues);
    } else {
        warnings.append(&mut semantic_issues);
    }

    let score = 100
        - 30 * errors.len() as i32
        - 10 * warnings.len() as i32
        + 10 * i32::from(atom.dna.is_some())
        + 10 * i32::from(atom.semantic.is_some())
        + 10 * i32::from(atom.standardized.is_some());
    let confidence = if score >= 80 {
        Confidence::High
    } else if score >= 50 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    let valid = errors.is_empty();
    let metadata = valid.then(|| extract_metadata(atom));

    LineageValidation {
        valid,
        score,
        confidence,
        errors,
        warnings,
        metadata,
    }
}

/// Reduce an atom to the compact description stored on its tombstone.
pub fn extract_metadata(atom: &Atom) -> ShadowMetadata {
    ShadowMetadata {
        name: atom.name.trim().to_string(),
        flow: atom.data_flow.as_ref().map(|f| FlowSummary {
            inputs: f.inputs.len(),
            outputs: f.outputs.len(),
            transformations: f.transformations.len(),
        }),
        semantic: atom.semantic.as_ref().map(|s| SemanticSummary {
            verb: s.verb.clone(),
            domain: s.domain.clone(),
            entity: s.entity.clone(),
        }),
        file_path: atom.file_path.clone(),
        line_number: atom.line_number,
        is_exported: atom.is_exported,
    }
}
