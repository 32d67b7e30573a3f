//! Post-merge validation
//!
//! Two passes with different weight:
//! - [`check_completeness`] walks merged values against the per-type schema
//!   and reports field-path violations. Diagnostic only.
//! - [`validate_blocks`] coerces primitive shapes and deserializes into typed
//!   [`SemanticBlock`]s. Failure blocks acceptance of the edit.

use crate::config::ValidationLimits;
use email_model::{BlockType, FieldShape, SemanticBlock};
use serde_json::Value;

fn block_type_of(value: &Value) -> Option<BlockType> {
    value
        .get("blockType")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
}

fn is_text(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(_)))
}

/// Field-path violations of required fields. Never fails.
pub fn check_completeness(blocks: &[Value]) -> Vec<String> {
    let mut violations = Vec::new();
    for (index, block) in blocks.iter().enumerate() {
        let path = format!("blocks[{}]", index);
        let Some(block_type) = block_type_of(block) else {
            violations.push(format!("{}.blockType: missing or unknown", path));
            continue;
        };
        for field in block_type.required_fields() {
            let value = block.get(field.name);
            let field_path = format!("{}.{}", path, field.name);
            match field.shape {
                FieldShape::Text => {
                    if !is_text(value) {
                        violations.push(format!("{}: expected string", field_path));
                    }
                }
                FieldShape::TextList => match value.and_then(Value::as_array) {
                    Some(items) => {
                        for (i, item) in items.iter().enumerate() {
                            if !item.is_string() {
                                violations.push(format!("{}[{}]: expected string", field_path, i));
                            }
                        }
                    }
                    None => violations.push(format!("{}: expected list of strings", field_path)),
                },
                FieldShape::ItemList(item_fields) => match value.and_then(Value::as_array) {
                    Some(items) => {
                        for (i, item) in items.iter().enumerate() {
                            for name in item_fields {
                                if !is_text(item.get(*name)) {
                                    violations.push(format!(
                                        "{}[{}].{}: expected string",
                                        field_path, i, name
                                    ));
                                }
                            }
                        }
                    }
                    None => violations.push(format!("{}: expected list", field_path)),
                },
            }
        }
    }
    violations
}

fn coerce_text(value: &mut Value) {
    let coerced = match value {
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    };
    if let Some(text) = coerced {
        *value = Value::String(text);
    }
}

/// Coerce numbers and booleans to strings where the schema expects text
pub fn coerce_block(block: &mut Value) {
    let Some(block_type) = block_type_of(block) else {
        return;
    };
    for field in block_type.required_fields() {
        let Some(value) = block.get_mut(field.name) else {
            continue;
        };
        match field.shape {
            FieldShape::Text => coerce_text(value),
            FieldShape::TextList => {
                if let Some(items) = value.as_array_mut() {
                    items.iter_mut().for_each(coerce_text);
                }
            }
            FieldShape::ItemList(item_fields) => {
                if let Some(items) = value.as_array_mut() {
                    for item in items.iter_mut() {
                        for name in item_fields {
                            if let Some(v) = item.get_mut(*name) {
                                coerce_text(v);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Strict schema conformance for a single block
pub fn validate_block(mut value: Value) -> Result<SemanticBlock, String> {
    coerce_block(&mut value);
    serde_json::from_value(value).map_err(|e| e.to_string())
}

/// Strict schema conformance pass. Any error rejects the whole list.
pub fn validate_blocks(blocks: Vec<Value>) -> Result<Vec<SemanticBlock>, Vec<String>> {
    let mut typed = Vec::with_capacity(blocks.len());
    let mut errors = Vec::new();
    for (index, value) in blocks.into_iter().enumerate() {
        match validate_block(value) {
            Ok(block) => typed.push(block),
            Err(e) => errors.push(format!("blocks[{}]: {}", index, e)),
        }
    }
    if errors.is_empty() {
        Ok(typed)
    } else {
        Err(errors)
    }
}

fn cta_count(block: &SemanticBlock) -> usize {
    match block {
        SemanticBlock::Pricing(p) => p.plans.len(),
        other => other.block_type().cta_count(),
    }
}

/// Non-blocking content warnings
pub fn lint_blocks(
    blocks: &[SemanticBlock],
    limits: &ValidationLimits,
    email_type: Option<&str>,
) -> Vec<String> {
    let mut warnings = Vec::new();
    let ctas: usize = blocks.iter().map(cta_count).sum();
    let max = limits.max_ctas_for(email_type);
    if ctas > max {
        warnings.push(format!(
            "{} calls-to-action exceed the recommended maximum of {} for {} emails",
            ctas,
            max,
            email_type.unwrap_or("this type of")
        ));
    }
    if !blocks.is_empty() && !blocks.iter().any(|b| b.block_type() == BlockType::Footer) {
        warnings.push("No footer block: the email has no unsubscribe link".to_string());
    }
    warnings
}
