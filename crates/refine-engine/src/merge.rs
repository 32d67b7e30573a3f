//! Deep merge of AI candidates against the last known-good document
//!
//! Rules, applied recursively:
//! - a key absent from the candidate keeps the original value
//! - a primitive candidate value, `null` included, replaces the original
//! - arrays merge element-by-element by index; an element whose kind
//!   (`blockType`, `type` or `component`) differs from the original at that
//!   index is taken as-is
//! - objects start from a copy of the original and are overwritten key by key

use serde_json::{Map, Value};
use tracing::{debug, warn};

const KIND_KEYS: &[&str] = &["blockType", "type", "component"];

/// Result of merging a candidate block list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeReport {
    pub blocks: Vec<Value>,
    /// Indexes where the candidate changed the block type and was taken as-is
    pub shape_changes: Vec<usize>,
    /// Indexes with no original to merge against
    pub passthrough: Vec<usize>,
}

/// Two values describe the same kind of block/node
fn same_kind(original: &Value, candidate: &Value) -> bool {
    KIND_KEYS.iter().all(|key| {
        match (original.get(key), candidate.get(key)) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    })
}

fn merge_objects(original: &Map<String, Value>, candidate: &Map<String, Value>) -> Value {
    let mut merged = original.clone();
    for (key, value) in candidate {
        let next = match original.get(key) {
            Some(existing) => merge_values(existing, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    Value::Object(merged)
}

fn merge_arrays(original: &[Value], candidate: &[Value]) -> Value {
    let merged = candidate
        .iter()
        .enumerate()
        .map(|(index, item)| match original.get(index) {
            Some(existing) if existing.is_object() && item.is_object() => {
                if same_kind(existing, item) {
                    merge_values(existing, item)
                } else {
                    debug!(index, "Array element changed shape, taking candidate");
                    item.clone()
                }
            }
            _ => item.clone(),
        })
        .collect();
    Value::Array(merged)
}

/// Merge `candidate` over `original`
pub fn merge_values(original: &Value, candidate: &Value) -> Value {
    match (original, candidate) {
        (Value::Object(o), Value::Object(c)) => merge_objects(o, c),
        (Value::Array(o), Value::Array(c)) => merge_arrays(o, c),
        (_, c) => c.clone(),
    }
}

/// Merge a candidate block list against the original, by positional index
pub fn merge_blocks(original: &[Value], candidate: &[Value]) -> MergeReport {
    let mut report = MergeReport::default();
    for (index, block) in candidate.iter().enumerate() {
        let merged = match original.get(index) {
            None => {
                debug!(index, "No original block to merge against");
                report.passthrough.push(index);
                block.clone()
            }
            Some(existing) if !existing.is_object() || !block.is_object() => {
                report.passthrough.push(index);
                block.clone()
            }
            Some(existing) if !same_kind(existing, block) => {
                warn!(
                    index,
                    from = ?existing.get("blockType"),
                    to = ?block.get("blockType"),
                    "Block type changed, using candidate as-is"
                );
                report.shape_changes.push(index);
                block.clone()
            }
            Some(existing) => merge_values(existing, block),
        };
        report.blocks.push(merged);
    }
    report
}
