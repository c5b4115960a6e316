//! Tree flattening over nested compositions.
//!
//! A node is a field leaf iff it carries `"type": "ELEMENT"` and a `name`
//! object with a string `value`. Its scalar comes from `value.magnitude` if
//! present, else `value.value`. Everything else is either a container (object
//! or array) or an opaque leaf that is skipped.
//!
//! Traversal is an explicit worklist, so attacker-deep nesting cannot blow
//! the stack. Order is fixed for a fixed document, which makes repeated
//! flattening idempotent; duplicate leaf names resolve to the last binding in
//! traversal order.

use ahash::AHashMap;
use serde_json::Value;
use std::collections::BTreeSet;

/// Field-name → value mapping for one flattened document. Ephemeral:
/// recomputed per document per query, never persisted.
pub type FlatRecord = AHashMap<String, Value>;

const ELEMENT_TYPE: &str = "ELEMENT";

fn leaf_name(node: &serde_json::Map<String, Value>) -> Option<&str> {
    if node.get("type").and_then(Value::as_str) != Some(ELEMENT_TYPE) {
        return None;
    }
    node.get("name")?.get("value")?.as_str()
}

fn leaf_value(node: &serde_json::Map<String, Value>) -> Option<Value> {
    let value = node.get("value")?;
    let raw = value.get("magnitude").or_else(|| value.get("value"))?;
    Some(coerce_numeric(raw.clone()))
}

/// Numeric coercion with fallback to the raw value. A non-numeric string
/// survives as-is and later fails numeric condition evaluation instead of
/// raising.
fn coerce_numeric(value: Value) -> Value {
    match &value {
        Value::Number(_) => value,
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(value),
            Err(_) => value,
        },
        _ => value,
    }
}

/// Walks `root` in document order, calling `visit` on every field leaf.
fn walk(root: &Value, mut visit: impl FnMut(&str, &serde_json::Map<String, Value>)) {
    let mut stack: Vec<&Value> = vec![root];
    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                if let Some(name) = leaf_name(map) {
                    visit(name, map);
                } else {
                    // Children pushed in reverse so the pop order matches
                    // document order.
                    for child in map.values().rev() {
                        stack.push(child);
                    }
                }
            }
            Value::Array(items) => {
                for child in items.iter().rev() {
                    stack.push(child);
                }
            }
            _ => {}
        }
    }
}

/// Schema-induction mode: the set of field leaf names reachable anywhere in
/// the tree.
pub fn field_names(root: &Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    walk(root, |name, _| {
        names.insert(name.to_string());
    });
    names
}

/// Value-extraction mode: one binding per field leaf that carries a scalar.
/// Leaves missing their `value` substructure are skipped, not an error.
pub fn flatten(root: &Value) -> FlatRecord {
    let mut record = FlatRecord::new();
    walk(root, |name, map| {
        if let Some(value) = leaf_value(map) {
            record.insert(name.to_string(), value);
        }
    });
    record
}
