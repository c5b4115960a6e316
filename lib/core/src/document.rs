use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A clinical composition: an arbitrarily nested tree of mappings and
/// sequences, stored as raw JSON. Field leaves inside the tree are discovered
/// by the flattener, not declared up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocId {
    String(String),
    Uuid(Uuid),
    Integer(u64),
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocId::String(s) => write!(f, "{}", s),
            DocId::Uuid(u) => write!(f, "{}", u),
            DocId::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        DocId::String(s)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        DocId::String(s.to_string())
    }
}

impl From<u64> for DocId {
    fn from(i: u64) -> Self {
        DocId::Integer(i)
    }
}

impl From<Uuid> for DocId {
    fn from(u: Uuid) -> Self {
        DocId::Uuid(u)
    }
}

impl Document {
    #[inline]
    #[must_use]
    pub fn new(id: DocId, body: serde_json::Value) -> Self {
        Self { id, body }
    }
}
