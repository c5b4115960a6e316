//! Induced schema registry.
//!
//! The schema is not declared anywhere: it is the set of field leaf names
//! observed across the whole collection, each annotated with its normalized
//! lemma signature. Rebuilds produce a fresh versioned snapshot and swap it
//! in; readers hold an `Arc` to the snapshot they started with and never
//! observe in-place mutation.

use crate::flatten;
use crate::lexicon::Analyzer;
use ahash::AHashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Immutable view of the induced schema at one rebuild.
#[derive(Debug, Default)]
pub struct SchemaSnapshot {
    version: u64,
    /// Sorted and deduplicated; defines the deterministic schema order used
    /// for select output and tie-breaking.
    fields: Vec<String>,
    signatures: AHashMap<String, HashSet<String>>,
}

impl SchemaSnapshot {
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Field names in schema order.
    #[inline]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[inline]
    pub fn signature(&self, field: &str) -> Option<&HashSet<String>> {
        self.signatures.get(field)
    }

    #[inline]
    pub fn first_field(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Shared, rebuildable schema cache (copy-on-rebuild).
pub struct SchemaRegistry {
    current: RwLock<Arc<SchemaSnapshot>>,
    next_version: AtomicU64,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(SchemaSnapshot::default())),
            next_version: AtomicU64::new(1),
        }
    }

    /// Current snapshot; may be stale while a rebuild is in flight.
    #[inline]
    pub fn snapshot(&self) -> Arc<SchemaSnapshot> {
        self.current.read().clone()
    }

    /// Full-collection scan in schema-induction mode. The new snapshot is
    /// built off to the side and swapped in atomically, so concurrent
    /// translations keep reading the previous one.
    pub fn rebuild<'a, I>(&self, bodies: I, analyzer: &dyn Analyzer) -> Arc<SchemaSnapshot>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut names = BTreeSet::new();
        for body in bodies {
            names.append(&mut flatten::field_names(body));
        }

        let signatures = names
            .iter()
            .map(|name| (name.clone(), analyzer.signature(name)))
            .collect();

        let snapshot = Arc::new(SchemaSnapshot {
            version: self.next_version.fetch_add(1, Ordering::Relaxed),
            fields: names.into_iter().collect(),
            signatures,
        });

        *self.current.write() = snapshot.clone();
        snapshot
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::SnowballAnalyzer;
    use serde_json::json;

    fn element(name: &str) -> Value {
        json!({
            "type": "ELEMENT",
            "name": { "value": name },
            "value": { "magnitude": 1 }
        })
    }

    #[test]
    fn rebuild_collects_all_leaf_names() {
        let registry = SchemaRegistry::new();
        let analyzer = SnowballAnalyzer::new();
        let a = json!({ "items": [element("heart rate")] });
        let b = json!({ "items": [element("systolic blood pressure"), element("heart rate")] });

        let snapshot = registry.rebuild([&a, &b], &analyzer);
        assert_eq!(
            snapshot.fields(),
            &["heart rate".to_string(), "systolic blood pressure".to_string()]
        );
        assert!(snapshot.signature("heart rate").unwrap().contains("heart"));
    }

    #[test]
    fn readers_keep_their_snapshot_across_rebuilds() {
        let registry = SchemaRegistry::new();
        let analyzer = SnowballAnalyzer::new();
        let a = json!({ "items": [element("heart rate")] });

        let before = registry.rebuild([&a], &analyzer);
        let held = registry.snapshot();
        let b = json!({ "items": [element("weight")] });
        let after = registry.rebuild([&b], &analyzer);

        assert_eq!(held.version(), before.version());
        assert_ne!(after.version(), before.version());
        assert_eq!(held.fields(), before.fields());
    }
}
