use crate::document::{DocId, Document};
use crate::lexicon::Analyzer;
use crate::schema::{SchemaRegistry, SchemaSnapshot};
use crate::{Error, Result};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Configuration for a collection.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub name: String,
    /// Result limit applied when a query never states one.
    pub default_limit: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            default_limit: 100,
        }
    }
}

/// A collection of compositions with an induced schema.
///
/// Documents keep insertion order; that order is the "store order" query
/// execution scans in, which keeps early termination deterministic.
pub struct DocumentCollection {
    config: CollectionConfig,
    documents: RwLock<Vec<Document>>,
    index: RwLock<AHashMap<String, usize>>,
    schema: SchemaRegistry,
}

impl DocumentCollection {
    #[must_use]
    pub fn new(config: CollectionConfig) -> Self {
        Self {
            config,
            documents: RwLock::new(Vec::new()),
            index: RwLock::new(AHashMap::new()),
            schema: SchemaRegistry::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }

    pub fn count(&self) -> usize {
        self.documents.read().len()
    }

    /// Insert or update a document. Updates keep the document's original
    /// store-order slot.
    pub fn upsert(&self, document: Document) -> Result<()> {
        if !document.body.is_object() && !document.body.is_array() {
            return Err(Error::InvalidDocument(format!(
                "document {} has no container root",
                document.id
            )));
        }
        let id_str = document.id.to_string();
        let mut documents = self.documents.write();
        let mut index = self.index.write();
        match index.get(&id_str).copied() {
            Some(slot) => documents[slot] = document,
            None => {
                index.insert(id_str, documents.len());
                documents.push(document);
            }
        }
        Ok(())
    }

    pub fn batch_upsert(&self, documents: Vec<Document>) -> Result<()> {
        for document in documents {
            self.upsert(document)?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        let index = self.index.read();
        let slot = *index.get(id)?;
        self.documents.read().get(slot).cloned()
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut documents = self.documents.write();
        let mut index = self.index.write();
        let Some(slot) = index.remove(id) else {
            return Ok(false);
        };
        documents.remove(slot);
        // Slots after the removed document shift down by one.
        for s in index.values_mut() {
            if *s > slot {
                *s -= 1;
            }
        }
        Ok(true)
    }

    /// All documents in store order.
    pub fn documents(&self) -> Vec<Document> {
        self.documents.read().clone()
    }

    /// Runs `f` over the documents in store order under the read lock,
    /// without cloning them.
    pub fn scan<T>(&self, f: impl FnOnce(&[Document]) -> T) -> T {
        f(&self.documents.read())
    }

    /// Induces the schema from the current documents and returns the fresh
    /// snapshot. Concurrent readers keep whatever snapshot they hold.
    pub fn rebuild_schema(&self, analyzer: &dyn Analyzer) -> Arc<SchemaSnapshot> {
        let documents = self.documents.read();
        self.schema.rebuild(documents.iter().map(|d| &d.body), analyzer)
    }

    /// Last induced snapshot (possibly stale).
    pub fn schema(&self) -> Arc<SchemaSnapshot> {
        self.schema.snapshot()
    }

    /// Field names known across the collection, in schema order.
    pub fn field_names(&self) -> Vec<String> {
        self.schema.snapshot().fields().to_vec()
    }

    pub fn has_document(&self, id: &str) -> bool {
        self.index.read().contains_key(id)
    }
}
