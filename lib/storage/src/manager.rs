use crate::persistence::{CollectionSnapshotData, Persistence};
use aqlx_core::{CollectionConfig, DocumentCollection, Error, Result, SessionStore};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Result limit used when neither the collection config nor the query states
/// one.
pub const DEFAULT_LIMIT: usize = 100;

/// Manages collections, session contexts, and persistence.
pub struct StorageManager {
    collections: Arc<RwLock<HashMap<String, Arc<DocumentCollection>>>>,
    sessions: Arc<SessionStore>,
    data_dir: PathBuf,
    persistence: Persistence,
}

impl StorageManager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let persistence = Persistence::new(&data_dir)?;

        let mut collections_map = HashMap::new();
        if let Some(snapshots) = persistence.load_collections()? {
            for snapshot in snapshots {
                let collection = Arc::new(DocumentCollection::new(CollectionConfig {
                    name: snapshot.name.clone(),
                    default_limit: snapshot.default_limit,
                }));
                for document in snapshot.documents {
                    if let Err(e) = collection.upsert(document) {
                        warn!("skipping unrestorable document in {}: {}", snapshot.name, e);
                    }
                }
                collections_map.insert(snapshot.name, collection);
            }
            info!("snapshot loaded: {} collections", collections_map.len());
        }

        let sessions = Arc::new(SessionStore::new(DEFAULT_LIMIT));
        sessions.restore(persistence.load_sessions());

        Ok(Self {
            collections: Arc::new(RwLock::new(collections_map)),
            sessions,
            data_dir,
            persistence,
        })
    }

    pub fn create_collection(&self, config: CollectionConfig) -> Result<Arc<DocumentCollection>> {
        let name = config.name.clone();
        let mut collections = self.collections.write();

        if collections.contains_key(&name) {
            return Err(Error::CollectionExists(name));
        }

        let collection = Arc::new(DocumentCollection::new(config));
        collections.insert(name, collection.clone());
        Ok(collection)
    }

    #[inline]
    pub fn get_collection(&self, name: &str) -> Option<Arc<DocumentCollection>> {
        self.collections.read().get(name).cloned()
    }

    pub fn delete_collection(&self, name: &str) -> Result<bool> {
        let mut collections = self.collections.write();
        Ok(collections.remove(name).is_some())
    }

    #[inline]
    #[must_use]
    pub fn list_collections(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }

    #[inline]
    #[must_use]
    pub fn collection_exists(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
    }

    /// Shared per-session context store.
    #[inline]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    #[inline]
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Writes collections and session contexts to disk.
    pub fn save(&self) -> Result<()> {
        let snapshots: Vec<CollectionSnapshotData> = {
            let collections = self.collections.read();
            collections
                .values()
                .map(|c| CollectionSnapshotData {
                    name: c.name().to_string(),
                    default_limit: c.default_limit(),
                    documents: c.documents(),
                })
                .collect()
        };
        self.persistence.save_collections(snapshots)?;
        self.persistence.save_sessions(self.sessions.export())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqlx_core::{DocId, Document};
    use serde_json::json;

    fn doc(id: u64) -> Document {
        Document::new(
            DocId::Integer(id),
            json!({
                "items": [{
                    "type": "ELEMENT",
                    "name": { "value": "heart rate" },
                    "value": { "magnitude": 72 }
                }]
            }),
        )
    }

    #[test]
    fn create_and_duplicate_collection() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let config = CollectionConfig {
            name: "ehr".to_string(),
            default_limit: 100,
        };
        assert!(storage.create_collection(config.clone()).is_ok());
        assert!(matches!(
            storage.create_collection(config),
            Err(Error::CollectionExists(_))
        ));
        assert!(storage.collection_exists("ehr"));
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = StorageManager::new(dir.path()).unwrap();
            let collection = storage
                .create_collection(CollectionConfig {
                    name: "ehr".to_string(),
                    default_limit: 50,
                })
                .unwrap();
            collection.upsert(doc(1)).unwrap();
            collection.upsert(doc(2)).unwrap();
            storage.save().unwrap();
        }

        let reloaded = StorageManager::new(dir.path()).unwrap();
        let collection = reloaded.get_collection("ehr").unwrap();
        assert_eq!(collection.count(), 2);
        assert_eq!(collection.default_limit(), 50);
    }
}
