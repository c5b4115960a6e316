//! JSON snapshot persistence for collections and session contexts.
//!
//! Snapshots are written atomically (write-then-rename) so a crash mid-save
//! never leaves a torn file. A corrupted session file is treated as an empty
//! session set, not an error; a corrupted collection file is a hard
//! persistence failure, because silently dropping documents would be worse.

use ahash::AHashMap;
use aqlx_core::{Document, Error, QueryIr, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

const COLLECTIONS_FILE: &str = "collections.json";
const SESSIONS_FILE: &str = "sessions.json";

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionSnapshotData {
    pub name: String,
    pub default_limit: usize,
    pub documents: Vec<Document>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    saved_at: DateTime<Utc>,
    collections: Vec<CollectionSnapshotData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionSnapshot {
    saved_at: DateTime<Utc>,
    contexts: AHashMap<String, QueryIr>,
}

pub struct Persistence {
    dir: PathBuf,
}

impl Persistence {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let payload =
            serde_json::to_vec_pretty(value).map_err(|e| Error::Serialization(e.to_string()))?;
        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(&payload))
            .map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(())
    }

    pub fn save_collections(&self, collections: Vec<CollectionSnapshotData>) -> Result<()> {
        self.write_json(
            COLLECTIONS_FILE,
            &StoreSnapshot {
                saved_at: Utc::now(),
                collections,
            },
        )
    }

    /// Loads the collection snapshot if one exists. Unreadable data is a hard
    /// persistence failure.
    pub fn load_collections(&self) -> Result<Option<Vec<CollectionSnapshotData>>> {
        let path = self.dir.join(COLLECTIONS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read(&path)?;
        let snapshot: StoreSnapshot =
            serde_json::from_slice(&raw).map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(Some(snapshot.collections))
    }

    pub fn save_sessions(&self, contexts: AHashMap<String, QueryIr>) -> Result<()> {
        self.write_json(
            SESSIONS_FILE,
            &SessionSnapshot {
                saved_at: Utc::now(),
                contexts,
            },
        )
    }

    /// Loads persisted session contexts. A corrupted or unreadable file is
    /// equivalent to every session having been reset.
    pub fn load_sessions(&self) -> AHashMap<String, QueryIr> {
        let path = self.dir.join(SESSIONS_FILE);
        if !path.exists() {
            return AHashMap::new();
        }
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("session file unreadable, starting with empty sessions: {}", e);
                return AHashMap::new();
            }
        };
        match serde_json::from_slice::<SessionSnapshot>(&raw) {
            Ok(snapshot) => snapshot.contexts,
            Err(e) => {
                warn!("session file corrupted, starting with empty sessions: {}", e);
                AHashMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqlx_core::DocId;
    use serde_json::json;

    #[test]
    fn collections_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = Persistence::new(dir.path()).unwrap();

        let data = vec![CollectionSnapshotData {
            name: "ehr".to_string(),
            default_limit: 100,
            documents: vec![Document::new(DocId::Integer(1), json!({ "items": [] }))],
        }];
        persistence.save_collections(data).unwrap();

        let loaded = persistence.load_collections().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "ehr");
        assert_eq!(loaded[0].documents.len(), 1);
    }

    #[test]
    fn corrupted_sessions_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = Persistence::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("sessions.json"), b"{ not json").unwrap();
        assert!(persistence.load_sessions().is_empty());
    }

    #[test]
    fn corrupted_collections_fail_hard() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = Persistence::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("collections.json"), b"{ not json").unwrap();
        assert!(persistence.load_collections().is_err());
    }
}
