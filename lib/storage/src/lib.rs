//! Storage layer for AQLX: named document collections, shared session
//! contexts, and JSON snapshot persistence.

pub mod manager;
pub mod persistence;

pub use manager::{StorageManager, DEFAULT_LIMIT};
pub use persistence::{CollectionSnapshotData, Persistence};
