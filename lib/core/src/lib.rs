//! # AQLX Core
//!
//! Core library for the AQLX clinical query engine.
//!
//! This crate provides the translation/execution pipeline:
//!
//! - [`Document`] - A composition: an arbitrarily nested clinical record
//! - [`flatten`] - Worklist flattening of compositions into field/value records
//! - [`SchemaRegistry`] - Field names induced from the data, with lemma signatures
//! - [`Translator`] - Free text → intermediate query representation
//! - [`SessionStore`] - Per-conversation IR accumulation
//! - [`synthesize`](synthesize::synthesize) - IR → AQL string for display/audit
//! - [`execute`](execute::execute) - IR evaluation against the collection
//! - [`QueryEngine`] - One-call request façade
//!
//! ## Example
//!
//! ```rust
//! use aqlx_core::{CollectionConfig, DocId, Document, DocumentCollection, QueryEngine, SessionStore};
//!
//! let collection = DocumentCollection::new(CollectionConfig {
//!     name: "ehr".to_string(),
//!     default_limit: 100,
//! });
//! collection.upsert(Document::new(
//!     DocId::Integer(1),
//!     serde_json::json!({
//!         "items": [{
//!             "type": "ELEMENT",
//!             "name": { "value": "heart rate" },
//!             "value": { "magnitude": 72 }
//!         }]
//!     }),
//! )).unwrap();
//!
//! let engine = QueryEngine::new();
//! let sessions = SessionStore::new(100);
//! let response = engine
//!     .translate_and_execute(&sessions, &collection, "s1", "heart rate where heart rate above 60")
//!     .unwrap();
//! assert_eq!(response.results.len(), 1);
//! ```

pub mod collection;
pub mod document;
pub mod engine;
pub mod error;
pub mod execute;
pub mod flatten;
pub mod ir;
pub mod lexicon;
pub mod schema;
pub mod session;
pub mod synthesize;
pub mod translate;

pub use collection::{CollectionConfig, DocumentCollection};
pub use document::{DocId, Document};
pub use engine::{QueryEngine, QueryOptions, QueryResponse};
pub use error::{Error, Result};
pub use execute::{Diagnostics, ProjectedRecord};
pub use flatten::FlatRecord;
pub use ir::{Condition, FilterEntry, Operator, QueryIr, SortOrder, SortSpec};
pub use lexicon::{Analyzer, SnowballAnalyzer, Token};
pub use schema::{SchemaRegistry, SchemaSnapshot};
pub use session::SessionStore;
pub use translate::{Translation, TranslationStats, Translator};
