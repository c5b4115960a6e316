//! # AQLX
//!
//! Natural-language querying over openEHR-style clinical records.
//!
//! AQLX turns free text like `"blood pressure where heart rate above 80,
//! top 5"` into a structured query representation, accumulates that
//! representation across a conversational session, renders it as an
//! AQL-style string for audit, and evaluates it directly against a
//! collection of nested clinical documents whose schema is induced from the
//! data itself.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! cargo install aqlx
//! aqlx --http-port 8343
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use aqlx::prelude::*;
//!
//! let collection = DocumentCollection::new(CollectionConfig {
//!     name: "ehr".to_string(),
//!     default_limit: 100,
//! });
//!
//! let document = Document::new(
//!     DocId::Integer(1),
//!     serde_json::json!({
//!         "items": [{
//!             "type": "ELEMENT",
//!             "name": { "value": "heart rate" },
//!             "value": { "magnitude": 92 }
//!         }]
//!     }),
//! );
//! collection.upsert(document).unwrap();
//!
//! let engine = QueryEngine::new();
//! let sessions = SessionStore::new(100);
//! let response = engine
//!     .translate_and_execute(&sessions, &collection, "session-1", "heart rate where heart rate above 80")
//!     .unwrap();
//! println!("{}", response.aql);
//! ```
//!
//! ## Crate Structure
//!
//! AQLX is composed of several crates:
//!
//! - [`aqlx-core`](https://docs.rs/aqlx-core) - Flattening, schema induction, translation, synthesis, execution
//! - [`aqlx-storage`](https://docs.rs/aqlx-storage) - Collections, sessions, JSON snapshot persistence
//! - [`aqlx-api`](https://docs.rs/aqlx-api) - REST API
//!
//! ## Features
//!
//! - **Schema Induction**: field names discovered by scanning the documents
//! - **Windowed Translation**: lemma matching in ±3-token neighborhoods
//! - **Session Accumulation**: multi-turn queries merge into one IR
//! - **AQL Synthesis**: auditable formal query string per request
//! - **In-Process Execution**: direct IR evaluation with early termination

// Re-export core types
pub use aqlx_core::{
    Analyzer, CollectionConfig, Condition, Diagnostics, DocId, Document, DocumentCollection,
    Error, FilterEntry, FlatRecord, Operator, ProjectedRecord, QueryEngine, QueryIr,
    QueryOptions, QueryResponse, Result, SchemaRegistry, SchemaSnapshot, SessionStore,
    SnowballAnalyzer, SortOrder, SortSpec, Token, Translation, TranslationStats, Translator,
};

// Re-export storage
pub use aqlx_storage::StorageManager;

// Re-export API
pub use aqlx_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Analyzer, CollectionConfig, Condition, Diagnostics, DocId, Document, DocumentCollection,
        Error, Operator, QueryEngine, QueryIr, QueryOptions, QueryResponse, RestApi, Result,
        SchemaRegistry, SchemaSnapshot, SessionStore, SnowballAnalyzer, SortOrder, SortSpec,
        StorageManager, Translator,
    };
}
