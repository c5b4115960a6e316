//! Request façade: one call runs the whole
//! translate → merge → synthesize → execute pipeline.

use crate::collection::DocumentCollection;
use crate::execute::{self, Diagnostics, ProjectedRecord};
use crate::ir::{QueryIr, SortSpec};
use crate::lexicon::{Analyzer, SnowballAnalyzer};
use crate::session::SessionStore;
use crate::synthesize;
use crate::translate::Translator;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Request-scoped knobs the free text cannot express. Stated values merge
/// into the session like any other fragment content.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub offset: usize,
    pub order_by: Option<SortSpec>,
}

/// Response of one translation+execution request.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Synthesized AQL. Display and audit only, never executed.
    pub aql: String,
    pub results: Vec<ProjectedRecord>,
    pub diagnostics: Diagnostics,
    /// Accumulated IR after this request's merge.
    pub ir: QueryIr,
}

pub struct QueryEngine {
    analyzer: Arc<dyn Analyzer>,
    translator: Translator,
}

impl QueryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_analyzer(Arc::new(SnowballAnalyzer::new()))
    }

    #[must_use]
    pub fn with_analyzer(analyzer: Arc<dyn Analyzer>) -> Self {
        let translator = Translator::new(analyzer.clone());
        Self {
            analyzer,
            translator,
        }
    }

    /// Translates `text`, folds it into the session's accumulated IR, and
    /// runs the result against the collection.
    pub fn translate_and_execute(
        &self,
        sessions: &SessionStore,
        collection: &DocumentCollection,
        session_id: &str,
        text: &str,
    ) -> Result<QueryResponse> {
        self.translate_and_execute_with(
            sessions,
            collection,
            session_id,
            text,
            QueryOptions::default(),
        )
    }

    /// [`translate_and_execute`](Self::translate_and_execute) with explicit
    /// request options.
    ///
    /// The schema snapshot is rebuilt at the top of the request and carried
    /// through matching, synthesis and execution, so all three agree even if
    /// the collection changes mid-request. The collection's configured
    /// default limit applies whenever the accumulated IR never states one.
    pub fn translate_and_execute_with(
        &self,
        sessions: &SessionStore,
        collection: &DocumentCollection,
        session_id: &str,
        text: &str,
        options: QueryOptions,
    ) -> Result<QueryResponse> {
        let started = Instant::now();

        let default_limit = collection.default_limit();
        let schema = collection.rebuild_schema(self.analyzer.as_ref());
        let mut translation = self.translator.translate(text, &schema, default_limit);
        let stats = translation.stats;

        translation.ir.offset = options.offset;
        translation.ir.order_by = options.order_by;
        let ir = sessions.merge(session_id, translation.ir, default_limit);
        let aql = synthesize::synthesize(&ir, &schema);

        let (results, scanned) = collection.scan(|documents| execute::execute(&ir, documents));

        let latency_ms = started.elapsed().as_millis() as u64;
        let diagnostics = Diagnostics::new(&stats, &ir, results.len(), scanned, latency_ms);

        Ok(QueryResponse {
            aql,
            results,
            diagnostics,
            ir,
        })
    }

    /// Drops the session's accumulated IR back to empty.
    pub fn reset(&self, sessions: &SessionStore, session_id: &str) {
        sessions.reset(session_id);
    }

    /// Re-induces a collection's schema with this engine's analyzer.
    pub fn rebuild_schema(
        &self,
        collection: &DocumentCollection,
    ) -> Arc<crate::schema::SchemaSnapshot> {
        collection.rebuild_schema(self.analyzer.as_ref())
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionConfig;
    use crate::document::{DocId, Document};
    use crate::ir::SortOrder;
    use serde_json::json;

    fn vitals_doc(id: u64, hr: f64, bp: f64) -> Document {
        Document::new(
            DocId::Integer(id),
            json!({
                "content": [{
                    "data": {
                        "items": [
                            {
                                "type": "ELEMENT",
                                "name": { "value": "heart rate" },
                                "value": { "magnitude": hr }
                            },
                            {
                                "type": "ELEMENT",
                                "name": { "value": "systolic blood pressure" },
                                "value": { "magnitude": bp }
                            }
                        ]
                    }
                }]
            }),
        )
    }

    #[test]
    fn full_request_pipeline() {
        let collection = DocumentCollection::new(CollectionConfig {
            name: "ehr".to_string(),
            default_limit: 100,
        });
        collection.upsert(vitals_doc(1, 90.0, 130.0)).unwrap();
        collection.upsert(vitals_doc(2, 60.0, 110.0)).unwrap();

        let engine = QueryEngine::new();
        let sessions = SessionStore::new(100);
        let response = engine
            .translate_and_execute(
                &sessions,
                &collection,
                "s1",
                "blood pressure where heart rate above 80",
            )
            .unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(
            response.results[0].get("systolic blood pressure"),
            Some(&json!(130.0))
        );
        assert!(response.aql.contains("> 80"));
        assert!(response.diagnostics.has_results);
        assert_eq!(response.diagnostics.condition_quality, 1.0);
    }

    #[test]
    fn collection_default_limit_caps_unstated_queries() {
        let collection = DocumentCollection::new(CollectionConfig {
            name: "ehr".to_string(),
            default_limit: 5,
        });
        for i in 0..20 {
            collection.upsert(vitals_doc(i, 90.0, 120.0)).unwrap();
        }

        let engine = QueryEngine::new();
        let sessions = SessionStore::new(100);
        let response = engine
            .translate_and_execute(&sessions, &collection, "s1", "heart rate")
            .unwrap();

        assert_eq!(response.ir.limit, 5);
        assert_eq!(response.results.len(), 5);

        // A stated limit still overrides the collection default.
        let response = engine
            .translate_and_execute(&sessions, &collection, "s1", "top 3 heart rate")
            .unwrap();
        assert_eq!(response.results.len(), 3);
    }

    #[test]
    fn request_options_sort_and_page_the_results() {
        let collection = DocumentCollection::new(CollectionConfig::default());
        collection.upsert(vitals_doc(1, 72.0, 120.0)).unwrap();
        collection.upsert(vitals_doc(2, 95.0, 130.0)).unwrap();
        collection.upsert(vitals_doc(3, 55.0, 110.0)).unwrap();

        let engine = QueryEngine::new();
        let sessions = SessionStore::new(100);
        let response = engine
            .translate_and_execute_with(
                &sessions,
                &collection,
                "s1",
                "heart rate",
                QueryOptions {
                    offset: 1,
                    order_by: Some(SortSpec {
                        field: "heart rate".to_string(),
                        order: SortOrder::Desc,
                    }),
                },
            )
            .unwrap();

        // Offset skipped the first passing document; the page is sorted.
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].get("heart rate"), Some(&json!(95.0)));
        assert_eq!(response.results[1].get("heart rate"), Some(&json!(55.0)));
        assert!(response.aql.contains("ORDER BY"));
        assert!(response.aql.contains("OFFSET 1"));
    }

    #[test]
    fn context_accumulates_until_reset() {
        let collection = DocumentCollection::new(CollectionConfig::default());
        collection.upsert(vitals_doc(1, 50.0, 120.0)).unwrap();

        let engine = QueryEngine::new();
        let sessions = SessionStore::new(100);

        engine
            .translate_and_execute(&sessions, &collection, "s1", "heart rate")
            .unwrap();
        let second = engine
            .translate_and_execute(&sessions, &collection, "s1", "where heart rate below 60")
            .unwrap();

        assert_eq!(second.ir.select_fields, vec!["heart rate"]);
        assert_eq!(second.ir.condition_count(), 1);
        assert_eq!(second.results.len(), 1);

        engine.reset(&sessions, "s1");
        let fresh = engine
            .translate_and_execute(&sessions, &collection, "s1", "")
            .unwrap();
        assert!(fresh.ir.is_empty());
        assert_eq!(fresh.ir.limit, 100);
    }
}
