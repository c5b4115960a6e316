//! IR evaluation over the document collection.
//!
//! Documents are flattened one at a time in store order; a document passes
//! iff every filtered field is present, numeric-comparable, and satisfies
//! every condition on it. Accumulation stops at the limit, so documents past
//! that point are never flattened.

use crate::document::Document;
use crate::flatten::{self, FlatRecord};
use crate::ir::{QueryIr, SortOrder, SortSpec};
use crate::translate::TranslationStats;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// Projection of one passing document: selected fields only, absent fields
/// mapped to explicit null.
pub type ProjectedRecord = serde_json::Map<String, Value>;

/// Per-request quality signals, computed from translation counts rather than
/// recomputed from results.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    /// Translator-selected fields over context-selected fields.
    pub select_completeness: f64,
    /// Valid conditions over numerals seen in the filter segment.
    pub condition_quality: f64,
    pub has_results: bool,
    pub latency_ms: u64,
    pub documents_scanned: usize,
}

impl Diagnostics {
    pub fn new(stats: &TranslationStats, ir: &QueryIr, results: usize, scanned: usize, latency_ms: u64) -> Self {
        let select_completeness = if ir.select_fields.is_empty() {
            1.0
        } else {
            stats.fields_selected as f64 / ir.select_fields.len() as f64
        };
        let condition_quality = if stats.numerals_seen == 0 {
            1.0
        } else {
            stats.conditions_bound as f64 / stats.numerals_seen as f64
        };
        Self {
            select_completeness,
            condition_quality,
            has_results: results > 0,
            latency_ms,
            documents_scanned: scanned,
        }
    }
}

fn passes(ir: &QueryIr, record: &FlatRecord) -> bool {
    for entry in ir.filters() {
        // Absent or non-numeric values reject the document; that is a
        // non-match, not an error.
        let Some(actual) = record.get(&entry.field).and_then(Value::as_f64) else {
            return false;
        };
        if !entry.conditions.iter().all(|c| c.holds(actual)) {
            return false;
        }
    }
    true
}

fn project(ir: &QueryIr, record: &FlatRecord) -> ProjectedRecord {
    let mut out = ProjectedRecord::new();
    for field in &ir.select_fields {
        out.insert(
            field.clone(),
            record.get(field).cloned().unwrap_or(Value::Null),
        );
    }
    out
}

/// Missing or non-numeric sort keys order after numeric ones; two
/// non-numeric keys fall back to string comparison.
fn compare_keys(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => {
            let x = a.and_then(Value::as_str).unwrap_or("");
            let y = b.and_then(Value::as_str).unwrap_or("");
            x.cmp(y)
        }
    }
}

/// Orders the collected page by the sort field of each projected record. The
/// sort applies to the page, not the whole collection; early termination is
/// unaffected.
fn sort_results(results: &mut [ProjectedRecord], sort: &SortSpec) {
    results.sort_by(|a, b| {
        let ord = compare_keys(a.get(&sort.field), b.get(&sort.field));
        match sort.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

/// Evaluates the accumulated IR against documents in store order. The first
/// `ir.offset` passing records are skipped, then accumulation stops at the
/// limit. Returns the projected results and the number of documents scanned.
pub fn execute<'a, I>(ir: &QueryIr, documents: I) -> (Vec<ProjectedRecord>, usize)
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut results = Vec::new();
    let mut scanned = 0;
    let mut skipped = 0;
    for doc in documents {
        if results.len() >= ir.limit {
            break;
        }
        scanned += 1;
        let record = flatten::flatten(&doc.body);
        if passes(ir, &record) {
            if skipped < ir.offset {
                skipped += 1;
                continue;
            }
            results.push(project(ir, &record));
        }
    }
    if let Some(sort) = &ir.order_by {
        sort_results(&mut results, sort);
    }
    (results, scanned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocId;
    use crate::ir::{Condition, Operator};
    use serde_json::json;

    fn doc(id: u64, fields: &[(&str, Value)]) -> Document {
        let items: Vec<Value> = fields
            .iter()
            .map(|(name, value)| {
                json!({
                    "type": "ELEMENT",
                    "name": { "value": name },
                    "value": { "magnitude": value }
                })
            })
            .collect();
        Document::new(DocId::Integer(id), json!({ "items": items }))
    }

    #[test]
    fn conjunction_filters_and_projects() {
        let docs = vec![
            doc(1, &[("heart rate", json!(90)), ("weight", json!(70))]),
            doc(2, &[("heart rate", json!(60)), ("weight", json!(80))]),
        ];
        let mut ir = QueryIr::new(10);
        ir.add_select("weight");
        ir.add_condition("heart rate", Condition::new(Operator::Gt, 80.0));

        let (results, scanned) = execute(&ir, &docs);
        assert_eq!(scanned, 2);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get("weight"), Some(&json!(70)));
        // heart rate filtered on but not selected.
        assert!(!results[0].contains_key("heart rate"));
    }

    #[test]
    fn missing_filtered_field_rejects_the_document() {
        let docs = vec![doc(1, &[("weight", json!(70))])];
        let mut ir = QueryIr::new(10);
        ir.add_condition("heart rate", Condition::new(Operator::Gt, 0.0));
        let (results, _) = execute(&ir, &docs);
        assert!(results.is_empty());
    }

    #[test]
    fn non_numeric_value_rejects_the_document() {
        let docs = vec![doc(1, &[("heart rate", json!("irregular"))])];
        let mut ir = QueryIr::new(10);
        ir.add_condition("heart rate", Condition::new(Operator::Gt, 0.0));
        let (results, _) = execute(&ir, &docs);
        assert!(results.is_empty());
    }

    #[test]
    fn missing_selected_field_projects_to_null() {
        let docs = vec![doc(1, &[("heart rate", json!(72))])];
        let mut ir = QueryIr::new(10);
        ir.add_select("heart rate");
        ir.add_select("weight");
        let (results, _) = execute(&ir, &docs);
        assert_eq!(results[0].get("weight"), Some(&Value::Null));
    }

    #[test]
    fn limit_terminates_the_scan_early() {
        let docs: Vec<Document> = (0..100)
            .map(|i| doc(i, &[("heart rate", json!(90))]))
            .collect();
        let mut ir = QueryIr::new(3);
        ir.add_select("heart rate");
        let (results, scanned) = execute(&ir, &docs);
        assert_eq!(results.len(), 3);
        assert_eq!(scanned, 3);
    }

    #[test]
    fn offset_skips_passing_records() {
        let docs: Vec<Document> = (0..10)
            .map(|i| doc(i, &[("heart rate", json!(60 + i))]))
            .collect();
        let mut ir = QueryIr::new(3);
        ir.add_select("heart rate");
        ir.offset = 2;
        let (results, _) = execute(&ir, &docs);
        assert_eq!(results.len(), 3);
        // The first two passing documents were skipped.
        assert_eq!(results[0].get("heart rate"), Some(&json!(62)));
    }

    #[test]
    fn sort_orders_the_collected_page() {
        let docs = vec![
            doc(1, &[("heart rate", json!(72))]),
            doc(2, &[("heart rate", json!(95))]),
            doc(3, &[("heart rate", json!(55))]),
        ];
        let mut ir = QueryIr::new(10);
        ir.add_select("heart rate");
        ir.order_by = Some(SortSpec {
            field: "heart rate".to_string(),
            order: SortOrder::Desc,
        });
        let (results, _) = execute(&ir, &docs);
        let rates: Vec<&Value> = results
            .iter()
            .map(|r| r.get("heart rate").unwrap())
            .collect();
        assert_eq!(rates, vec![&json!(95), &json!(72), &json!(55)]);
    }

    #[test]
    fn diagnostics_use_translation_counts() {
        let stats = TranslationStats {
            fields_selected: 1,
            numerals_seen: 2,
            conditions_bound: 1,
        };
        let mut ir = QueryIr::new(10);
        ir.add_select("a");
        ir.add_select("b");
        let d = Diagnostics::new(&stats, &ir, 0, 5, 3);
        assert_eq!(d.select_completeness, 0.5);
        assert_eq!(d.condition_quality, 0.5);
        assert!(!d.has_results);
        assert_eq!(d.documents_scanned, 5);
    }
}
