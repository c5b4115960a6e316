//! Intermediate representation of an accumulated query.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Gt,
    Lt,
    Eq,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Gt => write!(f, ">"),
            Operator::Lt => write!(f, "<"),
            Operator::Eq => write!(f, "="),
        }
    }
}

/// One filter conjunct on a field. Retained verbatim from translation; never
/// validated against the schema, so it may reference a field absent from
/// every document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub op: Operator,
    pub value: f64,
}

impl Condition {
    #[inline]
    #[must_use]
    pub fn new(op: Operator, value: f64) -> Self {
        Self { op, value }
    }

    /// Evaluates this conjunct against a numeric field value.
    #[inline]
    pub fn holds(&self, actual: f64) -> bool {
        match self.op {
            Operator::Gt => actual > self.value,
            Operator::Lt => actual < self.value,
            Operator::Eq => actual == self.value,
        }
    }
}

/// Conditions on one field, ANDed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub field: String,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}

/// Result ordering on one field. Supplied per request, never extracted from
/// the free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

/// The `{select_fields, filters, limit}` triple produced by translation and
/// consumed by synthesis and execution. Filters keep field insertion order so
/// the synthesized query lists conjuncts in filter-then-condition order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIr {
    pub select_fields: Vec<String>,
    filters: Vec<FilterEntry>,
    pub limit: usize,
    /// Passing records skipped before accumulation starts.
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub order_by: Option<SortSpec>,
}

impl QueryIr {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            select_fields: Vec::new(),
            filters: Vec::new(),
            limit,
            offset: 0,
            order_by: None,
        }
    }

    #[inline]
    pub fn filters(&self) -> &[FilterEntry] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.select_fields.is_empty() && self.filters.is_empty()
    }

    /// Adds a selected field, keeping first-seen order and no duplicates.
    pub fn add_select(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.select_fields.contains(&field) {
            self.select_fields.push(field);
        }
    }

    /// Appends a condition for `field`, deduplicating identical
    /// `(field, op, value)` triples.
    pub fn add_condition(&mut self, field: impl Into<String>, condition: Condition) {
        let field = field.into();
        if let Some(idx) = self.filters.iter().position(|e| e.field == field) {
            let entry = &mut self.filters[idx];
            if !entry.conditions.contains(&condition) {
                entry.conditions.push(condition);
            }
        } else {
            self.filters.push(FilterEntry {
                field,
                conditions: vec![condition],
            });
        }
    }

    pub fn condition_count(&self) -> usize {
        self.filters.iter().map(|e| e.conditions.len()).sum()
    }

    /// Folds a translated fragment into this accumulated IR.
    ///
    /// Selected fields and conditions only ever grow; a fragment's limit is
    /// taken only when it differs from the configured default, so a request
    /// that never mentioned a limit does not clobber a customized one. Offset
    /// and ordering are taken only when the fragment states them.
    pub fn merge(&mut self, fragment: QueryIr, default_limit: usize) {
        for field in fragment.select_fields {
            self.add_select(field);
        }
        for entry in fragment.filters {
            for condition in entry.conditions {
                self.add_condition(entry.field.clone(), condition);
            }
        }
        if fragment.limit != default_limit {
            self.limit = fragment.limit;
        }
        if fragment.offset != 0 {
            self.offset = fragment.offset;
        }
        if fragment.order_by.is_some() {
            self.order_by = fragment.order_by;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_order_is_first_seen_without_duplicates() {
        let mut ir = QueryIr::new(100);
        ir.add_select("a");
        ir.add_select("b");
        ir.add_select("a");
        assert_eq!(ir.select_fields, vec!["a", "b"]);
    }

    #[test]
    fn identical_condition_triples_are_deduplicated() {
        let mut ir = QueryIr::new(100);
        ir.add_condition("hr", Condition::new(Operator::Gt, 80.0));
        ir.add_condition("hr", Condition::new(Operator::Gt, 80.0));
        ir.add_condition("hr", Condition::new(Operator::Lt, 120.0));
        assert_eq!(ir.condition_count(), 2);
    }

    #[test]
    fn merge_keeps_customized_limit_when_fragment_carries_default() {
        let mut ir = QueryIr::new(100);
        let mut first = QueryIr::new(100);
        first.limit = 5;
        ir.merge(first, 100);
        assert_eq!(ir.limit, 5);

        // No limit mentioned: the fragment carries the default.
        ir.merge(QueryIr::new(100), 100);
        assert_eq!(ir.limit, 5);

        let mut third = QueryIr::new(100);
        third.limit = 7;
        ir.merge(third, 100);
        assert_eq!(ir.limit, 7);
    }

    #[test]
    fn merge_carries_sort_and_offset_forward() {
        let mut ir = QueryIr::new(100);
        let mut frag = QueryIr::new(100);
        frag.offset = 10;
        frag.order_by = Some(SortSpec {
            field: "heart rate".to_string(),
            order: SortOrder::Desc,
        });
        ir.merge(frag, 100);
        assert_eq!(ir.offset, 10);
        assert_eq!(ir.order_by.as_ref().unwrap().field, "heart rate");

        // A fragment stating neither leaves both alone.
        ir.merge(QueryIr::new(100), 100);
        assert_eq!(ir.offset, 10);
        assert!(ir.order_by.is_some());
    }

    #[test]
    fn merge_is_monotonic() {
        let mut ir = QueryIr::new(100);
        let mut frag = QueryIr::new(100);
        frag.add_select("heart rate");
        frag.add_condition("heart rate", Condition::new(Operator::Lt, 60.0));
        ir.merge(frag.clone(), 100);
        let selects = ir.select_fields.len();
        let conditions = ir.condition_count();

        let mut other = QueryIr::new(100);
        other.add_select("weight");
        ir.merge(other, 100);
        assert!(ir.select_fields.len() >= selects);
        assert!(ir.condition_count() >= conditions);
    }
}
