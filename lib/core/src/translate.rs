//! Free text → IR fragment translation.
//!
//! This is deliberately not a grammar: it is windowed lemma matching, robust
//! against informal phrasing. Text splits at the first `where` into a select
//! segment and a filter segment; fields are selected by signature
//! intersection, conditions are bound by scanning a bounded neighborhood
//! around each numeral, and the limit comes from a numeral adjacent to a
//! limit indicator. Binding is local (±3 tokens) on purpose, to keep
//! multi-condition clauses from cross-contaminating each other.

use crate::ir::{Condition, Operator, QueryIr};
use crate::lexicon::{Analyzer, Token};
use crate::schema::SchemaSnapshot;
use std::collections::HashSet;
use std::sync::Arc;

/// Token distance considered "local" when binding operators, fields and
/// limits to a numeral.
const WINDOW: usize = 3;

const GT_WORDS: &str = "great greater above more over";
const LT_WORDS: &str = "less below under";
const EQ_WORDS: &str = "equal equals is";
const LIMIT_WORDS: &str = "top first limit only";

/// Diagnostic counts gathered during one translation. Ratios on the response
/// are derived from these, never recomputed from results.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslationStats {
    /// Fields the select segment matched.
    pub fields_selected: usize,
    /// Numeric literals seen in the filter segment, bound or not.
    pub numerals_seen: usize,
    /// Numerals that resolved to an operator and a field.
    pub conditions_bound: usize,
}

#[derive(Debug, Clone)]
pub struct Translation {
    pub ir: QueryIr,
    pub stats: TranslationStats,
}

pub struct Translator {
    analyzer: Arc<dyn Analyzer>,
    gt: HashSet<String>,
    lt: HashSet<String>,
    eq: HashSet<String>,
    limit_markers: HashSet<String>,
}

impl Translator {
    /// Keyword sets are run through the analyzer once here, so matching
    /// against input tokens is always stem-to-stem.
    #[must_use]
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        let lemmas = |words: &str| -> HashSet<String> {
            analyzer.analyze(words).into_iter().map(|t| t.lemma).collect()
        };
        let gt = lemmas(GT_WORDS);
        let lt = lemmas(LT_WORDS);
        let eq = lemmas(EQ_WORDS);
        let limit_markers = lemmas(LIMIT_WORDS);
        Self {
            analyzer,
            gt,
            lt,
            eq,
            limit_markers,
        }
    }

    fn operator_for(&self, lemma: &str) -> Option<Operator> {
        if self.gt.contains(lemma) {
            Some(Operator::Gt)
        } else if self.lt.contains(lemma) {
            Some(Operator::Lt)
        } else if self.eq.contains(lemma) {
            Some(Operator::Eq)
        } else {
            None
        }
    }

    /// Translates one utterance against the given schema snapshot. Empty or
    /// all-stopword input yields an empty fragment; that is not an error.
    pub fn translate(
        &self,
        text: &str,
        schema: &SchemaSnapshot,
        default_limit: usize,
    ) -> Translation {
        let tokens = self.analyzer.analyze(text);
        let mut ir = QueryIr::new(default_limit);
        let mut stats = TranslationStats::default();

        let (select_end, filter_start) = match tokens.iter().position(|t| t.text == "where") {
            Some(i) => (i, i + 1),
            None => (tokens.len(), tokens.len()),
        };

        self.select_fields(&tokens[..select_end], schema, &mut ir);
        stats.fields_selected = ir.select_fields.len();

        let consumed = self.bind_conditions(&tokens, filter_start, schema, &mut ir, &mut stats);
        self.extract_limit(&tokens, &consumed, &mut ir);

        Translation { ir, stats }
    }

    /// A field is selected iff its signature intersects the select segment's
    /// lemma set. Output order is schema order, duplicates impossible.
    fn select_fields(&self, select_tokens: &[Token], schema: &SchemaSnapshot, ir: &mut QueryIr) {
        let lemmas: HashSet<&str> = select_tokens
            .iter()
            .filter(|t| t.is_alpha)
            .map(|t| t.lemma.as_str())
            .collect();
        if lemmas.is_empty() {
            return;
        }
        for field in schema.fields() {
            let matched = schema
                .signature(field)
                .is_some_and(|sig| sig.iter().any(|l| lemmas.contains(l.as_str())));
            if matched {
                ir.add_select(field.clone());
            }
        }
    }

    /// For each numeral in the filter segment: resolve an operator from the
    /// preceding window, then bind the nearest preceding field-signature
    /// match. Either step failing discards the numeral. Returns the token
    /// positions of numerals that became condition values.
    fn bind_conditions(
        &self,
        tokens: &[Token],
        filter_start: usize,
        schema: &SchemaSnapshot,
        ir: &mut QueryIr,
        stats: &mut TranslationStats,
    ) -> HashSet<usize> {
        let mut consumed = HashSet::new();
        for i in filter_start..tokens.len() {
            let Some(value) = tokens[i].numeric else {
                continue;
            };
            stats.numerals_seen += 1;

            // Windows never reach back across the `where` boundary.
            let low = i.saturating_sub(WINDOW).max(filter_start);
            let Some(op) = (low..i)
                .rev()
                .find_map(|j| self.operator_for(&tokens[j].lemma))
            else {
                continue;
            };

            let Some(field) = self.bind_field(tokens, i, low, schema) else {
                continue;
            };
            ir.add_condition(field, Condition::new(op, value));
            stats.conditions_bound += 1;
            consumed.insert(i);
        }
        consumed
    }

    /// Nearest-preceding field binding: the closest token whose lemma occurs
    /// in some field signature wins; among fields matching at that token, the
    /// largest overlap with the local window wins, ties broken by schema
    /// order.
    fn bind_field(
        &self,
        tokens: &[Token],
        numeral: usize,
        low: usize,
        schema: &SchemaSnapshot,
    ) -> Option<String> {
        let hi = (numeral + WINDOW + 1).min(tokens.len());
        let window: HashSet<&str> = tokens[low..hi]
            .iter()
            .filter(|t| t.is_alpha)
            .map(|t| t.lemma.as_str())
            .collect();

        for j in (low..numeral).rev() {
            if !tokens[j].is_alpha {
                continue;
            }
            let mut best: Option<(&String, usize)> = None;
            for field in schema.fields() {
                let Some(sig) = schema.signature(field) else {
                    continue;
                };
                if !sig.contains(&tokens[j].lemma) {
                    continue;
                }
                let overlap = sig.iter().filter(|l| window.contains(l.as_str())).count();
                if best.map_or(true, |(_, b)| overlap > b) {
                    best = Some((field, overlap));
                }
            }
            if let Some((field, _)) = best {
                return Some(field.clone());
            }
        }
        None
    }

    /// First numeral not already spent on a condition that sits within ±3
    /// tokens of a limit indicator and coerces to a positive integer.
    fn extract_limit(&self, tokens: &[Token], consumed: &HashSet<usize>, ir: &mut QueryIr) {
        for i in 0..tokens.len() {
            let Some(value) = tokens[i].numeric else {
                continue;
            };
            if consumed.contains(&i) {
                continue;
            }
            let low = i.saturating_sub(WINDOW);
            let hi = (i + WINDOW + 1).min(tokens.len());
            let near_marker = tokens[low..hi]
                .iter()
                .any(|t| self.limit_markers.contains(&t.lemma));
            if near_marker && value > 0.0 && value.fract() == 0.0 {
                ir.limit = value as usize;
                return;
            }
        }
    }
}
