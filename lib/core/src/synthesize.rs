//! AQL synthesis.
//!
//! Renders an accumulated IR as an AQL-style string for display and audit.
//! The string is never parsed back or executed; the execution engine works
//! directly off the IR.

use crate::ir::QueryIr;
use crate::schema::SchemaSnapshot;
use std::fmt::Write;

fn field_path(field: &str) -> String {
    format!("c/content/items[name/value='{}']/value/magnitude", field)
}

fn alias(field: &str) -> String {
    field
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn literal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Pure IR → string rendering. An empty selection substitutes the first
/// schema field so the projection list is never syntactically empty; an empty
/// schema falls back to `*`.
pub fn synthesize(ir: &QueryIr, schema: &SchemaSnapshot) -> String {
    let mut out = String::from("SELECT ");

    if ir.select_fields.is_empty() {
        match schema.first_field() {
            Some(field) => {
                let _ = write!(out, "{} AS {}", field_path(field), alias(field));
            }
            None => out.push('*'),
        }
    } else {
        let clauses: Vec<String> = ir
            .select_fields
            .iter()
            .map(|f| format!("{} AS {}", field_path(f), alias(f)))
            .collect();
        out.push_str(&clauses.join(", "));
    }

    out.push_str("\nFROM EHR e\nCONTAINS COMPOSITION c");

    let mut first = true;
    for entry in ir.filters() {
        for condition in &entry.conditions {
            let keyword = if first { "\nWHERE" } else { "\n  AND" };
            first = false;
            let _ = write!(
                out,
                "{} {} {} {}",
                keyword,
                field_path(&entry.field),
                condition.op,
                literal(condition.value)
            );
        }
    }

    if let Some(sort) = &ir.order_by {
        let _ = write!(out, "\nORDER BY {} {}", field_path(&sort.field), sort.order);
    }

    if ir.offset > 0 {
        let _ = write!(out, "\nOFFSET {}", ir.offset);
    }
    let _ = write!(out, "\nLIMIT {}", ir.limit);
    out
}
