use serde_json::Value;
use thiserror::Error;

use super::Category;

pub const COMPANY_NAME_FIELD: &str = "Company Name";
pub const TYPE_FIELD: &str = "Type";
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record {index} is null")]
    NullRecord { index: usize },
}

// Numbers print the way the browser stringified them: whole values have no
// fractional part.
fn number_text(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

// Airtable cell values are loosely typed. Strings pass through, numbers and
// booleans are stringified, string lists (multi-selects) are comma-joined.
// Null, empty and `false` count as absent.
fn cell_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.as_f64() != Some(0.0) => number_text(n),
        Value::Bool(true) => "true".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                Value::Number(n) => number_text(n),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(","),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Returns `(type, company name)` for a raw record, or `None` when the record
/// has no usable company name.
pub fn classify_record(record: &Value) -> Option<(String, String)> {
    let fields = record.get("fields").and_then(Value::as_object)?;
    let name = cell_text(fields.get(COMPANY_NAME_FIELD))?;
    let kind = cell_text(fields.get(TYPE_FIELD)).unwrap_or_else(|| UNCATEGORIZED.to_string());
    Some((kind, name))
}

/// Groups raw records by their type field into categories, in first-seen
/// order. Descriptions come from the placeholder category with exactly the
/// same name (case-sensitive), else stay empty.
///
/// A `null` entry rejects the whole batch. Other non-object entries have no
/// fields and are dropped like any record without a name.
pub fn group_records(
    records: &[Value],
    placeholder: &[Category],
) -> Result<Vec<Category>, RecordError> {
    if let Some(index) = records.iter().position(Value::is_null) {
        return Err(RecordError::NullRecord { index });
    }
    let mut grouped: Vec<Category> = Vec::new();
    for record in records {
        let Some((kind, name)) = classify_record(record) else {
            continue;
        };
        match grouped.iter_mut().find(|c| c.name == kind) {
            Some(category) => category.companies.push(name),
            None => {
                let description = placeholder
                    .iter()
                    .find(|p| p.name == kind)
                    .map(|p| p.description.clone())
                    .unwrap_or_default();
                grouped.push(Category {
                    name: kind,
                    description,
                    companies: vec![name],
                });
            }
        }
    }
    Ok(grouped)
}
