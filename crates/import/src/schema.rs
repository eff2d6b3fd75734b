use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

use crate::util::closest_match;

/// Misspellings further than this from a required column are not suggested.
const SUGGESTION_MAX_EDITS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{table} is missing columns: {missing:?}. Found: {present:?}{}",
    hint_suffix(.suggestions)
)]
pub struct SchemaError {
    pub table: String,
    /// Sorted.
    pub missing: Vec<String>,
    /// In file order.
    pub present: Vec<String>,
    /// `(missing, closest present)` pairs for likely misspellings.
    pub suggestions: Vec<(String, String)>,
}

fn hint_suffix(suggestions: &[(String, String)]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }
    let hints: Vec<String> = suggestions
        .iter()
        .map(|(missing, found)| format!("'{found}' for '{missing}'"))
        .collect();
    format!(". Did you mean {}?", hints.join(", "))
}

/// Checks that every `required` column appears in `present`.
pub fn require_columns(table: &str, present: &[String], required: &[&str]) -> Result<(), SchemaError> {
    let have: BTreeSet<&str> = present.iter().map(String::as_str).collect();
    let missing: BTreeSet<&str> = required.iter().copied().filter(|c| !have.contains(c)).collect();

    if missing.is_empty() {
        return Ok(());
    }

    let suggestions = missing
        .iter()
        .filter_map(|m| {
            closest_match(m, present.iter().map(String::as_str), SUGGESTION_MAX_EDITS)
                .map(|found| (m.to_string(), found.to_string()))
        })
        .collect();

    Err(SchemaError {
        table: table.to_string(),
        missing: missing.into_iter().map(str::to_string).collect(),
        present: present.to_vec(),
        suggestions,
    })
}

/// Header-name → field-position lookup for a validated table.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new(headers: &[String]) -> Self {
        let mut positions = HashMap::with_capacity(headers.len());
        for (i, name) in headers.iter().enumerate() {
            // First occurrence wins for repeated header names.
            positions.entry(name.clone()).or_insert(i);
        }
        Self { positions }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// The field for `column`, or `""` when the column or the field is absent.
    pub fn field<'r>(&self, record: &'r csv::StringRecord, column: &str) -> &'r str {
        self.positions
            .get(column)
            .and_then(|&i| record.get(i))
            .unwrap_or_default()
    }
}
