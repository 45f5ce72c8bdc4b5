//! Column mapping
//!
//! Two operating modes. Suggestion mode proposes a best-effort 1:1 mapping
//! from file columns to schema columns with a deterministic similarity
//! ranking; it is non-binding and pre-fills the manual-mapping form. Commit
//! mode takes the user's explicit decisions, grows the schema where asked
//! (append-only, never removing or retyping existing columns), and builds
//! the final mapping record.

use rowbox_common::types::{ColumnMapping, Schema, SchemaColumn};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;
use uuid::Uuid;

// ============================================================================
// Suggestion Mode
// ============================================================================

/// A non-binding suggestion for a single file column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub file_column: String,
    /// Suggested schema column, or `None` when nothing matched (the UI may
    /// offer "add to schema" for these).
    pub schema_column: Option<String>,
}

/// Strip non-alphanumeric characters and lower-case.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Propose a best-effort 1:1 mapping from file columns to schema columns.
///
/// For each file column, schema columns are searched in declared order with
/// three priority levels, first match wins:
///
/// 1. case-insensitive exact name equality
/// 2. equality of normalized forms (alphanumeric only, lower-cased)
/// 3. substring containment either direction on the normalized forms
///
/// Each schema column is suggested at most once, so the proposal stays 1:1.
pub fn suggest(file_columns: &[String], schema_columns: &[SchemaColumn]) -> Vec<Suggestion> {
    let mut used: HashSet<&str> = HashSet::new();
    let mut suggestions = Vec::with_capacity(file_columns.len());

    for file_column in file_columns {
        let normalized_file = normalize(file_column);

        let exact = schema_columns.iter().find(|sc| {
            !used.contains(sc.name.as_str()) && sc.name.eq_ignore_ascii_case(file_column)
        });

        let matched = exact
            .or_else(|| {
                schema_columns.iter().find(|sc| {
                    !used.contains(sc.name.as_str())
                        && !normalized_file.is_empty()
                        && normalize(&sc.name) == normalized_file
                })
            })
            .or_else(|| {
                schema_columns.iter().find(|sc| {
                    if used.contains(sc.name.as_str()) || normalized_file.is_empty() {
                        return false;
                    }
                    let normalized_schema = normalize(&sc.name);
                    !normalized_schema.is_empty()
                        && (normalized_schema.contains(&normalized_file)
                            || normalized_file.contains(&normalized_schema))
                })
            });

        if let Some(sc) = matched {
            used.insert(sc.name.as_str());
            suggestions.push(Suggestion {
                file_column: file_column.clone(),
                schema_column: Some(sc.name.clone()),
            });
        } else {
            suggestions.push(Suggestion {
                file_column: file_column.clone(),
                schema_column: None,
            });
        }
    }

    suggestions
}

// ============================================================================
// Commit Mode
// ============================================================================

/// One user decision for a file column in the manual-mapping form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDecision {
    pub file_column: String,
    /// Chosen schema column, if any.
    pub schema_column: Option<String>,
    /// When no schema column is chosen, create one named after the file
    /// column instead of dropping the data.
    pub add_to_schema: bool,
}

impl MappingDecision {
    /// Map a file column to an existing schema column.
    pub fn map_to(file_column: impl Into<String>, schema_column: impl Into<String>) -> Self {
        Self {
            file_column: file_column.into(),
            schema_column: Some(schema_column.into()),
            add_to_schema: false,
        }
    }

    /// Add the file column to the schema and map it to itself.
    pub fn add(file_column: impl Into<String>) -> Self {
        Self {
            file_column: file_column.into(),
            schema_column: None,
            add_to_schema: true,
        }
    }

    /// Leave the file column unmapped; its data is not projected.
    pub fn skip(file_column: impl Into<String>) -> Self {
        Self {
            file_column: file_column.into(),
            schema_column: None,
            add_to_schema: false,
        }
    }
}

/// Result of committing a set of mapping decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    /// The mapping record to persist.
    pub mapping: ColumnMapping,
    /// The schema with any added columns appended. Identical to the input
    /// schema when nothing was added.
    pub schema: Schema,
    /// Columns created as a side effect of this commit.
    pub added_columns: Vec<SchemaColumn>,
    /// Advisory warnings (unmapped required schema columns, dropped entries
    /// with unknown targets). Never blocking.
    pub warnings: Vec<String>,
}

/// Apply the user's mapping decisions against a schema.
///
/// Append-only with respect to the schema: columns may be added (as `text`,
/// not required), never removed or retyped. Entries left unmapped without
/// `add_to_schema` are dropped; their data is not projected. Required-column
/// coverage is advisory only.
pub fn commit(file_id: Uuid, schema: &Schema, decisions: &[MappingDecision]) -> CommitOutcome {
    let mut updated = schema.clone();
    let mut added_columns = Vec::new();
    let mut mappings = BTreeMap::new();
    let mut warnings = Vec::new();

    for decision in decisions {
        match (&decision.schema_column, decision.add_to_schema) {
            (Some(target), _) => {
                if updated.has_column(target) {
                    mappings.insert(decision.file_column.clone(), target.clone());
                } else {
                    warnings.push(format!(
                        "Dropped mapping '{}' -> '{}': no such schema column",
                        decision.file_column, target
                    ));
                }
            }
            (None, true) => {
                if !updated.has_column(&decision.file_column) {
                    let column = SchemaColumn::text(&decision.file_column);
                    updated.columns.push(column.clone());
                    added_columns.push(column);
                }
                mappings.insert(decision.file_column.clone(), decision.file_column.clone());
            }
            (None, false) => {
                // Explicitly unmapped: the column's data is not projected.
            }
        }
    }

    for required in updated.uncovered_required(&mappings) {
        warnings.push(format!(
            "Required schema column '{}' is not covered by this mapping",
            required
        ));
    }
    for warning in &warnings {
        warn!(file_id = %file_id, "{}", warning);
    }

    CommitOutcome {
        mapping: ColumnMapping {
            file_id,
            schema_id: schema.id,
            mappings,
            new_columns_added: added_columns.len(),
        },
        schema: updated,
        added_columns,
        warnings,
    }
}
