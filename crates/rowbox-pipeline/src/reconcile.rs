//! Schema reconciliation
//!
//! Pure decision function comparing a file's extracted columns against the
//! project's active schema. New-column detection is exact, case-sensitive
//! set difference; it only decides whether manual intervention is required,
//! never how columns map (that is the column mapper's job, which is fuzzier
//! on purpose).

use rowbox_common::types::{Schema, SchemaColumn};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Outcome of reconciling file columns against the active schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// No active schema exists: create one with a text column per file
    /// column and map identity.
    CreateSchema { columns: Vec<SchemaColumn> },

    /// Every file column already exists in the schema: map identity with no
    /// user interaction.
    AutoMap {
        schema_id: Uuid,
        mappings: BTreeMap<String, String>,
    },

    /// At least one file column is absent from the schema: the pipeline must
    /// pause for a manual mapping before activation.
    ManualMappingRequired {
        schema_id: Uuid,
        new_columns: Vec<String>,
    },
}

/// Decide how a file's columns reconcile against the active schema.
///
/// Pure and idempotent: the same inputs always produce the same decision,
/// so re-running reconciliation after an auto-create yields the same schema
/// column set.
pub fn reconcile(file_columns: &[String], active_schema: Option<&Schema>) -> Reconciliation {
    let file_columns = dedupe(file_columns);

    match active_schema {
        None => Reconciliation::CreateSchema {
            columns: file_columns.iter().map(SchemaColumn::text).collect(),
        },
        Some(schema) => {
            let new_columns: Vec<String> = file_columns
                .iter()
                .filter(|c| !schema.has_column(c))
                .cloned()
                .collect();

            if new_columns.is_empty() {
                Reconciliation::AutoMap {
                    schema_id: schema.id,
                    mappings: file_columns.into_iter().map(|c| (c.clone(), c)).collect(),
                }
            } else {
                Reconciliation::ManualMappingRequired {
                    schema_id: schema.id,
                    new_columns,
                }
            }
        }
    }
}

/// Drop repeated column names, keeping first occurrence order. Schema column
/// names must be unique, so a file that repeats a header contributes it once.
fn dedupe(columns: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    columns
        .iter()
        .filter(|c| seen.insert(c.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rowbox_common::types::ColumnType;

    fn schema_with(names: &[&str]) -> Schema {
        Schema {
            id: Uuid::new_v4(),
            name: "default".to_string(),
            columns: names.iter().map(|n| SchemaColumn::text(*n)).collect(),
            is_active: true,
        }
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_no_schema_auto_creates_text_columns() {
        let decision = reconcile(&cols(&["name", "email", "amount"]), None);
        match decision {
            Reconciliation::CreateSchema { columns } => {
                assert_eq!(columns.len(), 3);
                assert!(columns.iter().all(|c| c.column_type == ColumnType::Text));
                assert!(columns.iter().all(|c| !c.is_required));
                assert_eq!(
                    columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                    vec!["name", "email", "amount"]
                );
            }
            other => panic!("expected CreateSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_auto_create_is_idempotent() {
        let input = cols(&["a", "b", "c"]);
        let first = reconcile(&input, None);
        let second = reconcile(&input, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_subset_columns_auto_map_identity() {
        let schema = schema_with(&["a", "b", "c"]);
        let decision = reconcile(&cols(&["a", "b"]), Some(&schema));
        match decision {
            Reconciliation::AutoMap { schema_id, mappings } => {
                assert_eq!(schema_id, schema.id);
                assert_eq!(mappings.get("a").map(String::as_str), Some("a"));
                assert_eq!(mappings.get("b").map(String::as_str), Some("b"));
                assert_eq!(mappings.len(), 2);
            }
            other => panic!("expected AutoMap, got {:?}", other),
        }
    }

    #[test]
    fn test_new_column_is_exact_set_difference() {
        let schema = schema_with(&["a", "b"]);
        let decision = reconcile(&cols(&["a", "b", "c"]), Some(&schema));
        match decision {
            Reconciliation::ManualMappingRequired { schema_id, new_columns } => {
                assert_eq!(schema_id, schema.id);
                assert_eq!(new_columns, vec!["c"]);
            }
            other => panic!("expected ManualMappingRequired, got {:?}", other),
        }
    }

    #[test]
    fn test_detection_is_case_sensitive() {
        // "Email" vs "email" is a new column here even though the mapper
        // would suggest them as a match.
        let schema = schema_with(&["email"]);
        let decision = reconcile(&cols(&["Email"]), Some(&schema));
        assert!(matches!(
            decision,
            Reconciliation::ManualMappingRequired { ref new_columns, .. } if new_columns == &vec!["Email".to_string()]
        ));
    }

    #[test]
    fn test_repeated_file_columns_contribute_once() {
        let decision = reconcile(&cols(&["a", "a", "b"]), None);
        match decision {
            Reconciliation::CreateSchema { columns } => {
                assert_eq!(
                    columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                    vec!["a", "b"]
                );
            }
            other => panic!("expected CreateSchema, got {:?}", other),
        }
    }
}
