//! Manual-mapping prompts
//!
//! Two [`MappingPrompt`] implementations: an interactive one built on
//! `inquire` for terminal sessions, and an automatic one for `--yes` runs
//! that accepts the pipeline's suggestions and adds unmatched columns to the
//! schema.

use async_trait::async_trait;
use colored::Colorize;
use inquire::Select;
use rowbox_pipeline::coordinator::{MappingPrompt, MappingPromptRequest};
use rowbox_pipeline::mapping::MappingDecision;
use rowbox_pipeline::{PipelineError, Result};

const ADD_OPTION: &str = "[ add to schema ]";
const SKIP_OPTION: &str = "[ skip this column ]";

/// Interactive mapping prompt for terminal sessions.
///
/// Columns the schema already knows map identity without asking; one select
/// question is asked per new column.
#[derive(Debug, Default)]
pub struct InteractivePrompt;

#[async_trait]
impl MappingPrompt for InteractivePrompt {
    async fn resolve(&self, request: MappingPromptRequest) -> Result<Vec<MappingDecision>> {
        println!();
        println!(
            "{} '{}' has {} column(s) the schema does not know:",
            "Mapping required:".yellow().bold(),
            request.file_name,
            request.new_columns.len()
        );

        let mut decisions = Vec::with_capacity(request.file_columns.len());

        for file_column in &request.file_columns {
            if request.schema.has_column(file_column) {
                decisions.push(MappingDecision::map_to(file_column, file_column));
                continue;
            }

            let mut options: Vec<String> = request
                .schema
                .columns
                .iter()
                .map(|c| c.name.clone())
                .collect();
            options.push(ADD_OPTION.to_string());
            options.push(SKIP_OPTION.to_string());

            // Pre-select the pipeline's suggestion, defaulting to "add".
            let suggested = request
                .suggestions
                .iter()
                .find(|s| &s.file_column == file_column)
                .and_then(|s| s.schema_column.as_deref());
            let cursor = suggested
                .and_then(|name| options.iter().position(|o| o == name))
                .unwrap_or(options.len() - 2);

            let choice = Select::new(
                &format!("Map file column '{}' to:", file_column),
                options,
            )
            .with_starting_cursor(cursor)
            .prompt()
            .map_err(|e| PipelineError::mapping_prompt(e.to_string()))?;

            decisions.push(match choice.as_str() {
                ADD_OPTION => MappingDecision::add(file_column),
                SKIP_OPTION => MappingDecision::skip(file_column),
                schema_column => MappingDecision::map_to(file_column, schema_column),
            });
        }

        Ok(decisions)
    }
}

/// Non-interactive prompt for `--yes` runs.
///
/// Accepts every suggestion; file columns with no suggestion are added to
/// the schema so no data is silently dropped.
#[derive(Debug, Default)]
pub struct AcceptSuggestionsPrompt;

#[async_trait]
impl MappingPrompt for AcceptSuggestionsPrompt {
    async fn resolve(&self, request: MappingPromptRequest) -> Result<Vec<MappingDecision>> {
        let decisions = request
            .file_columns
            .iter()
            .map(|file_column| {
                if request.schema.has_column(file_column) {
                    return MappingDecision::map_to(file_column, file_column);
                }
                let suggested = request
                    .suggestions
                    .iter()
                    .find(|s| &s.file_column == file_column)
                    .and_then(|s| s.schema_column.clone());
                match suggested {
                    Some(schema_column) => MappingDecision::map_to(file_column, schema_column),
                    None => MappingDecision::add(file_column),
                }
            })
            .collect();

        Ok(decisions)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rowbox_common::types::{Schema, SchemaColumn};
    use rowbox_pipeline::mapping::Suggestion;
    use uuid::Uuid;

    fn request_with(
        file_columns: &[&str],
        schema_columns: &[&str],
        suggestions: Vec<Suggestion>,
    ) -> MappingPromptRequest {
        let schema = Schema {
            id: Uuid::new_v4(),
            name: "default".to_string(),
            columns: schema_columns.iter().map(|n| SchemaColumn::text(*n)).collect(),
            is_active: true,
        };
        MappingPromptRequest {
            file_id: Uuid::new_v4(),
            file_name: "sales.csv".to_string(),
            file_columns: file_columns.iter().map(|s| s.to_string()).collect(),
            new_columns: file_columns
                .iter()
                .filter(|c| !schema_columns.contains(c))
                .map(|s| s.to_string())
                .collect(),
            schema,
            suggestions,
        }
    }

    #[tokio::test]
    async fn test_accept_prompt_follows_suggestions() {
        let request = request_with(
            &["Full Name", "region"],
            &["full_name"],
            vec![
                Suggestion {
                    file_column: "Full Name".to_string(),
                    schema_column: Some("full_name".to_string()),
                },
                Suggestion {
                    file_column: "region".to_string(),
                    schema_column: None,
                },
            ],
        );

        let decisions = AcceptSuggestionsPrompt.resolve(request).await.unwrap();
        assert_eq!(
            decisions,
            vec![
                MappingDecision::map_to("Full Name", "full_name"),
                MappingDecision::add("region"),
            ]
        );
    }

    #[tokio::test]
    async fn test_accept_prompt_maps_known_columns_identity() {
        let request = request_with(&["name", "region"], &["name"], Vec::new());
        let decisions = AcceptSuggestionsPrompt.resolve(request).await.unwrap();
        assert_eq!(
            decisions,
            vec![
                MappingDecision::map_to("name", "name"),
                MappingDecision::add("region"),
            ]
        );
    }
}
