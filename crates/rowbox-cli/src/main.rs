//! Rowbox CLI - Main entry point

use clap::Parser;
use rowbox_cli::{Cli, Commands, SchemaCommand};
use rowbox_common::logging::init_logging;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Resolve logging: CLI defaults, then env overrides, then --verbose
    let log_config = rowbox_cli::resolve_log_config(cli.verbose);

    // Initialize logging (ignore errors as CLI should work without logging)
    let _ = init_logging(&log_config);

    // Execute command
    let result = execute_command(cli).await;

    // Handle result
    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: Cli) -> rowbox_cli::Result<()> {
    match cli.command {
        Commands::Upload { path, yes, no_wait } => {
            rowbox_cli::commands::upload::run(cli.server_url, cli.project_id, path, yes, no_wait)
                .await
        }

        Commands::Status { file_id, watch } => {
            rowbox_cli::commands::status::run(cli.server_url, file_id, watch).await
        }

        Commands::Files => rowbox_cli::commands::files::run(cli.server_url, cli.project_id).await,

        Commands::Schema { command } => match command {
            SchemaCommand::Show => {
                rowbox_cli::commands::schema::show(cli.server_url, cli.project_id).await
            }
            SchemaCommand::List => {
                rowbox_cli::commands::schema::list(cli.server_url, cli.project_id).await
            }
        },

        Commands::Retry { file_id } => {
            rowbox_cli::commands::retry::run(cli.server_url, file_id).await
        }

        Commands::Errors { file_id } => {
            rowbox_cli::commands::errors::run(cli.server_url, file_id).await
        }
    }
}
