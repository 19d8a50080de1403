//! Record table management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use apix_core::config::AppConfig;
use apix_core::error::AppError;
use apix_database::{DatabasePool, migration};

use crate::output::{self, OutputFormat};

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Create every configured record table that is missing
    Run,
    /// Show which configured tables exist
    Status,
}

/// Table status row for table output
#[derive(Debug, Serialize, Tabled)]
struct TableRow {
    /// Model name
    model: String,
    /// Record table
    table: String,
    /// Whether the table exists
    exists: bool,
}

/// Execute migration commands
pub async fn execute(
    args: &MigrateArgs,
    pool: &DatabasePool,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    if config.models.tables.is_empty() {
        output::print_warning("No tables configured under [models.tables].");
        return Ok(());
    }

    match &args.command {
        MigrateCommand::Run => {
            println!("Preparing record tables...");
            for table in config.models.tables.values() {
                migration::ensure_table(pool.pool(), table).await?;
            }
            output::print_success(&format!(
                "{} record table(s) ready.",
                config.models.tables.len()
            ));
        }
        MigrateCommand::Status => {
            if pool.health_check().await? {
                output::print_success("Database reachable.");
            }
            let mut rows = Vec::with_capacity(config.models.tables.len());
            for (model, table) in &config.models.tables {
                rows.push(TableRow {
                    model: model.clone(),
                    table: table.clone(),
                    exists: migration::table_exists(pool.pool(), table).await?,
                });
            }
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
