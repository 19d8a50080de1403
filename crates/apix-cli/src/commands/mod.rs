//! CLI command definitions and dispatch.

pub mod migrate;
pub mod records;

use clap::{Parser, Subcommand};
use tracing::debug;

use apix_core::config::AppConfig;
use apix_core::error::AppError;
use apix_core::traits::NoHooks;
use apix_core::types::Record;
use apix_database::{DatabasePool, PgModel};
use apix_repository::{GenericRepository, ModelRegistry};

use crate::output::OutputFormat;

/// Apix — generic repositories over PostgreSQL record tables
#[derive(Debug, Parser)]
#[command(name = "apix", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record table management
    Migrate(migrate::MigrateArgs),
    /// List records, filtered by `key=value` pairs
    List(records::ListArgs),
    /// Show one record
    Get(records::GetArgs),
    /// Create a record from a JSON object
    Create(records::CreateArgs),
    /// Merge a JSON object into a record
    Update(records::UpdateArgs),
    /// Delete a record
    Delete(records::DeleteArgs),
}

impl Cli {
    /// Execute the CLI command on one pool, closed afterwards
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        let pool = connect(config).await?;
        let result = self.dispatch(&pool, config).await;
        pool.close().await;
        result
    }

    async fn dispatch(&self, pool: &DatabasePool, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, pool, config, self.format).await,
            Commands::List(args) => records::list(args, pool, config, self.format).await,
            Commands::Get(args) => records::get(args, pool, config, self.format).await,
            Commands::Create(args) => records::create(args, pool, config, self.format).await,
            Commands::Update(args) => records::update(args, pool, config, self.format).await,
            Commands::Delete(args) => records::delete(args, pool, config).await,
        }
    }
}

/// Helper: load configuration from file and environment
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: connect to the configured database
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: register a record model for every configured table
pub fn model_registry(
    pool: &DatabasePool,
    config: &AppConfig,
) -> ModelRegistry<PgModel<Record>> {
    let mut registry = ModelRegistry::from_config(&config.models);
    for (name, table) in &config.models.tables {
        let pool = pool.clone();
        let (model_name, table) = (name.clone(), table.clone());
        registry.register(name, move || pool.model(&model_name, &table));
    }
    registry
}

/// Helper: build the repository for a repository name such as `PostRepository`
pub fn repository(
    pool: &DatabasePool,
    config: &AppConfig,
    repository_name: &str,
) -> Result<GenericRepository<PgModel<Record>>, AppError> {
    let registry = model_registry(pool, config);
    debug!(repository = repository_name, namespace = registry.namespace(), "Resolving repository");
    GenericRepository::from_registry(
        &registry,
        repository_name,
        NoHooks,
        config.pagination.clone(),
    )
}
