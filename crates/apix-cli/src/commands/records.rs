//! Record browsing and editing commands.

use clap::Args;
use serde_json::Value;

use apix_core::config::AppConfig;
use apix_core::error::AppError;
use apix_core::types::{Attributes, EntityId, FilterRequest, QueryExtras};
use apix_database::DatabasePool;

use crate::output::{self, OutputFormat};

/// Arguments for listing records
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Repository name, e.g. `PostRepository`
    pub repository: String,
    /// Filters and paging as `key=value` (`page=2`, `sort=-views`, `status=draft`)
    pub params: Vec<String>,
}

/// Arguments for showing a record
#[derive(Debug, Args)]
pub struct GetArgs {
    /// Repository name
    pub repository: String,
    /// Record id
    pub id: i64,
}

/// Arguments for creating a record
#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Repository name
    pub repository: String,
    /// Attributes as a JSON object
    pub attributes: String,
}

/// Arguments for updating a record
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Repository name
    pub repository: String,
    /// Record id
    pub id: i64,
    /// Attributes to merge, as a JSON object
    pub attributes: String,
}

/// Arguments for deleting a record
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Repository name
    pub repository: String,
    /// Record id
    pub id: i64,
    /// Skip confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// Split `key=value` arguments; a bare key gets an empty value.
pub fn parse_params(params: &[String]) -> Result<FilterRequest, AppError> {
    FilterRequest::from_query(
        params
            .iter()
            .map(|p| p.split_once('=').unwrap_or((p.as_str(), ""))),
    )
}

/// Parse a JSON object argument into attributes.
pub fn parse_attributes(raw: &str) -> Result<Attributes, AppError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::validation("Attributes must be a JSON object")),
        Err(e) => Err(AppError::validation(format!("Invalid JSON attributes: {e}"))),
    }
}

/// List records
pub async fn list(
    args: &ListArgs,
    pool: &DatabasePool,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let request = parse_params(&args.params)?;
    let repo = super::repository(pool, config, &args.repository)?;

    let page = repo.list(&request, None, None, &QueryExtras::new()).await?;
    output::print_page(&page, format);
    Ok(())
}

/// Show one record
pub async fn get(
    args: &GetArgs,
    pool: &DatabasePool,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let repo = super::repository(pool, config, &args.repository)?;
    let record = repo.get(EntityId(args.id)).await?;
    output::print_record(&record, format);
    Ok(())
}

/// Create a record
pub async fn create(
    args: &CreateArgs,
    pool: &DatabasePool,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let attributes = parse_attributes(&args.attributes)?;
    let repo = super::repository(pool, config, &args.repository)?;

    let record = repo.create(attributes).await?;
    output::print_record(&record, format);
    output::print_success(&format!("Created record {}", record.id));
    Ok(())
}

/// Update a record
pub async fn update(
    args: &UpdateArgs,
    pool: &DatabasePool,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let attributes = parse_attributes(&args.attributes)?;
    let repo = super::repository(pool, config, &args.repository)?;

    let record = repo.update_by_id(EntityId(args.id), attributes).await?;
    output::print_record(&record, format);
    output::print_success(&format!("Updated record {}", record.id));
    Ok(())
}

/// Delete a record
pub async fn delete(
    args: &DeleteArgs,
    pool: &DatabasePool,
    config: &AppConfig,
) -> Result<(), AppError> {
    if !args.force {
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!("Delete record {} from {}?", args.id, args.repository))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let repo = super::repository(pool, config, &args.repository)?;
    if repo.delete_by_id(EntityId(args.id)).await? {
        output::print_success(&format!("Deleted record {}", args.id));
    } else {
        output::print_warning(&format!("Record {} was already gone", args.id));
    }
    Ok(())
}
