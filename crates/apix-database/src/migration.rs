//! Record table provisioning.

use sqlx::PgPool;
use tracing::info;

use apix_core::error::{AppError, ErrorKind};

use crate::sql;

/// Statements creating a record table and its indexes.
pub fn table_statements(table: &str) -> Result<Vec<String>, AppError> {
    sql::validate_identifier(table)?;
    Ok(vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
             id BIGSERIAL PRIMARY KEY, \
             data JSONB NOT NULL DEFAULT '{{}}'::jsonb, \
             created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
             updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW())"
        ),
        format!("CREATE INDEX IF NOT EXISTS {table}_data_idx ON {table} USING GIN (data)"),
        format!("CREATE INDEX IF NOT EXISTS {table}_created_at_idx ON {table} (created_at)"),
    ])
}

/// Create a record table if it does not exist.
pub async fn ensure_table(pool: &PgPool, table: &str) -> Result<(), AppError> {
    for statement in table_statements(table)? {
        sqlx::query(&statement).execute(pool).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to prepare table '{table}': {e}"),
                e,
            )
        })?;
    }

    info!(table, "Record table ready");
    Ok(())
}

/// Whether a record table exists.
pub async fn table_exists(pool: &PgPool, table: &str) -> Result<bool, AppError> {
    sql::validate_identifier(table)?;
    sqlx::query_scalar::<_, bool>("SELECT to_regclass($1) IS NOT NULL")
        .bind(table)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to inspect table '{table}'"),
                e,
            )
        })
}
