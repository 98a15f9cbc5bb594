//! Per-model descriptions and per-category variant field settings.

use catalog_core::{ModelDescription, VariantFields};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModelDescriptionRow {
    pub level2: String,
    pub description: String,
    pub details: Value,
    pub updated_at: DateTime<Utc>,
}

impl From<ModelDescriptionRow> for ModelDescription {
    fn from(row: ModelDescriptionRow) -> Self {
        ModelDescription {
            level2: row.level2,
            description: row.description,
            details: row.details,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantFieldsRow {
    pub level0: String,
    pub fields: Value,
    pub updated_at: DateTime<Utc>,
}

impl From<VariantFieldsRow> for VariantFields {
    fn from(row: VariantFieldsRow) -> Self {
        let fields = row
            .fields
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        VariantFields {
            level0: row.level0,
            fields,
        }
    }
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_model_description(
    pool: &PgPool,
    level2: &str,
) -> Result<Option<ModelDescriptionRow>, DbError> {
    let row = sqlx::query_as::<_, ModelDescriptionRow>(
        "SELECT level2, description, details, updated_at \
         FROM model_descriptions WHERE level2 = $1",
    )
    .bind(level2)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Inserts or replaces the description for one model.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_model_description(
    pool: &PgPool,
    description: &ModelDescription,
) -> Result<ModelDescriptionRow, DbError> {
    let row = sqlx::query_as::<_, ModelDescriptionRow>(
        "INSERT INTO model_descriptions (level2, description, details) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (level2) DO UPDATE SET \
             description = EXCLUDED.description, \
             details     = EXCLUDED.details, \
             updated_at  = NOW() \
         RETURNING level2, description, details, updated_at",
    )
    .bind(&description.level2)
    .bind(&description.description)
    .bind(&description.details)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_variant_fields(
    pool: &PgPool,
    level0: &str,
) -> Result<Option<VariantFieldsRow>, DbError> {
    let row = sqlx::query_as::<_, VariantFieldsRow>(
        "SELECT level0, fields, updated_at FROM variant_fields WHERE level0 = $1",
    )
    .bind(level0)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Inserts or replaces the variant field list for one top-level category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_variant_fields<'e, E>(
    executor: E,
    fields: &VariantFields,
) -> Result<(), DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO variant_fields (level0, fields) VALUES ($1, $2) \
         ON CONFLICT (level0) DO UPDATE SET \
             fields     = EXCLUDED.fields, \
             updated_at = NOW()",
    )
    .bind(&fields.level0)
    .bind(Value::from(fields.fields.clone()))
    .execute(executor)
    .await?;
    Ok(())
}
