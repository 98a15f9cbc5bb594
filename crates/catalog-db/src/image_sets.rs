//! Database operations for `image_sets`.

use catalog_core::{normalize_color, ImageSet};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageSetRow {
    pub id: i64,
    pub level2: String,
    pub color: String,
    pub color_key: String,
    pub images: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ImageSetRow> for ImageSet {
    fn from(row: ImageSetRow) -> Self {
        let images = row
            .images
            .as_array()
            .map(|urls| {
                urls.iter()
                    .filter_map(Value::as_str)
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        ImageSet {
            level2: row.level2,
            color: row.color,
            images,
        }
    }
}

/// Inserts or replaces the image set for `(level2, color)`.
///
/// Colors are matched on their normalized key, so `"Space Gray"` replaces
/// an existing `"space-gray"` entry. The display label is updated too.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_image_set(pool: &PgPool, set: &ImageSet) -> Result<ImageSetRow, DbError> {
    let row = sqlx::query_as::<_, ImageSetRow>(
        "INSERT INTO image_sets (level2, color, color_key, images) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (level2, color_key) DO UPDATE SET \
             color      = EXCLUDED.color, \
             images     = EXCLUDED.images, \
             updated_at = NOW() \
         RETURNING id, level2, color, color_key, images, created_at, updated_at",
    )
    .bind(&set.level2)
    .bind(set.color.trim())
    .bind(set.color_key())
    .bind(Value::from(set.images.clone()))
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Looks up the image set for a model and color, matching color loosely.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_image_set(
    pool: &PgPool,
    level2: &str,
    color: &str,
) -> Result<Option<ImageSetRow>, DbError> {
    let row = sqlx::query_as::<_, ImageSetRow>(
        "SELECT id, level2, color, color_key, images, created_at, updated_at \
         FROM image_sets WHERE level2 = $1 AND color_key = $2",
    )
    .bind(level2)
    .bind(normalize_color(color))
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Lists image sets, optionally restricted to one model.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_image_sets(
    pool: &PgPool,
    level2: Option<&str>,
) -> Result<Vec<ImageSetRow>, DbError> {
    let rows = sqlx::query_as::<_, ImageSetRow>(
        "SELECT id, level2, color, color_key, images, created_at, updated_at \
         FROM image_sets \
         WHERE ($1::TEXT IS NULL OR level2 = $1) \
         ORDER BY level2, color_key",
    )
    .bind(level2)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetches every image set belonging to any of `level2s` in one query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_image_sets_for_models(
    pool: &PgPool,
    level2s: &[String],
) -> Result<Vec<ImageSetRow>, DbError> {
    if level2s.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, ImageSetRow>(
        "SELECT id, level2, color, color_key, images, created_at, updated_at \
         FROM image_sets WHERE level2 = ANY($1) \
         ORDER BY level2, color_key",
    )
    .bind(level2s)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
