use catalog_core::{CategorySeed, VariantFields};
use sqlx::PgPool;

use crate::descriptions::upsert_variant_fields;
use crate::DbError;

/// Upsert categories from the seed file, including variant field settings.
///
/// Returns the number of categories processed. All upserts run inside a
/// single transaction; if any operation fails the whole batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_categories(pool: &PgPool, categories: &[CategorySeed]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for seed in categories {
        sqlx::query(
            "INSERT INTO categories (level0, level1, level2, description, icon) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (level0, COALESCE(level1, ''), COALESCE(level2, '')) DO UPDATE SET \
                 description = COALESCE(EXCLUDED.description, categories.description), \
                 icon        = COALESCE(EXCLUDED.icon, categories.icon), \
                 updated_at  = NOW()",
        )
        .bind(&seed.path.level0)
        .bind(&seed.path.level1)
        .bind(&seed.path.level2)
        .bind(&seed.description)
        .bind(&seed.icon)
        .execute(&mut *tx)
        .await?;

        if !seed.variant_fields.is_empty() {
            upsert_variant_fields(
                &mut *tx,
                &VariantFields {
                    level0: seed.path.level0.clone(),
                    fields: seed.variant_fields.clone(),
                },
            )
            .await?;
        }

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
