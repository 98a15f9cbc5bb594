//! Database operations for `categories` and the level0 rename cascade.

use catalog_core::{CategoryPath, CategorySeed};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub level0: String,
    pub level1: Option<String>,
    pub level2: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryRow {
    #[must_use]
    pub fn path(&self) -> CategoryPath {
        CategoryPath::new(&self.level0, self.level1.as_deref(), self.level2.as_deref())
    }

    #[must_use]
    pub fn into_seed(self) -> CategorySeed {
        CategorySeed {
            path: self.path(),
            description: self.description,
            icon: self.icon,
            variant_fields: Vec::new(),
        }
    }
}

/// Product count for one distinct category path.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryCountRow {
    pub level0: String,
    pub level1: Option<String>,
    pub level2: Option<String>,
    pub product_count: i64,
}

/// Rows touched by a level0 rename.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenameReport {
    pub products: u64,
    pub categories: u64,
    pub variant_fields: u64,
}

/// Inserts a category node.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] if the same path already exists, or
/// [`DbError::Sqlx`] for any other failure.
pub async fn create_category(
    pool: &PgPool,
    path: &CategoryPath,
    description: Option<&str>,
    icon: Option<&str>,
) -> Result<CategoryRow, DbError> {
    sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO categories (level0, level1, level2, description, icon) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, level0, level1, level2, description, icon, created_at, updated_at",
    )
    .bind(&path.level0)
    .bind(&path.level1)
    .bind(&path.level2)
    .bind(description)
    .bind(icon)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        DbError::unique_or(e, || {
            DbError::Conflict(format!("category '{}'", path.breadcrumb()))
        })
    })
}

/// Lists all categories ordered by path.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, level0, level1, level2, description, icon, created_at, updated_at \
         FROM categories \
         ORDER BY level0, level1 NULLS FIRST, level2 NULLS FIRST",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Counts products per distinct category path.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_products_by_category(pool: &PgPool) -> Result<Vec<CategoryCountRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryCountRow>(
        "SELECT level0, level1, level2, COUNT(*) AS product_count \
         FROM products \
         GROUP BY level0, level1, level2 \
         ORDER BY level0, level1, level2",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Renames a top-level category across products, category nodes and
/// variant-field settings in one transaction.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if nothing carries `old_name`,
/// [`DbError::Conflict`] if the rename would collide with an existing
/// category, or [`DbError::Sqlx`] for any other failure. Nothing is
/// written on error.
pub async fn rename_level0(
    pool: &PgPool,
    old_name: &str,
    new_name: &str,
) -> Result<RenameReport, DbError> {
    let mut tx = pool.begin().await?;
    let conflict = || DbError::Conflict(format!("category '{new_name}'"));

    let products = sqlx::query(
        "UPDATE products SET level0 = $2, updated_at = NOW() WHERE level0 = $1",
    )
    .bind(old_name)
    .bind(new_name)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let categories = sqlx::query(
        "UPDATE categories SET level0 = $2, updated_at = NOW() WHERE level0 = $1",
    )
    .bind(old_name)
    .bind(new_name)
    .execute(&mut *tx)
    .await
    .map_err(|e| DbError::unique_or(e, conflict))?
    .rows_affected();

    let variant_fields = sqlx::query(
        "UPDATE variant_fields SET level0 = $2, updated_at = NOW() WHERE level0 = $1",
    )
    .bind(old_name)
    .bind(new_name)
    .execute(&mut *tx)
    .await
    .map_err(|e| DbError::unique_or(e, conflict))?
    .rows_affected();

    if products == 0 && categories == 0 && variant_fields == 0 {
        return Err(DbError::NotFound);
    }

    tx.commit().await?;

    tracing::info!(
        old_name,
        new_name,
        products,
        categories,
        variant_fields,
        "renamed top-level category"
    );

    Ok(RenameReport {
        products,
        categories,
        variant_fields,
    })
}
