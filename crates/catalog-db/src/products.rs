//! Database operations for `products`.

use catalog_core::{Attributes, NewProduct, Product, ProductPatch};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::DbError;

const PRODUCT_COLUMNS: &str = "id, sku, name, brand, level0, level1, level2, attributes, \
                               images, image_url, stock, is_available, created_at, updated_at";

/// A row from the `products` table.
///
/// `attributes` and `images` are raw JSONB; conversion into [`Product`]
/// degrades malformed values instead of failing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub level0: String,
    pub level1: Option<String>,
    pub level2: Option<String>,
    pub attributes: Value,
    pub images: Value,
    pub image_url: Option<String>,
    pub stock: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
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

        Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            brand: row.brand,
            level0: row.level0,
            level1: row.level1,
            level2: row.level2,
            attributes: Attributes::from_value(&row.attributes),
            images,
            image_url: row.image_url,
            stock: row.stock,
            is_available: row.is_available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Optional equality filters for list views. `None` matches everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFilter<'a> {
    pub brand: Option<&'a str>,
    pub level0: Option<&'a str>,
    pub level1: Option<&'a str>,
    pub level2: Option<&'a str>,
}

// Shared by list and count so both see the same groups.
const FILTERED_GROUPS: &str = "SELECT MIN(id) AS id FROM products \
     WHERE ($1::TEXT IS NULL OR brand = $1) \
       AND ($2::TEXT IS NULL OR level0 = $2) \
       AND ($3::TEXT IS NULL OR level1 = $3) \
       AND ($4::TEXT IS NULL OR level2 = $4) \
     GROUP BY level2, brand";

/// Inserts a product through the pool or an open transaction.
///
/// # Errors
///
/// Returns [`DbError::DuplicateSku`] if the SKU is taken, or
/// [`DbError::Sqlx`] for any other failure.
pub async fn create_product<'e>(
    executor: impl PgExecutor<'e>,
    product: &NewProduct,
) -> Result<ProductRow, DbError> {
    let sql = format!(
        "INSERT INTO products \
             (sku, name, brand, level0, level1, level2, attributes, images, image_url, \
              stock, is_available) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {PRODUCT_COLUMNS}"
    );

    sqlx::query_as::<_, ProductRow>(&sql)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.level0)
        .bind(&product.level1)
        .bind(&product.level2)
        .bind(product.attributes.to_value())
        .bind(Value::from(product.images.clone()))
        .bind(&product.image_url)
        .bind(product.stock)
        .bind(product.is_available)
        .fetch_one(executor)
        .await
        .map_err(|e| DbError::unique_or(e, || DbError::DuplicateSku(product.sku.clone())))
}

/// Returns the product with `sku`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_sku(pool: &PgPool, sku: &str) -> Result<Option<ProductRow>, DbError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1");
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(sku)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Returns every product whose SKU is in `skus`, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_skus(
    pool: &PgPool,
    skus: &[String],
) -> Result<Vec<ProductRow>, DbError> {
    if skus.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ANY($1) ORDER BY id");
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(skus)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Applies a partial update in a single `UPDATE … RETURNING`.
///
/// Required columns use `COALESCE`; nullable columns use a "was supplied"
/// flag so that an explicit clear can be told apart from "keep current".
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `sku`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_product(
    pool: &PgPool,
    sku: &str,
    patch: &ProductPatch,
) -> Result<ProductRow, DbError> {
    let level1_supplied = patch.level1.is_some();
    let level1_val = patch.level1.clone().flatten();
    let level2_supplied = patch.level2.is_some();
    let level2_val = patch.level2.clone().flatten();
    let image_url_supplied = patch.image_url.is_some();
    let image_url_val = patch.image_url.clone().flatten();

    let sql = format!(
        "UPDATE products \
         SET name         = COALESCE($2, name), \
             brand        = COALESCE($3, brand), \
             level0       = COALESCE($4, level0), \
             level1       = CASE WHEN $5::BOOL THEN $6 ELSE level1 END, \
             level2       = CASE WHEN $7::BOOL THEN $8 ELSE level2 END, \
             attributes   = COALESCE($9, attributes), \
             images       = COALESCE($10, images), \
             image_url    = CASE WHEN $11::BOOL THEN $12 ELSE image_url END, \
             stock        = COALESCE($13, stock), \
             is_available = COALESCE($14, is_available), \
             updated_at   = NOW() \
         WHERE sku = $1 \
         RETURNING {PRODUCT_COLUMNS}"
    );

    sqlx::query_as::<_, ProductRow>(&sql)
        .bind(sku)
        .bind(&patch.name)
        .bind(&patch.brand)
        .bind(&patch.level0)
        .bind(level1_supplied)
        .bind(level1_val)
        .bind(level2_supplied)
        .bind(level2_val)
        .bind(patch.attributes.as_ref().map(Attributes::to_value))
        .bind(patch.images.clone().map(Value::from))
        .bind(image_url_supplied)
        .bind(image_url_val)
        .bind(patch.stock)
        .bind(patch.is_available)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Deletes the product with `sku` on the caller's connection.
///
/// Takes a connection rather than the pool so the caller can pair it with
/// other work inside one transaction. Image sets are never touched.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `sku`.
pub async fn delete_product(conn: &mut PgConnection, sku: &str) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM products WHERE sku = $1")
        .bind(sku)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// One representative per `(level2, brand)` group among matching products.
///
/// The representative is the matching member with the smallest id. Results
/// are ordered by `level2` then id; `offset`/`limit` apply after grouping.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_representatives(
    pool: &PgPool,
    filter: ProductFilter<'_>,
    offset: i64,
    limit: i64,
) -> Result<Vec<ProductRow>, DbError> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE id IN ({FILTERED_GROUPS}) \
         ORDER BY level2 ASC NULLS LAST, id ASC \
         OFFSET $5 LIMIT $6"
    );

    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(filter.brand)
        .bind(filter.level0)
        .bind(filter.level1)
        .bind(filter.level2)
        .bind(offset.max(0))
        .bind(limit.max(0))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Number of `(level2, brand)` groups matching `filter`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_representatives(
    pool: &PgPool,
    filter: ProductFilter<'_>,
) -> Result<i64, DbError> {
    let sql = format!("SELECT COUNT(*) FROM ({FILTERED_GROUPS}) AS groups");
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(filter.brand)
        .bind(filter.level0)
        .bind(filter.level1)
        .bind(filter.level2)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Case-insensitive substring search over name, brand and `level2`,
/// reduced to one representative per `(level2, brand)` group.
///
/// Ordered by name descending; list views order by `level2` ascending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_representatives(
    pool: &PgPool,
    query: &str,
    limit: i64,
) -> Result<Vec<ProductRow>, DbError> {
    let pattern = format!("%{}%", escape_like(query.trim()));
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE id IN ( \
             SELECT MIN(id) FROM products \
             WHERE name ILIKE $1 OR brand ILIKE $1 OR level2 ILIKE $1 \
             GROUP BY level2, brand) \
         ORDER BY name DESC, id ASC \
         LIMIT $2"
    );

    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(pattern)
        .bind(limit.max(0))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Every product labelled with `level2`, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_level2(
    pool: &PgPool,
    level2: &str,
) -> Result<Vec<ProductRow>, DbError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE level2 = $1 ORDER BY id");
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(level2)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Every product, ordered by id. Used by exports.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
