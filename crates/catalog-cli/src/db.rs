use std::path::Path;

use anyhow::Context;

pub(crate) async fn run_db_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    catalog_db::ping(pool).await.context("database ping failed")?;
    println!("database ok");
    Ok(())
}

pub(crate) async fn run_db_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = catalog_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Upserts every category in `path`, along with per-level0 variant fields.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or if any upsert
/// fails (in which case nothing is written).
pub(crate) async fn run_db_seed(pool: &sqlx::PgPool, path: &Path) -> anyhow::Result<()> {
    let file = catalog_core::load_categories(path)?;
    let count = catalog_db::seed_categories(pool, &file.categories).await?;
    tracing::info!(count, path = %path.display(), "seeded categories");
    println!("seeded {count} categories from {}", path.display());
    Ok(())
}
