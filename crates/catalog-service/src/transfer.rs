use std::collections::BTreeMap;

use catalog_core::{PriceUpdate, Product};
use catalog_db::DbError;
use catalog_sheets::{ExportedProduct, RowError, SheetFormat};
use serde::Serialize;
use sqlx::Acquire;

use crate::{Catalog, ServiceError};

/// Result of a spreadsheet import. Failed rows do not stop the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    /// Products created.
    pub added: usize,
    /// Price facts written.
    pub prices_set: usize,
    pub errors: Vec<RowError>,
}

impl Catalog {
    /// Creates one product per valid row and stores the prices given
    /// alongside them.
    ///
    /// Rows with missing fields or a taken SKU are reported in
    /// [`ImportReport::errors`] and skipped. The inserts share one
    /// transaction that commits only after the prices are written, so a
    /// failure leaves neither products nor prices behind.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Sheet`] if the file is unreadable or lacks a
    /// required column; a database or price store failure aborts the whole
    /// batch.
    pub async fn import_products(&self, bytes: &[u8]) -> Result<ImportReport, ServiceError> {
        let sheet = catalog_sheets::parse_products(bytes)?;
        let mut report = ImportReport {
            errors: sheet.errors,
            ..ImportReport::default()
        };
        let mut prices: BTreeMap<String, PriceUpdate> = BTreeMap::new();

        let mut tx = self.pool.begin().await?;
        for row in sheet.rows {
            let sku = row.product.sku.clone();
            // A failed insert poisons the enclosing transaction, so each row
            // gets its own savepoint.
            let mut savepoint = Acquire::begin(&mut *tx).await?;
            match catalog_db::create_product(&mut *savepoint, &row.product).await {
                Ok(_) => {
                    savepoint.commit().await?;
                    report.added += 1;
                    if let Some(price) = row.price {
                        prices.insert(sku, price);
                    }
                }
                Err(DbError::DuplicateSku(_)) => {
                    savepoint.rollback().await?;
                    report.errors.push(RowError {
                        row: row.row,
                        message: format!("a product with sku '{sku}' already exists"),
                        sku: Some(sku),
                    });
                }
                Err(e) => {
                    tracing::error!(row = row.row, sku = %sku, error = %e, "product import aborted");
                    return Err(e.into());
                }
            }
        }

        if !prices.is_empty() {
            report.prices_set = match self.prices.bulk_set(&prices).await {
                Ok(count) => count,
                Err(e) => {
                    tracing::error!(error = %e, "import prices not stored; rolling back products");
                    return Err(e.into());
                }
            };
        }
        if let Err(e) = tx.commit().await {
            tracing::error!(
                prices = report.prices_set,
                error = %e,
                "product import commit failed after prices were stored"
            );
            return Err(e.into());
        }

        report.errors.sort_by_key(|e| e.row);
        for error in &report.errors {
            tracing::warn!(row = error.row, message = %error.message, "product row rejected");
        }
        tracing::info!(
            added = report.added,
            prices = report.prices_set,
            failed = report.errors.len(),
            "product import finished"
        );
        Ok(report)
    }

    /// Stores every valid price row in one write. Rows naming an unknown
    /// SKU are reported and skipped.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Sheet`] if the file is unreadable or lacks a
    /// required column, or a database or price store error.
    pub async fn import_prices(&self, bytes: &[u8]) -> Result<ImportReport, ServiceError> {
        let sheet = catalog_sheets::parse_prices(bytes)?;
        let mut report = ImportReport {
            errors: sheet.errors,
            ..ImportReport::default()
        };

        let unknown = self
            .unknown_skus(sheet.rows.iter().map(|r| r.sku.clone()).collect())
            .await?;
        let mut updates: BTreeMap<String, PriceUpdate> = BTreeMap::new();
        for row in sheet.rows {
            if unknown.contains(&row.sku) {
                report.errors.push(RowError {
                    row: row.row,
                    message: format!("no product with sku '{}'", row.sku),
                    sku: Some(row.sku),
                });
            } else {
                // A later row for the same SKU wins.
                updates.insert(row.sku, row.update);
            }
        }

        if !updates.is_empty() {
            report.prices_set = self.prices.bulk_set(&updates).await?;
        }
        report.errors.sort_by_key(|e| e.row);
        tracing::info!(
            prices = report.prices_set,
            failed = report.errors.len(),
            "price import finished"
        );
        Ok(report)
    }

    /// # Errors
    ///
    /// Returns a database, price store or encoding error.
    pub async fn export_products(&self, format: SheetFormat) -> Result<Vec<u8>, ServiceError> {
        let products: Vec<Product> = catalog_db::list_all_products(&self.pool)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let prices = self.prices.get_all().await?;
        let items: Vec<ExportedProduct<'_>> = products
            .iter()
            .map(|product| ExportedProduct {
                product,
                price: prices.get(&product.sku),
            })
            .collect();
        Ok(catalog_sheets::product_export(&items, format)?)
    }

    /// # Errors
    ///
    /// Returns a price store or encoding error.
    pub async fn export_prices(&self, format: SheetFormat) -> Result<Vec<u8>, ServiceError> {
        let prices = self.prices.get_all().await?;
        Ok(catalog_sheets::price_export(&prices, format)?)
    }
}
