use std::collections::BTreeMap;

use catalog_core::{PriceQuote, PriceUpdate};
use catalog_prices::PriceMap;
use serde::{Deserialize, Serialize};

use crate::{Catalog, ServiceError};

/// Body of a single price write. Replaces the stored fact entirely.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetPrice {
    pub price: f64,
    #[serde(default)]
    pub old_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default = "tracked_by_default", alias = "is_parse")]
    pub is_tracked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceLoadReport {
    pub copied: usize,
    pub skipped: Vec<String>,
}

fn tracked_by_default() -> bool {
    true
}

impl Catalog {
    /// # Errors
    ///
    /// Returns a price store error.
    pub async fn get_price(&self, sku: &str) -> Result<Option<PriceQuote>, ServiceError> {
        Ok(self.prices.get(sku).await?)
    }

    /// # Errors
    ///
    /// Returns a price store error.
    pub async fn list_prices(&self) -> Result<BTreeMap<String, PriceQuote>, ServiceError> {
        Ok(self.prices.get_all().await?)
    }

    /// # Errors
    ///
    /// Returns a price store error.
    pub async fn list_tracked(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.prices.list_tracked().await?)
    }

    /// Stores a price for an existing product. No product row is touched.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown SKU,
    /// [`ServiceError::Validation`] for a rejected amount.
    pub async fn set_price(&self, sku: &str, body: SetPrice) -> Result<PriceQuote, ServiceError> {
        self.require_product(sku).await?;
        let quote = self
            .prices
            .set(
                sku,
                body.price,
                body.old_price,
                body.currency.as_deref(),
                body.is_tracked,
            )
            .await?;
        Ok(quote)
    }

    /// Applies many updates in one store write. Each SKU must name an
    /// existing product; otherwise nothing is written.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] listing unknown SKUs or a rejected amount.
    pub async fn bulk_set_prices(
        &self,
        updates: &BTreeMap<String, PriceUpdate>,
    ) -> Result<usize, ServiceError> {
        let unknown = self.unknown_skus(updates.keys().cloned().collect()).await?;
        if !unknown.is_empty() {
            return Err(ServiceError::Validation(format!(
                "unknown skus: {}",
                unknown.join(", ")
            )));
        }
        let count = self.prices.bulk_set(updates).await?;
        tracing::info!(count, "prices updated");
        Ok(count)
    }

    /// # Errors
    ///
    /// [`ServiceError::NotFound`] when the SKU has no stored price.
    pub async fn delete_price(&self, sku: &str) -> Result<(), ServiceError> {
        if self.prices.delete(sku).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("price for '{sku}'")))
        }
    }

    /// Copies stored facts from another price source, such as a JSON file
    /// being moved into the redb backend. Facts for SKUs with no product
    /// are skipped and returned in [`PriceLoadReport::skipped`].
    ///
    /// # Errors
    ///
    /// Returns a database or price store error.
    pub async fn load_price_facts(&self, facts: PriceMap) -> Result<PriceLoadReport, ServiceError> {
        let skipped = self.unknown_skus(facts.keys().cloned().collect()).await?;
        let known: PriceMap = facts
            .into_iter()
            .filter(|(sku, _)| !skipped.contains(sku))
            .collect();
        let copied = known.len();
        if copied > 0 {
            self.prices.modify(|prices| prices.extend(known)).await?;
        }
        if !skipped.is_empty() {
            tracing::warn!(skipped = skipped.len(), "price facts without a product were not loaded");
        }
        tracing::info!(copied, "price facts loaded");
        Ok(PriceLoadReport { copied, skipped })
    }

    async fn require_product(&self, sku: &str) -> Result<(), ServiceError> {
        catalog_db::get_product_by_sku(&self.pool, sku)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::product_not_found(sku))
    }

    /// SKUs from `skus` with no product row, in input order.
    pub(crate) async fn unknown_skus(&self, skus: Vec<String>) -> Result<Vec<String>, ServiceError> {
        if skus.is_empty() {
            return Ok(Vec::new());
        }
        let known: std::collections::HashSet<String> =
            catalog_db::list_products_by_skus(&self.pool, &skus)
                .await?
                .into_iter()
                .map(|row| row.sku)
                .collect();
        Ok(skus.into_iter().filter(|sku| !known.contains(sku)).collect())
    }
}
