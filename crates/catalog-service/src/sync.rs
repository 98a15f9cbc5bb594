use catalog_feed::{plan_feed_updates, PriceFeedClient, SyncReport};
use catalog_prices::PriceStoreError;

use crate::{Catalog, ServiceError};

impl Catalog {
    /// Pulls current prices for every tracked SKU from the feed.
    ///
    /// The feed is queried before the store is locked; any feed failure
    /// returns early with the stored prices untouched. The plan is then
    /// recomputed against the store contents under its write lock so a
    /// concurrent edit is not overwritten with a stale `old_price`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Feed`] for any feed failure, or a price store error.
    pub async fn sync_prices(
        &self,
        client: &PriceFeedClient,
        dry_run: bool,
    ) -> Result<SyncReport, ServiceError> {
        let tracked = self.prices.list_tracked().await?;
        let feed = match client.fetch_prices(&tracked).await {
            Ok(feed) => feed,
            Err(e) => {
                tracing::error!(error = %e, tracked = tracked.len(), "price feed sync failed");
                return Err(e.into());
            }
        };

        if dry_run {
            let snapshot = self.prices.snapshot().await?;
            let mut report = plan_feed_updates(&snapshot, &tracked, &feed).report;
            report.dry_run = true;
            return Ok(report);
        }

        let default_currency = self.prices.default_currency().to_string();
        let report = self
            .prices
            .try_modify(|prices| {
                let plan = plan_feed_updates(prices, &tracked, &feed);
                for (sku, update) in &plan.updates {
                    let fact = update
                        .resolve(prices.get(sku), &default_currency)
                        .map_err(|e| PriceStoreError::Invalid {
                            sku: sku.clone(),
                            reason: e.to_string(),
                        })?;
                    prices.insert(sku.clone(), fact);
                }
                Ok(plan.report)
            })
            .await?;

        tracing::info!(
            requested = report.requested,
            updated = report.updated,
            unchanged = report.unchanged,
            not_found = report.not_found.len(),
            errors = report.errors.len(),
            "price feed sync finished"
        );
        Ok(report)
    }
}
