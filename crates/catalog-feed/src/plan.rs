use std::collections::BTreeMap;

use catalog_core::PriceUpdate;
use catalog_prices::PriceMap;
use serde::Serialize;

use crate::FeedItem;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChange {
    pub sku: String,
    pub old_price: f64,
    pub new_price: f64,
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub requested: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Tracked SKUs the feed did not return.
    pub not_found: Vec<String>,
    /// Tracked SKUs the feed returned without a usable price.
    pub errors: Vec<String>,
    pub changes: Vec<PriceChange>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPlan {
    pub updates: BTreeMap<String, PriceUpdate>,
    pub report: SyncReport,
}

/// Compares a feed response against the stored facts for `tracked`.
///
/// A changed price becomes the new `price` and the stored price becomes
/// `old_price`; currency and the tracked flag carry over. SKUs without a
/// stored fact are skipped, as are feed entries nobody asked for.
#[must_use]
pub fn plan_feed_updates(
    existing: &PriceMap,
    tracked: &[String],
    feed: &BTreeMap<String, FeedItem>,
) -> FeedPlan {
    let mut plan = FeedPlan::default();
    plan.report.requested = tracked.len();

    for sku in tracked {
        let Some(current) = existing.get(sku) else {
            continue;
        };
        let Some(item) = feed.get(sku) else {
            plan.report.not_found.push(sku.clone());
            continue;
        };
        let Some(new_price) = item.price else {
            tracing::warn!(sku = %sku, "price feed returned no usable price");
            plan.report.errors.push(sku.clone());
            continue;
        };

        if (new_price - current.price).abs() < f64::EPSILON {
            plan.report.unchanged += 1;
            continue;
        }

        plan.report.changes.push(PriceChange {
            sku: sku.clone(),
            old_price: current.price,
            new_price,
        });
        plan.updates.insert(
            sku.clone(),
            PriceUpdate {
                price: new_price,
                old_price: Some(current.price),
                currency: Some(current.currency.clone()),
                is_tracked: Some(current.is_tracked),
            },
        );
    }

    plan.report.updated = plan.updates.len();
    plan
}
