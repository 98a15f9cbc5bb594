//! Catalog operations that span the relational store and the price store.
//!
//! [`Catalog`] owns both handles. Product rows and price facts are written
//! independently; the only coupled operations are product deletion (which
//! removes the price) and writes that must name an existing SKU.

mod categories;
mod error;
mod models;
mod prices;
mod products;
mod sync;
mod transfer;

use std::sync::Arc;

use catalog_prices::PriceStore;
use sqlx::PgPool;

pub use categories::RenameReport;
pub use error::ServiceError;
pub use models::ModelView;
pub use prices::{PriceLoadReport, SetPrice};
pub use products::{Page, ProductCard, ProductDetail};
pub use transfer::ImportReport;

/// Attribute keys shown for variants when a category configures none.
pub const DEFAULT_VARIANT_FIELDS: [&str; 3] = ["color", "disk", "sim_config"];

#[derive(Clone)]
pub struct Catalog {
    pool: PgPool,
    prices: Arc<PriceStore>,
}

impl Catalog {
    #[must_use]
    pub fn new(pool: PgPool, prices: Arc<PriceStore>) -> Self {
        Self { pool, prices }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn prices(&self) -> &PriceStore {
        &self.prices
    }
}
