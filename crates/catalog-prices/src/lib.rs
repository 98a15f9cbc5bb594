//! Durable SKU → price store.
//!
//! Two backends share one contract. The JSON backend keeps every price in
//! one object keyed by SKU and rewrites the whole file through a temp file
//! and an atomic rename, so readers never see a partial document. The redb
//! backend stores one row per SKU and commits each change in a single
//! transaction. Within the process, a read/write lock gives a single writer
//! and many readers either way.

mod error;
mod json_file;
mod redb_table;
mod store;

pub use error::PriceStoreError;
pub use json_file::read_price_file;
pub use store::{PriceMap, PriceStore};
