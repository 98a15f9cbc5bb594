//! redb-backed price table: key = SKU, value = the fact as JSON.

use std::path::{Path, PathBuf};

use catalog_core::PriceFact;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::{PriceMap, PriceStoreError};

const PRICES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("prices");

pub(crate) struct RedbPrices {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbPrices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbPrices")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbPrices {
    /// Opens or creates the database and makes sure the table exists.
    pub(crate) fn open(path: PathBuf) -> Result<Self, PriceStoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PriceStoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }
        let db = Database::create(&path).map_err(|e| database_error(&path, e))?;
        let store = Self { db, path };
        store.init()?;
        Ok(store)
    }

    #[cfg(test)]
    pub(crate) fn in_memory() -> Result<Self, PriceStoreError> {
        let path = PathBuf::from(":memory:");
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(|e| database_error(&path, e))?;
        let store = Self { db, path };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<(), PriceStoreError> {
        let txn = self.db.begin_write().map_err(|e| self.error(e))?;
        {
            let _ = txn.open_table(PRICES_TABLE).map_err(|e| self.error(e))?;
        }
        txn.commit().map_err(|e| self.error(e))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn load(&self) -> Result<PriceMap, PriceStoreError> {
        let txn = self.db.begin_read().map_err(|e| self.error(e))?;
        let table = txn.open_table(PRICES_TABLE).map_err(|e| self.error(e))?;

        let mut prices = PriceMap::new();
        for entry in table.iter().map_err(|e| self.error(e))? {
            let (key, value) = entry.map_err(|e| self.error(e))?;
            let sku = key.value().to_string();
            let fact: PriceFact = serde_json::from_slice(value.value()).map_err(|e| {
                tracing::error!(path = %self.path.display(), sku = %sku, error = %e, "stored price is corrupt");
                PriceStoreError::Corrupt {
                    path: format!("{}#{sku}", self.path.display()),
                    source: e,
                }
            })?;
            prices.insert(sku, fact);
        }
        Ok(prices)
    }

    /// Writes only the rows that differ between `before` and `after`, in one
    /// transaction. Nothing is visible to readers until commit.
    pub(crate) fn apply(&self, before: &PriceMap, after: &PriceMap) -> Result<(), PriceStoreError> {
        let txn = self.db.begin_write().map_err(|e| self.error(e))?;
        {
            let mut table = txn.open_table(PRICES_TABLE).map_err(|e| self.error(e))?;
            for sku in before.keys().filter(|sku| !after.contains_key(*sku)) {
                table.remove(sku.as_str()).map_err(|e| self.error(e))?;
            }
            for (sku, fact) in after {
                if before.get(sku) == Some(fact) {
                    continue;
                }
                let body = serde_json::to_vec(fact).map_err(PriceStoreError::Encode)?;
                table
                    .insert(sku.as_str(), body.as_slice())
                    .map_err(|e| self.error(e))?;
            }
        }
        txn.commit().map_err(|e| self.error(e))
    }

    fn error(&self, e: impl Into<redb::Error>) -> PriceStoreError {
        database_error(&self.path, e)
    }
}

fn database_error(path: &Path, e: impl Into<redb::Error>) -> PriceStoreError {
    let source = e.into();
    tracing::error!(path = %path.display(), error = %source, "price database operation failed");
    PriceStoreError::Database {
        path: path.display().to_string(),
        source: Box::new(source),
    }
}
