use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use catalog_core::{PriceBackend, PriceFact, PriceQuote, PriceUpdate};
use tokio::sync::RwLock;

use crate::json_file::JsonFile;
use crate::redb_table::RedbPrices;
use crate::PriceStoreError;

/// SKU → fact, ordered so the file diffs cleanly between writes.
pub type PriceMap = BTreeMap<String, PriceFact>;

#[derive(Debug)]
enum Backend {
    JsonFile(JsonFile),
    Redb(RedbPrices),
}

impl Backend {
    fn path(&self) -> &Path {
        match self {
            Self::JsonFile(file) => file.path(),
            Self::Redb(db) => db.path(),
        }
    }

    async fn load(&self) -> Result<PriceMap, PriceStoreError> {
        match self {
            Self::JsonFile(file) => file.load().await,
            Self::Redb(db) => db.load(),
        }
    }

    async fn persist(&self, before: &PriceMap, after: &PriceMap) -> Result<(), PriceStoreError> {
        match self {
            Self::JsonFile(file) => file.persist(after).await,
            Self::Redb(db) => db.apply(before, after),
        }
    }
}

/// SKU-keyed price facts behind a single-writer lock.
///
/// Every read loads the backend fresh, so edits made to the file between
/// requests are picked up. Writers hold the lock across load, mutate and
/// persist.
#[derive(Debug)]
pub struct PriceStore {
    backend: Backend,
    default_currency: String,
    lock: RwLock<()>,
}

impl PriceStore {
    /// A JSON-file store. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>, default_currency: &str) -> Self {
        Self::with_backend(
            Backend::JsonFile(JsonFile::new(path.into())),
            default_currency,
        )
    }

    /// A redb-backed store, created on first open.
    ///
    /// # Errors
    ///
    /// Returns [`PriceStoreError::Io`] or [`PriceStoreError::Database`] when
    /// the database cannot be opened.
    pub fn open_redb(
        path: impl Into<PathBuf>,
        default_currency: &str,
    ) -> Result<Self, PriceStoreError> {
        let db = RedbPrices::open(path.into())?;
        Ok(Self::with_backend(Backend::Redb(db), default_currency))
    }

    /// Opens the store for the configured backend.
    ///
    /// # Errors
    ///
    /// See [`PriceStore::open_redb`]. The JSON backend never fails to open.
    pub fn open(
        kind: PriceBackend,
        path: impl Into<PathBuf>,
        default_currency: &str,
    ) -> Result<Self, PriceStoreError> {
        match kind {
            PriceBackend::JsonFile => Ok(Self::new(path, default_currency)),
            PriceBackend::Redb => Self::open_redb(path, default_currency),
        }
    }

    fn with_backend(backend: Backend, default_currency: &str) -> Self {
        Self {
            backend,
            default_currency: default_currency.trim().to_uppercase(),
            lock: RwLock::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.backend.path()
    }

    #[must_use]
    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    /// # Errors
    ///
    /// Returns a load error when the backend cannot be read.
    pub async fn get(&self, sku: &str) -> Result<Option<PriceQuote>, PriceStoreError> {
        let _guard = self.lock.read().await;
        Ok(self.backend.load().await?.get(sku).map(PriceFact::quote))
    }

    /// # Errors
    ///
    /// Returns a load error when the backend cannot be read.
    pub async fn get_all(&self) -> Result<BTreeMap<String, PriceQuote>, PriceStoreError> {
        let _guard = self.lock.read().await;
        Ok(self
            .backend
            .load()
            .await?
            .iter()
            .map(|(sku, fact)| (sku.clone(), fact.quote()))
            .collect())
    }

    /// The stored facts without derived fields.
    ///
    /// # Errors
    ///
    /// Returns a load error when the backend cannot be read.
    pub async fn snapshot(&self) -> Result<PriceMap, PriceStoreError> {
        let _guard = self.lock.read().await;
        self.backend.load().await
    }

    /// SKUs flagged for feed sync, in key order.
    ///
    /// # Errors
    ///
    /// Returns a load error when the backend cannot be read.
    pub async fn list_tracked(&self) -> Result<Vec<String>, PriceStoreError> {
        let _guard = self.lock.read().await;
        Ok(self
            .backend
            .load()
            .await?
            .into_iter()
            .filter(|(_, fact)| fact.is_tracked)
            .map(|(sku, _)| sku)
            .collect())
    }

    /// Replaces the fact for `sku`. `old_price` defaults to `price` and a
    /// missing currency to the store default.
    ///
    /// # Errors
    ///
    /// [`PriceStoreError::Invalid`] for a rejected amount, otherwise a
    /// load or persist error.
    pub async fn set(
        &self,
        sku: &str,
        price: f64,
        old_price: Option<f64>,
        currency: Option<&str>,
        is_tracked: bool,
    ) -> Result<PriceQuote, PriceStoreError> {
        let currency = currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&self.default_currency);
        let fact = PriceFact::new(price, old_price, currency, is_tracked)
            .map_err(|e| invalid(sku, &e))?;
        let quote = fact.quote();
        self.try_modify(|prices| {
            prices.insert(sku.to_string(), fact);
            Ok(())
        })
        .await?;
        tracing::debug!(sku, price, "price set");
        Ok(quote)
    }

    /// Merges every update into the stored facts in one write. A single
    /// invalid entry rejects the whole batch.
    ///
    /// # Errors
    ///
    /// [`PriceStoreError::Invalid`] naming the first rejected SKU, otherwise
    /// a load or persist error.
    pub async fn bulk_set(
        &self,
        updates: &BTreeMap<String, PriceUpdate>,
    ) -> Result<usize, PriceStoreError> {
        let default_currency = self.default_currency.clone();
        self.try_modify(|prices| {
            for (sku, update) in updates {
                let fact = update
                    .resolve(prices.get(sku), &default_currency)
                    .map_err(|e| invalid(sku, &e))?;
                prices.insert(sku.clone(), fact);
            }
            Ok(updates.len())
        })
        .await
    }

    /// Returns `false` when nothing was stored for `sku`.
    ///
    /// # Errors
    ///
    /// Returns a load or persist error.
    pub async fn delete(&self, sku: &str) -> Result<bool, PriceStoreError> {
        self.try_modify(|prices| Ok(prices.remove(sku).is_some()))
            .await
    }

    /// Infallible variant of [`PriceStore::try_modify`].
    ///
    /// # Errors
    ///
    /// Returns a load or persist error.
    pub async fn modify<T>(
        &self,
        f: impl FnOnce(&mut PriceMap) -> T,
    ) -> Result<T, PriceStoreError> {
        self.try_modify(|prices| Ok(f(prices))).await
    }

    /// Runs `f` on a copy of the stored facts under the write lock and
    /// persists the copy if `f` succeeded and changed anything. On error the
    /// backend is left as it was.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, or a load or persist error.
    pub async fn try_modify<T>(
        &self,
        f: impl FnOnce(&mut PriceMap) -> Result<T, PriceStoreError>,
    ) -> Result<T, PriceStoreError> {
        let _guard = self.lock.write().await;
        let before = self.backend.load().await?;
        let mut after = before.clone();
        let out = f(&mut after)?;
        if after != before {
            self.backend.persist(&before, &after).await?;
        }
        Ok(out)
    }
}

fn invalid(sku: &str, e: &catalog_core::CoreError) -> PriceStoreError {
    PriceStoreError::Invalid {
        sku: sku.to_string(),
        reason: e.to_string(),
    }
}
