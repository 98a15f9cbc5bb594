use catalog_core::CoreError;
use catalog_db::DbError;
use catalog_feed::FeedError;
use catalog_prices::PriceStoreError;
use catalog_sheets::SheetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("a product with sku '{0}' already exists")]
    DuplicateSku(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("database error: {0}")]
    Db(#[source] DbError),

    #[error("price store error: {0}")]
    Prices(#[source] PriceStoreError),

    #[error("spreadsheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error("price feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("price feed is not configured")]
    FeedNotConfigured,
}

impl ServiceError {
    pub(crate) fn product_not_found(sku: &str) -> Self {
        Self::NotFound(format!("product '{sku}'"))
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => Self::NotFound("record".to_string()),
            DbError::DuplicateSku(sku) => Self::DuplicateSku(sku),
            DbError::Conflict(what) => Self::Conflict(what),
            other => Self::Db(other),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        Self::Db(DbError::Sqlx(e))
    }
}

impl From<PriceStoreError> for ServiceError {
    fn from(e: PriceStoreError) -> Self {
        match e {
            PriceStoreError::Invalid { sku, reason } => {
                Self::Validation(format!("invalid price for '{sku}': {reason}"))
            }
            other => Self::Prices(other),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => Self::Validation(msg),
        }
    }
}
