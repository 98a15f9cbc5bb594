use std::collections::{BTreeMap, BTreeSet};

use catalog_core::{
    resolve_images, ImageIndex, ImageSet, ModelDescription, NewProduct, PriceQuote, Product,
    ProductPatch, ResolvedImages,
};
use catalog_db::ProductFilter;
use serde::Serialize;

use crate::{Catalog, ServiceError};

/// A product as shown in list, search and variant views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCard {
    #[serde(flatten)]
    pub product: Product,
    pub category_name: String,
    pub price: Option<PriceQuote>,
    pub images: ResolvedImages,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub card: ProductCard,
    pub breadcrumb: String,
    pub description: Option<ModelDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

impl Catalog {
    /// # Errors
    ///
    /// [`ServiceError::Validation`] when name, brand, level0 or sku is
    /// missing; [`ServiceError::DuplicateSku`] when the SKU is taken.
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, ServiceError> {
        let product = product.normalized()?;
        let row = catalog_db::create_product(&self.pool, &product).await?;
        tracing::info!(sku = %row.sku, id = row.id, "product created");
        Ok(row.into())
    }

    /// Applies a partial update. Fields absent from `patch` keep their value.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown SKU, or
    /// [`ServiceError::Validation`] for an invalid patch.
    pub async fn update_product(
        &self,
        sku: &str,
        patch: ProductPatch,
    ) -> Result<Product, ServiceError> {
        let patch = patch.normalized(sku)?;
        match catalog_db::update_product(&self.pool, sku, &patch).await {
            Ok(row) => Ok(row.into()),
            Err(catalog_db::DbError::NotFound) => Err(ServiceError::product_not_found(sku)),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the product row and its price fact. Image sets are shared
    /// per model and color, so they stay.
    ///
    /// The row is removed inside a transaction that only commits once the
    /// price fact is gone. A commit failure after that point is logged with
    /// the SKU, since the price cannot be restored.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown SKU; a price store failure
    /// rolls the row deletion back.
    pub async fn delete_product(&self, sku: &str) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;
        match catalog_db::delete_product(&mut *tx, sku).await {
            Ok(()) => {}
            Err(catalog_db::DbError::NotFound) => return Err(ServiceError::product_not_found(sku)),
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self.prices.delete(sku).await {
            tracing::error!(sku, error = %e, "price delete failed; keeping product");
            return Err(e.into());
        }
        if let Err(e) = tx.commit().await {
            tracing::error!(sku, error = %e, "product delete commit failed after its price was removed");
            return Err(e.into());
        }

        tracing::info!(sku, "product deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown SKU.
    pub async fn get_product(&self, sku: &str) -> Result<ProductDetail, ServiceError> {
        let product: Product = catalog_db::get_product_by_sku(&self.pool, sku)
            .await?
            .ok_or_else(|| ServiceError::product_not_found(sku))?
            .into();

        let description = match product.level2.as_deref() {
            Some(level2) => catalog_db::get_model_description(&self.pool, level2)
                .await?
                .map(Into::into),
            None => None,
        };
        let breadcrumb = product.category().breadcrumb();
        let card = self
            .cards(vec![product])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::product_not_found(sku))?;

        Ok(ProductDetail {
            card,
            breadcrumb,
            description,
        })
    }

    /// One representative per `(level2, brand)` among products matching
    /// `filter`. `offset` and `limit` count groups, not products.
    ///
    /// # Errors
    ///
    /// Returns a database or price store error.
    pub async fn list_products(
        &self,
        filter: ProductFilter<'_>,
        offset: i64,
        limit: i64,
    ) -> Result<Page<ProductCard>, ServiceError> {
        let rows = catalog_db::list_representatives(&self.pool, filter, offset, limit).await?;
        let total = catalog_db::count_representatives(&self.pool, filter).await?;
        let items = self.cards(rows.into_iter().map(Into::into).collect()).await?;
        Ok(Page {
            items,
            total,
            offset,
            limit,
        })
    }

    /// Case-insensitive substring search over name, brand and level2,
    /// reduced to one product per model. Results are ordered by name,
    /// descending.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for a blank query.
    pub async fn search_products(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<ProductCard>, ServiceError> {
        if query.trim().is_empty() {
            return Err(ServiceError::Validation("search query must not be empty".to_string()));
        }
        let rows = catalog_db::search_representatives(&self.pool, query, limit).await?;
        self.cards(rows.into_iter().map(Into::into).collect()).await
    }

    /// Attaches current prices, resolved images and category names.
    pub(crate) async fn cards(&self, products: Vec<Product>) -> Result<Vec<ProductCard>, ServiceError> {
        if products.is_empty() {
            return Ok(Vec::new());
        }
        let prices = self.prices.get_all().await?;
        let index = self.image_index(&products).await?;
        Ok(products
            .into_iter()
            .map(|product| card(product, &prices, &index))
            .collect())
    }

    async fn image_index(&self, products: &[Product]) -> Result<ImageIndex, ServiceError> {
        let models: Vec<String> = products
            .iter()
            .filter_map(|p| p.level2.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let sets = catalog_db::list_image_sets_for_models(&self.pool, &models).await?;
        Ok(ImageIndex::new(sets.into_iter().map(ImageSet::from)))
    }
}

fn card(product: Product, prices: &BTreeMap<String, PriceQuote>, index: &ImageIndex) -> ProductCard {
    let images = resolve_images(&product, index);
    ProductCard {
        category_name: product.category().display_name().to_string(),
        price: prices.get(&product.sku).cloned(),
        images,
        product,
    }
}
