use std::collections::HashSet;

use catalog_core::{group_by_model, sort_variants, ImageSet, ModelDescription, Product};
use serde::Serialize;

use crate::products::ProductCard;
use crate::{Catalog, ServiceError, DEFAULT_VARIANT_FIELDS};

/// Everything a model page needs: the representative, every variant with
/// its own price, and the per-model metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelView {
    pub level2: String,
    pub representative: ProductCard,
    pub variants: Vec<ProductCard>,
    /// Attribute keys that tell the variants apart.
    pub variant_fields: Vec<String>,
    pub description: Option<ModelDescription>,
}

impl Catalog {
    /// Every variant of the model labelled `level2`, ordered by color.
    ///
    /// When any product of the model lists its siblings under a nested
    /// `variants` attribute, those SKUs define the set. Otherwise all
    /// products carrying the label are returned.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] when no product has this label.
    pub async fn get_variants(&self, level2: &str) -> Result<Vec<ProductCard>, ServiceError> {
        let mut variants = self.variant_products(level2).await?;
        sort_variants(&mut variants);
        self.cards(variants).await
    }

    /// # Errors
    ///
    /// [`ServiceError::NotFound`] when no product has this label.
    pub async fn get_model(&self, level2: &str) -> Result<ModelView, ServiceError> {
        let mut variants = self.variant_products(level2).await?;
        let representative = group_by_model(variants.clone())
            .into_iter()
            .next()
            .map(|group| group.representative)
            .ok_or_else(|| ServiceError::NotFound(format!("model '{level2}'")))?;

        let variant_fields = catalog_db::get_variant_fields(&self.pool, &representative.level0)
            .await?
            .map(|row| catalog_core::VariantFields::from(row).fields)
            .filter(|fields| !fields.is_empty())
            .unwrap_or_else(|| DEFAULT_VARIANT_FIELDS.iter().map(ToString::to_string).collect());
        let description = catalog_db::get_model_description(&self.pool, level2)
            .await?
            .map(Into::into);

        sort_variants(&mut variants);
        let cards = self.cards(variants).await?;
        let representative = cards
            .iter()
            .find(|card| card.product.id == representative.id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("model '{level2}'")))?;

        Ok(ModelView {
            level2: level2.to_string(),
            representative,
            variants: cards,
            variant_fields,
            description,
        })
    }

    /// # Errors
    ///
    /// [`ServiceError::Validation`] for a blank label or description.
    pub async fn set_model_description(
        &self,
        description: ModelDescription,
    ) -> Result<ModelDescription, ServiceError> {
        let description = ModelDescription {
            level2: description.level2.trim().to_string(),
            description: description.description.trim().to_string(),
            details: description.details,
        };
        if description.level2.is_empty() || description.description.is_empty() {
            return Err(ServiceError::Validation(
                "level2 and description must not be empty".to_string(),
            ));
        }
        if !description.details.is_object() {
            return Err(ServiceError::Validation(
                "details must be a JSON object".to_string(),
            ));
        }
        let row = catalog_db::upsert_model_description(&self.pool, &description).await?;
        Ok(row.into())
    }

    /// Creates or replaces the shared images for one model and color.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for a blank label, color or URL list.
    pub async fn put_image_set(&self, set: ImageSet) -> Result<ImageSet, ServiceError> {
        let set = ImageSet {
            level2: set.level2.trim().to_string(),
            color: set.color.trim().to_string(),
            images: set
                .images
                .iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect(),
        };
        if set.level2.is_empty() || set.color_key().is_empty() {
            return Err(ServiceError::Validation(
                "level2 and color must not be empty".to_string(),
            ));
        }
        if set.images.is_empty() {
            return Err(ServiceError::Validation(
                "an image set needs at least one URL".to_string(),
            ));
        }
        let row = catalog_db::upsert_image_set(&self.pool, &set).await?;
        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_image_sets(&self, level2: Option<&str>) -> Result<Vec<ImageSet>, ServiceError> {
        let rows = catalog_db::list_image_sets(&self.pool, level2).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn variant_products(&self, level2: &str) -> Result<Vec<Product>, ServiceError> {
        let level2 = level2.trim();
        let products: Vec<Product> = catalog_db::list_products_by_level2(&self.pool, level2)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        if products.is_empty() {
            return Err(ServiceError::NotFound(format!("model '{level2}'")));
        }

        let mut seen = HashSet::new();
        let nested: Vec<String> = products
            .iter()
            .filter_map(|p| p.attributes.variant_skus())
            .flatten()
            .filter(|sku| seen.insert(sku.clone()))
            .collect();
        if nested.is_empty() {
            return Ok(products);
        }

        let listed: Vec<Product> = catalog_db::list_products_by_skus(&self.pool, &nested)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        for sku in &nested {
            if !listed.iter().any(|p| &p.sku == sku) {
                tracing::warn!(level2, sku = %sku, "nested variant refers to unknown sku");
            }
        }
        if listed.is_empty() {
            return Ok(products);
        }
        Ok(listed)
    }
}
