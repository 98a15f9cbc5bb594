use catalog_core::{build_category_tree, CategoryNode, CategoryPath, CategorySeed};
pub use catalog_db::RenameReport;

use crate::{Catalog, ServiceError};

impl Catalog {
    /// Configured categories merged with the paths products actually use,
    /// each node carrying the number of products at or below it.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn category_tree(&self) -> Result<Vec<CategoryNode>, ServiceError> {
        let seeds: Vec<CategorySeed> = catalog_db::list_categories(&self.pool)
            .await?
            .into_iter()
            .map(catalog_db::CategoryRow::into_seed)
            .collect();
        let counts: Vec<(CategoryPath, i64)> = catalog_db::count_products_by_category(&self.pool)
            .await?
            .into_iter()
            .map(|row| {
                (
                    CategoryPath::new(&row.level0, row.level1.as_deref(), row.level2.as_deref()),
                    row.product_count,
                )
            })
            .collect();
        Ok(build_category_tree(&seeds, &counts))
    }

    /// # Errors
    ///
    /// [`ServiceError::Validation`] for an invalid path,
    /// [`ServiceError::Conflict`] if the path exists.
    pub async fn create_category(&self, seed: CategorySeed) -> Result<CategorySeed, ServiceError> {
        let path = CategoryPath::new(
            &seed.path.level0,
            seed.path.level1.as_deref(),
            seed.path.level2.as_deref(),
        );
        path.check().map_err(ServiceError::Validation)?;

        let row = catalog_db::create_category(
            &self.pool,
            &path,
            seed.description.as_deref(),
            seed.icon.as_deref(),
        )
        .await?;
        tracing::info!(category = %path.breadcrumb(), "category created");
        Ok(row.into_seed())
    }

    /// Renames a top-level category everywhere it is used.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for blank or identical names,
    /// [`ServiceError::NotFound`] when nothing uses `old_name`.
    pub async fn rename_category(
        &self,
        old_name: &str,
        new_name: &str,
    ) -> Result<RenameReport, ServiceError> {
        let (old_name, new_name) = (old_name.trim(), new_name.trim());
        if old_name.is_empty() || new_name.is_empty() {
            return Err(ServiceError::Validation(
                "category names must not be empty".to_string(),
            ));
        }
        if old_name == new_name {
            return Err(ServiceError::Validation(
                "new name must differ from the old one".to_string(),
            ));
        }
        match catalog_db::rename_level0(&self.pool, old_name, new_name).await {
            Ok(report) => Ok(report),
            Err(catalog_db::DbError::NotFound) => {
                Err(ServiceError::NotFound(format!("category '{old_name}'")))
            }
            Err(e) => Err(e.into()),
        }
    }
}
