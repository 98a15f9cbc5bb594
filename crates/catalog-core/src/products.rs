use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::categories::CategoryPath;
use crate::patch::{double_option, trimmed};
use crate::CoreError;

/// A sellable configuration, identified by its SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub level0: String,
    pub level1: Option<String>,
    pub level2: Option<String>,
    pub attributes: Attributes,
    /// Per-product image list; takes precedence over shared image sets.
    pub images: Vec<String>,
    /// Single legacy image, used only when nothing else resolves.
    pub image_url: Option<String>,
    pub stock: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub fn category(&self) -> CategoryPath {
        CategoryPath {
            level0: self.level0.clone(),
            level1: self.level1.clone(),
            level2: self.level2.clone(),
        }
    }
}

/// Fields accepted when creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub level0: String,
    #[serde(default)]
    pub level1: Option<String>,
    #[serde(default)]
    pub level2: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

impl NewProduct {
    /// Trims every text field and checks the required ones.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] naming every missing required field
    /// (`sku`, `name`, `brand`, `level0`) or a negative stock count.
    pub fn normalized(self) -> Result<Self, CoreError> {
        let sku = self.sku.trim().to_string();
        let name = self.name.trim().to_string();
        let brand = self.brand.trim().to_string();
        let level0 = self.level0.trim().to_string();

        let missing: Vec<&str> = [
            ("sku", &sku),
            ("name", &name),
            ("brand", &brand),
            ("level0", &level0),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| k)
        .collect();
        if !missing.is_empty() {
            return Err(CoreError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        if self.stock < 0 {
            return Err(CoreError::Validation(format!(
                "stock must be non-negative, got {}",
                self.stock
            )));
        }

        Ok(Self {
            sku,
            name,
            brand,
            level0,
            level1: trimmed(self.level1.as_deref()),
            level2: trimmed(self.level2.as_deref()),
            attributes: self.attributes,
            images: self
                .images
                .iter()
                .filter_map(|u| trimmed(Some(u)))
                .collect(),
            image_url: trimmed(self.image_url.as_deref()),
            stock: self.stock,
            is_available: self.is_available,
        })
    }
}

/// Partial update. `None` keeps the current value; for nullable columns
/// `Some(None)` clears it. The SKU itself cannot change.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub level0: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub level1: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub level2: Option<Option<String>>,
    #[serde(default)]
    pub attributes: Option<Attributes>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub is_available: Option<bool>,
}

impl ProductPatch {
    /// Validates the patch against the SKU it targets and trims text fields.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the patch tries to change the SKU,
    /// blanks a required field, or sets a negative stock.
    pub fn normalized(self, target_sku: &str) -> Result<Self, CoreError> {
        if let Some(sku) = self.sku.as_deref() {
            if sku.trim() != target_sku {
                return Err(CoreError::Validation(format!(
                    "sku is immutable; cannot change '{target_sku}' to '{}'",
                    sku.trim()
                )));
            }
        }

        let required = |field: &str, value: Option<String>| -> Result<Option<String>, CoreError> {
            match value {
                Some(v) if v.trim().is_empty() => Err(CoreError::Validation(format!(
                    "{field} must not be empty"
                ))),
                Some(v) => Ok(Some(v.trim().to_string())),
                None => Ok(None),
            }
        };
        let nullable = |value: Option<Option<String>>| value.map(|v| trimmed(v.as_deref()));

        if let Some(stock) = self.stock {
            if stock < 0 {
                return Err(CoreError::Validation(format!(
                    "stock must be non-negative, got {stock}"
                )));
            }
        }

        Ok(Self {
            sku: None,
            name: required("name", self.name)?,
            brand: required("brand", self.brand)?,
            level0: required("level0", self.level0)?,
            level1: nullable(self.level1),
            level2: nullable(self.level2),
            attributes: self.attributes,
            images: self
                .images
                .map(|urls| urls.iter().filter_map(|u| trimmed(Some(u))).collect()),
            image_url: nullable(self.image_url),
            stock: self.stock,
            is_available: self.is_available,
        })
    }
}

fn default_available() -> bool {
    true
}
