pub mod app_config;
pub mod attributes;
pub mod categories;
pub mod config;
pub mod images;
pub mod models;
pub mod patch;
pub mod prices;
pub mod products;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, PriceBackend};
pub use attributes::Attributes;
pub use categories::{
    build_category_tree, load_categories, CategoriesFile, CategoryNode, CategoryPath,
    CategorySeed,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use images::{
    normalize_color, resolve_images, ImageIndex, ImageSet, ImageSource, ResolvedImages,
};
pub use models::{group_by_model, sort_variants, ModelDescription, ModelGroup, VariantFields};
pub use prices::{discount_percentage, PriceFact, PriceQuote, PriceUpdate, DEFAULT_CURRENCY};
pub use products::{NewProduct, Product, ProductPatch};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read categories file {path}: {source}")]
    CategoriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse categories file: {0}")]
    CategoriesFileParse(#[from] serde_yaml::Error),
    #[error("invalid categories configuration: {0}")]
    Validation(String),
}
