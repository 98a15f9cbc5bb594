//! Spreadsheet adapter for bulk product and price transfer.
//!
//! Reads XLSX workbooks and CSV files into typed rows, collecting per-row
//! errors instead of failing the batch, and writes exports and blank
//! templates in either format.

mod error;
mod export;
mod import;
mod table;

pub use error::SheetError;
pub use export::{price_export, product_export, template, ExportedProduct, TemplateKind};
pub use import::{
    parse_prices, parse_products, PriceSheet, PriceSheetRow, ProductSheet, ProductSheetRow,
    RowError,
};
pub use table::SheetFormat;

pub const PRODUCTS_SHEET: &str = "Products";
pub const PRICES_SHEET: &str = "Prices";
