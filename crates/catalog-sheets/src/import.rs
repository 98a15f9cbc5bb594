use catalog_core::{Attributes, NewProduct, PriceUpdate};
use serde::Serialize;

use crate::table::{Row, Table};
use crate::{SheetError, PRICES_SHEET, PRODUCTS_SHEET};

const PRODUCT_REQUIRED: [&str; 4] = ["sku", "name", "brand", "level0"];
const PRICE_REQUIRED: [&str; 2] = ["sku", "price"];

/// A row that could not be turned into a record. `row` is the 1-based
/// data-row number (the first row under the header is 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSheetRow {
    pub row: usize,
    pub product: NewProduct,
    /// Present when the row carries a price.
    pub price: Option<PriceUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductSheet {
    pub rows: Vec<ProductSheetRow>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSheetRow {
    pub row: usize,
    pub sku: String,
    pub update: PriceUpdate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSheet {
    pub rows: Vec<PriceSheetRow>,
    pub errors: Vec<RowError>,
}

/// Parses a product upload.
///
/// # Errors
///
/// Returns [`SheetError::MissingColumns`] when a required header is absent,
/// or a read error for an unreadable file. Problems within a row are
/// reported in [`ProductSheet::errors`] instead.
pub fn parse_products(bytes: &[u8]) -> Result<ProductSheet, SheetError> {
    let table = Table::read(bytes, PRODUCTS_SHEET)?;
    table.require(&PRODUCT_REQUIRED)?;

    let mut sheet = ProductSheet::default();
    for row in table.rows() {
        match product_row(&row) {
            Ok(parsed) => sheet.rows.push(parsed),
            Err(message) => {
                tracing::debug!(row = row.number, %message, "skipping product row");
                sheet.errors.push(RowError {
                    row: row.number,
                    sku: row.get("sku").map(ToOwned::to_owned),
                    message,
                });
            }
        }
    }
    Ok(sheet)
}

/// Parses a price upload.
///
/// # Errors
///
/// Same contract as [`parse_products`].
pub fn parse_prices(bytes: &[u8]) -> Result<PriceSheet, SheetError> {
    let table = Table::read(bytes, PRICES_SHEET)?;
    table.require(&PRICE_REQUIRED)?;

    let mut sheet = PriceSheet::default();
    for row in table.rows() {
        let sku = row.get("sku").map(ToOwned::to_owned);
        let parsed = sku
            .clone()
            .ok_or_else(|| "missing required fields: sku".to_string())
            .and_then(|sku| {
                let update = price_update(&row)?
                    .ok_or_else(|| "missing required fields: price".to_string())?;
                Ok(PriceSheetRow {
                    row: row.number,
                    sku,
                    update,
                })
            });
        match parsed {
            Ok(parsed) => sheet.rows.push(parsed),
            Err(message) => sheet.errors.push(RowError {
                row: row.number,
                sku,
                message,
            }),
        }
    }
    Ok(sheet)
}

fn product_row(row: &Row<'_>) -> Result<ProductSheetRow, String> {
    let text = |column: &str| row.get(column).map(ToOwned::to_owned);

    let mut attributes = row
        .get("attributes")
        .map(Attributes::from_json_lossy)
        .unwrap_or_default();
    for (column, slot) in [
        ("color", &mut attributes.color),
        ("disk", &mut attributes.disk),
        ("sim_config", &mut attributes.sim_config),
        ("ram", &mut attributes.ram),
        ("connectivity", &mut attributes.connectivity),
    ] {
        if let Some(value) = row.get(column) {
            *slot = Some(value.to_string());
        }
    }

    let stock = match row.get("stock") {
        Some(raw) => parse_stock(raw)?,
        None => 0,
    };
    let is_available = match row.get("is_available") {
        Some(raw) => parse_flag("is_available", raw)?,
        None => true,
    };
    let images = row
        .get("images")
        .map(|raw| {
            raw.split([',', '\n'])
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let product = NewProduct {
        sku: text("sku").unwrap_or_default(),
        name: text("name").unwrap_or_default(),
        brand: text("brand").unwrap_or_default(),
        level0: text("level0").unwrap_or_default(),
        level1: text("level1"),
        level2: text("level2"),
        attributes,
        images,
        image_url: text("image_url"),
        stock,
        is_available,
    }
    .normalized()
    .map_err(|e| e.to_string())?;

    Ok(ProductSheetRow {
        row: row.number,
        product,
        price: price_update(row)?,
    })
}

/// Reads the optional price columns. `Ok(None)` when the row has no price.
fn price_update(row: &Row<'_>) -> Result<Option<PriceUpdate>, String> {
    let Some(raw_price) = row.get("price") else {
        if row.get("old_price").is_some() {
            return Err("old_price given without price".to_string());
        }
        return Ok(None);
    };
    let price = parse_amount("price", raw_price)?;
    let old_price = row
        .get("old_price")
        .map(|raw| parse_amount("old_price", raw))
        .transpose()?;
    let is_tracked = row
        .get("tracked")
        .map(|raw| parse_flag("tracked", raw))
        .transpose()?;

    Ok(Some(PriceUpdate {
        price,
        old_price,
        currency: row.get("currency").map(str::to_uppercase),
        is_tracked,
    }))
}

/// Accepts `89990`, `89 990`, `89990.50` and `89990,50`.
fn parse_amount(field: &str, raw: &str) -> Result<f64, String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(format!("{field} must be a non-negative number, got '{raw}'")),
    }
}

fn parse_stock(raw: &str) -> Result<i32, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("stock must be a whole number, got '{raw}'"))?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(i32::MAX) {
        return Err(format!("stock must be a non-negative whole number, got '{raw}'"));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(value as i32)
}

fn parse_flag(field: &str, raw: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "да" => Ok(true),
        "0" | "false" | "no" | "n" | "нет" => Ok(false),
        _ => Err(format!("{field} must be yes/no, got '{raw}'")),
    }
}
