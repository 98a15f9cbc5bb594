use std::str::FromStr;

use catalog_core::{PriceQuote, Product};
use serde::{Deserialize, Serialize};

use crate::table::{write_table, Cell, SheetFormat};
use crate::{SheetError, PRICES_SHEET, PRODUCTS_SHEET};

const PRODUCT_COLUMNS: [&str; 20] = [
    "sku*",
    "name*",
    "brand*",
    "level0*",
    "level1",
    "level2",
    "color",
    "disk",
    "sim_config",
    "ram",
    "connectivity",
    "attributes",
    "stock",
    "is_available",
    "images",
    "image_url",
    "price",
    "old_price",
    "currency",
    "tracked",
];

const PRICE_COLUMNS: [&str; 5] = ["sku*", "price*", "old_price", "currency", "tracked"];

/// A product together with its current price, as written to an export.
#[derive(Debug, Clone, Copy)]
pub struct ExportedProduct<'a> {
    pub product: &'a Product,
    pub price: Option<&'a PriceQuote>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Products,
    Prices,
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "products" => Ok(Self::Products),
            "prices" => Ok(Self::Prices),
            other => Err(format!("unknown template '{other}' (expected products or prices)")),
        }
    }
}

/// Writes products in the import layout, followed by the derived
/// `category` and `discount_percentage` columns. Re-importing an export
/// ignores the derived columns.
///
/// # Errors
///
/// Returns [`SheetError::Write`] or [`SheetError::CsvWrite`] if encoding fails.
pub fn product_export(
    products: &[ExportedProduct<'_>],
    format: SheetFormat,
) -> Result<Vec<u8>, SheetError> {
    let mut headers = plain(&PRODUCT_COLUMNS);
    headers.push("category".to_string());
    headers.push("discount_percentage".to_string());

    let rows: Vec<Vec<Cell>> = products
        .iter()
        .map(|item| {
            let p = item.product;
            let attrs = &p.attributes;
            let extra = if attrs.extra.is_empty() {
                Cell::Empty
            } else {
                Cell::text(serde_json::Value::Object(attrs.extra.clone()).to_string())
            };
            let mut cells = vec![
                Cell::text(&p.sku),
                Cell::text(&p.name),
                Cell::text(&p.brand),
                Cell::text(&p.level0),
                Cell::opt(p.level1.as_deref()),
                Cell::opt(p.level2.as_deref()),
                Cell::opt(attrs.color.as_deref()),
                Cell::opt(attrs.disk.as_deref()),
                Cell::opt(attrs.sim_config.as_deref()),
                Cell::opt(attrs.ram.as_deref()),
                Cell::opt(attrs.connectivity.as_deref()),
                extra,
                Cell::Number(f64::from(p.stock)),
                Cell::Bool(p.is_available),
                Cell::text(p.images.join(", ")),
                Cell::opt(p.image_url.as_deref()),
            ];
            cells.extend(price_cells(item.price));
            cells.push(Cell::text(p.category().display_name()));
            cells.push(
                item.price
                    .map_or(Cell::Empty, |q| Cell::Number(q.discount_percentage)),
            );
            cells
        })
        .collect();

    write_table(format, PRODUCTS_SHEET, &headers, &rows)
}

/// Writes one row per stored price, with the derived discount appended.
///
/// # Errors
///
/// Returns [`SheetError::Write`] or [`SheetError::CsvWrite`] if encoding fails.
pub fn price_export<'a>(
    prices: impl IntoIterator<Item = (&'a String, &'a PriceQuote)>,
    format: SheetFormat,
) -> Result<Vec<u8>, SheetError> {
    let mut headers = plain(&PRICE_COLUMNS);
    headers.push("discount_percentage".to_string());

    let rows: Vec<Vec<Cell>> = prices
        .into_iter()
        .map(|(sku, quote)| {
            let mut cells = vec![Cell::text(sku.as_str())];
            cells.extend(price_cells(Some(quote)));
            cells.push(Cell::Number(quote.discount_percentage));
            cells
        })
        .collect();

    write_table(format, PRICES_SHEET, &headers, &rows)
}

/// A blank upload sheet with marked required headers and one example row.
///
/// # Errors
///
/// Returns [`SheetError::Write`] or [`SheetError::CsvWrite`] if encoding fails.
pub fn template(kind: TemplateKind, format: SheetFormat) -> Result<Vec<u8>, SheetError> {
    match kind {
        TemplateKind::Products => {
            let example = [
                "IP16-128-BLK",
                "iPhone 16 128GB Black",
                "Apple",
                "Smartphones",
                "iPhone 16 Series",
                "iPhone 16",
                "Black",
                "128GB",
                "eSIM + nano-SIM",
                "8GB",
                "5G",
                "{\"warranty\": \"1 year\"}",
                "10",
                "yes",
                "https://cdn.example.com/ip16-black-1.jpg, https://cdn.example.com/ip16-black-2.jpg",
                "",
                "89990",
                "99990",
                "RUB",
                "yes",
            ];
            let row = example.iter().map(|v| Cell::text(*v)).collect();
            write_table(format, PRODUCTS_SHEET, &header_row(&PRODUCT_COLUMNS), &[row])
        }
        TemplateKind::Prices => {
            let example = ["IP16-128-BLK", "89990", "99990", "RUB", "yes"];
            let row = example.iter().map(|v| Cell::text(*v)).collect();
            write_table(format, PRICES_SHEET, &header_row(&PRICE_COLUMNS), &[row])
        }
    }
}

fn price_cells(quote: Option<&PriceQuote>) -> [Cell; 4] {
    match quote {
        Some(q) => [
            Cell::Number(q.price),
            Cell::Number(q.old_price),
            Cell::text(&q.currency),
            Cell::Bool(q.is_tracked),
        ],
        None => [Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty],
    }
}

fn header_row(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_string()).collect()
}

/// Export headers drop the required marker.
fn plain(columns: &[&str]) -> Vec<String> {
    columns
        .iter()
        .map(|c| c.trim_end_matches('*').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use catalog_core::{Attributes, PriceFact};
    use chrono::Utc;

    use super::*;
    use crate::{parse_prices, parse_products};

    fn product(sku: &str, color: &str) -> Product {
        Product {
            id: 1,
            sku: sku.to_string(),
            name: "MacBook Air M2".to_string(),
            brand: "Apple".to_string(),
            level0: "Laptops".to_string(),
            level1: Some("MacBook Air".to_string()),
            level2: Some("MacBook Air M2".to_string()),
            attributes: Attributes {
                color: Some(color.to_string()),
                disk: Some("256GB".to_string()),
                ..Attributes::default()
            },
            images: vec!["a.jpg".to_string()],
            image_url: None,
            stock: 4,
            is_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn product_export_reimports_cleanly() {
        let p = product("MBA-M2-256", "Midnight");
        let quote = PriceFact::new(99_990.0, Some(109_990.0), "RUB", true)
            .unwrap()
            .quote();
        let items = [ExportedProduct {
            product: &p,
            price: Some(&quote),
        }];

        for format in [SheetFormat::Xlsx, SheetFormat::Csv] {
            let bytes = product_export(&items, format).unwrap();
            let sheet = parse_products(&bytes).unwrap();
            assert!(sheet.errors.is_empty(), "{:?}", sheet.errors);
            let row = &sheet.rows[0];
            assert_eq!(row.product.sku, "MBA-M2-256");
            assert_eq!(row.product.level2.as_deref(), Some("MacBook Air M2"));
            assert_eq!(row.product.attributes.disk.as_deref(), Some("256GB"));
            assert_eq!(row.product.stock, 4);
            let price = row.price.as_ref().unwrap();
            assert_eq!(price.price, 99_990.0);
            assert_eq!(price.old_price, Some(109_990.0));
        }
    }

    #[test]
    fn product_without_price_exports_blank_price_cells() {
        let p = product("MBA-M2-512", "Starlight");
        let items = [ExportedProduct {
            product: &p,
            price: None,
        }];
        let bytes = product_export(&items, SheetFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let data_line = text.lines().nth(1).unwrap();
        assert!(data_line.ends_with(",,,,,MacBook Air M2,"), "{data_line}");
    }

    #[test]
    fn price_export_lists_discount() {
        let mut prices = BTreeMap::new();
        prices.insert(
            "IP16-128-BLK".to_string(),
            PriceFact::new(80.0, Some(100.0), "RUB", true).unwrap().quote(),
        );
        let bytes = price_export(&prices, SheetFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "sku,price,old_price,currency,tracked,discount_percentage\n\
             IP16-128-BLK,80,100,RUB,true,20\n"
        );
    }

    #[test]
    fn templates_parse_as_valid_uploads() {
        let products = template(TemplateKind::Products, SheetFormat::Xlsx).unwrap();
        let sheet = parse_products(&products).unwrap();
        assert_eq!(sheet.rows.len(), 1);
        assert!(sheet.errors.is_empty());

        let prices = template(TemplateKind::Prices, SheetFormat::Csv).unwrap();
        let sheet = parse_prices(&prices).unwrap();
        assert_eq!(sheet.rows[0].sku, "IP16-128-BLK");
    }

    #[test]
    fn template_kind_parses() {
        assert_eq!("Products".parse::<TemplateKind>(), Ok(TemplateKind::Products));
        assert!("orders".parse::<TemplateKind>().is_err());
    }
}
