//! Model-level views: representative grouping, variant ordering, and the
//! per-model metadata stored alongside products.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::products::Product;

/// All products sharing one `(level2, brand)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelGroup {
    /// The member with the smallest id.
    pub representative: Product,
    /// Every member, representative included, ordered by id.
    pub members: Vec<Product>,
}

/// Groups products by `(level2, brand)` and picks each group's representative.
///
/// Groups come back ordered by `level2` (unlabelled models last), then by
/// representative id.
#[must_use]
pub fn group_by_model(products: Vec<Product>) -> Vec<ModelGroup> {
    let mut groups: HashMap<(Option<String>, String), Vec<Product>> = HashMap::new();
    for product in products {
        groups
            .entry((product.level2.clone(), product.brand.clone()))
            .or_default()
            .push(product);
    }

    let mut out: Vec<ModelGroup> = groups
        .into_values()
        .filter_map(|mut members| {
            members.sort_by_key(|p| p.id);
            let representative = members.first()?.clone();
            Some(ModelGroup {
                representative,
                members,
            })
        })
        .collect();

    out.sort_by(|a, b| {
        let (ra, rb) = (&a.representative, &b.representative);
        ra.level2
            .is_none()
            .cmp(&rb.level2.is_none())
            .then_with(|| ra.level2.cmp(&rb.level2))
            .then_with(|| ra.id.cmp(&rb.id))
    });
    out
}

/// Orders variants by color name, case-insensitively, then by id.
/// Products without a color sort last.
pub fn sort_variants(variants: &mut [Product]) {
    variants.sort_by(|a, b| {
        let ca = a.attributes.color.as_deref().map(str::to_lowercase);
        let cb = b.attributes.color.as_deref().map(str::to_lowercase);
        let by_color = match (ca, cb) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_color.then_with(|| a.id.cmp(&b.id))
    });
}

/// Marketing copy and structured details for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    pub level2: String,
    pub description: String,
    #[serde(default = "empty_object")]
    pub details: serde_json::Value,
}

/// Attribute keys that distinguish variants within a top-level category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFields {
    pub level0: String,
    pub fields: Vec<String>,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::tests::sample_product;

    #[test]
    fn one_group_per_model_and_brand() {
        let products = vec![
            sample_product(7, "MBA-M2-512", "MacBook Air M2", "Apple"),
            sample_product(3, "MBA-M2-256", "MacBook Air M2", "Apple"),
            sample_product(5, "IP16-128", "iPhone 16", "Apple"),
            sample_product(4, "GX-256", "iPhone 16", "Refurb Co"),
        ];

        let groups = group_by_model(products);
        assert_eq!(groups.len(), 3);

        let air = groups
            .iter()
            .find(|g| g.representative.level2.as_deref() == Some("MacBook Air M2"))
            .unwrap();
        assert_eq!(air.representative.sku, "MBA-M2-256");
        assert_eq!(air.members.len(), 2);
    }

    #[test]
    fn groups_are_ordered_by_level2_then_id() {
        let mut unlabelled = sample_product(1, "CABLE", "x", "Generic");
        unlabelled.level2 = None;
        let products = vec![
            unlabelled,
            sample_product(9, "B-1", "Beta", "Apple"),
            sample_product(8, "A-2", "Alpha", "Samsung"),
            sample_product(2, "A-1", "Alpha", "Apple"),
        ];

        let order: Vec<String> = group_by_model(products)
            .into_iter()
            .map(|g| g.representative.sku)
            .collect();
        assert_eq!(order, vec!["A-1", "A-2", "B-1", "CABLE"]);
    }

    #[test]
    fn sort_variants_by_color_case_insensitive() {
        let mut a = sample_product(1, "A", "M", "B");
        a.attributes.color = Some("silver".to_string());
        let mut b = sample_product(2, "B", "M", "B");
        b.attributes.color = Some("Midnight".to_string());
        let c = sample_product(3, "C", "M", "B");
        let mut d = sample_product(4, "D", "M", "B");
        d.attributes.color = Some("Blue".to_string());

        let mut variants = vec![a, b, c, d];
        sort_variants(&mut variants);
        let skus: Vec<&str> = variants.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["D", "B", "A", "C"]);
    }

    #[test]
    fn model_description_defaults_details() {
        let desc: ModelDescription =
            serde_json::from_str(r#"{"level2":"iPhone 16","description":"A18 chip"}"#).unwrap();
        assert!(desc.details.as_object().unwrap().is_empty());
    }
}
