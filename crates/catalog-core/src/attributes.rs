//! Typed view over a product's free-form attribute blob.
//!
//! The well-known keys get named fields; anything else is kept verbatim in
//! `extra` so that unknown keys survive a read-modify-write cycle.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const KNOWN_KEYS: [&str; 5] = ["color", "disk", "sim_config", "ram", "connectivity"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Storage size, e.g. `"256GB"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sim_config: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attributes {
    /// Builds attributes from an arbitrary JSON value.
    ///
    /// Never fails: a non-object value yields empty attributes, and a known
    /// key holding a nested structure is dropped. Numbers and booleans under
    /// known keys are kept in their textual form.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let mut attrs = Self::default();
        for (key, value) in object {
            match key.as_str() {
                "color" => attrs.color = scalar_text(value),
                "disk" => attrs.disk = scalar_text(value),
                "sim_config" => attrs.sim_config = scalar_text(value),
                "ram" => attrs.ram = scalar_text(value),
                "connectivity" => attrs.connectivity = scalar_text(value),
                _ => {
                    attrs.extra.insert(key.clone(), value.clone());
                }
            }
        }
        attrs
    }

    /// Parses a JSON document, degrading to empty attributes when it is malformed.
    #[must_use]
    pub fn from_json_lossy(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        serde_json::from_str::<Value>(trimmed)
            .map(|v| Self::from_value(&v))
            .unwrap_or_default()
    }

    /// Flattens the attributes back into a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        for (key, value) in self.known_fields() {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(map)
    }

    /// Returns the textual value stored under `key`, looking at named fields first.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        if KNOWN_KEYS.contains(&key) {
            return self
                .known_fields()
                .into_iter()
                .find(|(k, _)| *k == key)
                .and_then(|(_, v)| v.clone());
        }
        self.extra.get(key).and_then(scalar_text)
    }

    /// SKUs listed under a nested `variants` array, if the blob carries one.
    ///
    /// Entries may be plain SKU strings or objects with a `sku` key.
    #[must_use]
    pub fn variant_skus(&self) -> Option<Vec<String>> {
        let entries = self.extra.get("variants")?.as_array()?;
        let skus = entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(obj) => obj.get("sku").and_then(scalar_text),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect();
        Some(skus)
    }

    fn known_fields(&self) -> [(&'static str, &Option<String>); 5] {
        [
            ("color", &self.color),
            ("disk", &self.disk),
            ("sim_config", &self.sim_config),
            ("ram", &self.ram),
            ("connectivity", &self.connectivity),
        ]
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_value_splits_known_and_extra_keys() {
        let attrs = Attributes::from_value(&json!({
            "color": "Titanium Black",
            "disk": "256GB",
            "sim_config": "eSIM",
            "warranty": "12 months"
        }));
        assert_eq!(attrs.color.as_deref(), Some("Titanium Black"));
        assert_eq!(attrs.disk.as_deref(), Some("256GB"));
        assert_eq!(attrs.sim_config.as_deref(), Some("eSIM"));
        assert!(attrs.ram.is_none());
        assert_eq!(attrs.extra.get("warranty"), Some(&json!("12 months")));
    }

    #[test]
    fn from_value_keeps_numbers_as_text() {
        let attrs = Attributes::from_value(&json!({ "ram": 16, "disk": 512 }));
        assert_eq!(attrs.ram.as_deref(), Some("16"));
        assert_eq!(attrs.disk.as_deref(), Some("512"));
    }

    #[test]
    fn non_object_degrades_to_empty() {
        assert_eq!(Attributes::from_value(&json!("red")), Attributes::default());
        assert_eq!(Attributes::from_value(&json!([1, 2])), Attributes::default());
    }

    #[test]
    fn malformed_json_degrades_to_empty() {
        assert_eq!(
            Attributes::from_json_lossy("{\"color\": \"red\""),
            Attributes::default()
        );
        assert_eq!(Attributes::from_json_lossy(""), Attributes::default());
    }

    #[test]
    fn to_value_round_trips_extra_keys() {
        let original = json!({ "color": "Blue", "battery": "5000mAh" });
        let attrs = Attributes::from_value(&original);
        assert_eq!(attrs.to_value(), original);
    }

    #[test]
    fn get_reads_named_and_extra_fields() {
        let attrs = Attributes::from_value(&json!({ "color": "Silver", "screen": 13.6 }));
        assert_eq!(attrs.get("color").as_deref(), Some("Silver"));
        assert_eq!(attrs.get("screen").as_deref(), Some("13.6"));
        assert!(attrs.get("disk").is_none());
    }

    #[test]
    fn variant_skus_accepts_strings_and_objects() {
        let attrs = Attributes::from_value(&json!({
            "variants": ["MBA-M2-256", { "sku": "MBA-M2-512", "disk": "512GB" }, 7, ""]
        }));
        assert_eq!(
            attrs.variant_skus(),
            Some(vec!["MBA-M2-256".to_string(), "MBA-M2-512".to_string()])
        );
    }

    #[test]
    fn variant_skus_absent_without_nested_array() {
        let attrs = Attributes::from_value(&json!({ "color": "Black" }));
        assert!(attrs.variant_skus().is_none());
    }
}
