use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const DEFAULT_CURRENCY: &str = "RUB";

/// Discount derived from the two stored prices.
///
/// `(old_price - price) / old_price * 100` when `old_price > price` and
/// `old_price > 0`, otherwise zero. Never persisted.
#[must_use]
pub fn discount_percentage(price: f64, old_price: f64) -> f64 {
    if old_price > price && old_price > 0.0 {
        (old_price - price) / old_price * 100.0
    } else {
        0.0
    }
}

/// A stored price fact. The on-disk shape is exactly these four keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceFact {
    pub price: f64,
    pub old_price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Eligible for external feed sync. Older files call this `is_parse`.
    #[serde(default = "default_tracked", alias = "is_parse")]
    pub is_tracked: bool,
}

impl PriceFact {
    /// Builds a fact, defaulting `old_price` to `price` when omitted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if either price is negative or not finite,
    /// or if the currency is blank.
    pub fn new(
        price: f64,
        old_price: Option<f64>,
        currency: &str,
        is_tracked: bool,
    ) -> Result<Self, CoreError> {
        validate_amount("price", price)?;
        let old_price = old_price.unwrap_or(price);
        validate_amount("old_price", old_price)?;
        let currency = currency.trim();
        if currency.is_empty() {
            return Err(CoreError::Validation("currency must not be empty".to_string()));
        }
        Ok(Self {
            price,
            old_price,
            currency: currency.to_uppercase(),
            is_tracked,
        })
    }

    #[must_use]
    pub fn discount_percentage(&self) -> f64 {
        discount_percentage(self.price, self.old_price)
    }

    #[must_use]
    pub fn quote(&self) -> PriceQuote {
        PriceQuote {
            price: self.price,
            old_price: self.old_price,
            currency: self.currency.clone(),
            is_tracked: self.is_tracked,
            discount_percentage: self.discount_percentage(),
        }
    }
}

/// A price fact as presented to readers, with the derived discount attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    pub old_price: f64,
    pub currency: String,
    pub is_tracked: bool,
    pub discount_percentage: f64,
}

/// A partial price used by bulk writes. Missing fields fall back to the
/// existing fact for the SKU, then to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub price: f64,
    #[serde(default)]
    pub old_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, alias = "is_parse")]
    pub is_tracked: Option<bool>,
}

impl PriceUpdate {
    /// Resolves this update against the fact currently stored for the SKU.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when the resulting fact is invalid.
    pub fn resolve(
        &self,
        existing: Option<&PriceFact>,
        default_currency: &str,
    ) -> Result<PriceFact, CoreError> {
        let currency = self
            .currency
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| existing.map(|f| f.currency.as_str()))
            .unwrap_or(default_currency);
        let is_tracked = self
            .is_tracked
            .or_else(|| existing.map(|f| f.is_tracked))
            .unwrap_or(true);
        PriceFact::new(self.price, self.old_price, currency, is_tracked)
    }
}

fn validate_amount(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "{field} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_tracked() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_matches_formula_exactly() {
        let fact = PriceFact::new(89_990.0, Some(99_990.0), "RUB", true).unwrap();
        let expected = (99_990.0_f64 - 89_990.0) / 99_990.0 * 100.0;
        assert_eq!(fact.discount_percentage().to_bits(), expected.to_bits());
        assert!((fact.discount_percentage() - 10.001).abs() < 0.001);
    }

    #[test]
    fn discount_is_zero_without_markdown() {
        assert_eq!(discount_percentage(100.0, 100.0), 0.0);
        assert_eq!(discount_percentage(120.0, 100.0), 0.0);
        assert_eq!(discount_percentage(0.0, 0.0), 0.0);
    }

    #[test]
    fn discount_is_stable_across_reads() {
        let fact = PriceFact::new(500.0, Some(750.0), "RUB", false).unwrap();
        assert_eq!(
            fact.discount_percentage().to_bits(),
            fact.discount_percentage().to_bits()
        );
    }

    #[test]
    fn omitted_old_price_defaults_to_price() {
        let fact = PriceFact::new(1_990.0, None, "rub", true).unwrap();
        assert_eq!(fact.old_price, 1_990.0);
        assert_eq!(fact.currency, "RUB");
        assert_eq!(fact.discount_percentage(), 0.0);
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = PriceFact::new(-1.0, None, "RUB", true).unwrap_err();
        assert!(err.to_string().contains("price must be a non-negative number"));
    }

    #[test]
    fn nan_old_price_is_rejected() {
        assert!(PriceFact::new(10.0, Some(f64::NAN), "RUB", true).is_err());
    }

    #[test]
    fn legacy_keys_are_accepted_and_dropped() {
        let raw = r#"{
            "price": 100.0,
            "old_price": 120.0,
            "currency": "RUB",
            "is_parse": false,
            "discount_percentage": 16.6,
            "updated_at": "2024-05-01T10:00:00"
        }"#;
        let fact: PriceFact = serde_json::from_str(raw).unwrap();
        assert!(!fact.is_tracked);
        let encoded = serde_json::to_value(&fact).unwrap();
        let keys: Vec<&String> = encoded.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["currency", "is_tracked", "old_price", "price"]);
    }

    #[test]
    fn update_resolves_against_existing_fact() {
        let existing = PriceFact::new(100.0, Some(150.0), "USD", false).unwrap();
        let update = PriceUpdate {
            price: 90.0,
            ..PriceUpdate::default()
        };
        let fact = update.resolve(Some(&existing), "RUB").unwrap();
        assert_eq!(fact.price, 90.0);
        assert_eq!(fact.old_price, 90.0);
        assert_eq!(fact.currency, "USD");
        assert!(!fact.is_tracked);
    }

    #[test]
    fn update_without_existing_uses_defaults() {
        let update = PriceUpdate {
            price: 90.0,
            old_price: Some(100.0),
            currency: None,
            is_tracked: None,
        };
        let fact = update.resolve(None, "RUB").unwrap();
        assert_eq!(fact.currency, "RUB");
        assert!(fact.is_tracked);
        assert!((fact.quote().discount_percentage - 10.0).abs() < 1e-9);
    }
}
