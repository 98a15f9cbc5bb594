use std::collections::BTreeMap;
use std::time::Duration;

use catalog_core::AppConfig;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::FeedError;

const MAX_ERROR_BODY: usize = 200;

/// One entry of a feed response. `price` is `None` when the feed sent
/// something that is not a usable number.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub price: Option<f64>,
    pub name: Option<String>,
}

/// Client for the external price feed.
///
/// The feed takes `POST {"skus": [...]}` and answers
/// `{"prices": {"<sku>": {"price": 89990, "name": "..."}}}`. SKUs it does
/// not know are simply absent from `prices`.
pub struct PriceFeedClient {
    client: Client,
    url: Url,
    token: Option<String>,
}

impl PriceFeedClient {
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidUrl`] if `url` does not parse, or
    /// [`FeedError::Http`] if the `reqwest::Client` cannot be constructed.
    pub fn new(url: &str, token: Option<&str>, timeout_secs: u64) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("catalog/0.1 (price-sync)")
            .build()?;

        let parsed = Url::parse(url).map_err(|e| FeedError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            url: parsed,
            token: token.map(ToOwned::to_owned),
        })
    }

    /// Builds a client from the feed settings, or `None` when no feed URL is
    /// configured.
    ///
    /// # Errors
    ///
    /// Same as [`PriceFeedClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, FeedError> {
        config
            .price_feed_url
            .as_deref()
            .map(|url| {
                Self::new(
                    url,
                    config.price_feed_token.as_deref(),
                    config.price_feed_timeout_secs,
                )
            })
            .transpose()
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetches current prices for `skus`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Http`] on network failure.
    /// - [`FeedError::UnexpectedStatus`] on a non-2xx response.
    /// - [`FeedError::Deserialize`] if the body is not JSON.
    /// - [`FeedError::UnexpectedShape`] if the body has no `prices` object.
    pub async fn fetch_prices(
        &self,
        skus: &[String],
    ) -> Result<BTreeMap<String, FeedItem>, FeedError> {
        if skus.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut request = self
            .client
            .post(self.url.clone())
            .json(&serde_json::json!({ "skus": skus }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "price feed request failed");
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| FeedError::Deserialize {
            context: format!("fetch_prices({} skus)", skus.len()),
            source: e,
        })?;
        parse_prices(&value)
    }
}

fn parse_prices(body: &Value) -> Result<BTreeMap<String, FeedItem>, FeedError> {
    let prices = body
        .get("prices")
        .and_then(Value::as_object)
        .ok_or_else(|| FeedError::UnexpectedShape("missing 'prices' object".to_string()))?;

    Ok(prices
        .iter()
        .map(|(sku, entry)| (sku.clone(), parse_item(entry)))
        .collect())
}

fn parse_item(entry: &Value) -> FeedItem {
    // A bare number is accepted as the price.
    let (price, name) = match entry {
        Value::Object(obj) => (
            obj.get("price").and_then(parse_amount),
            obj.get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(ToOwned::to_owned),
        ),
        other => (parse_amount(other), None),
    };
    FeedItem { price, name }
}

fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace([' ', '\u{a0}'], "").replace(',', ".").parse().ok()?,
        _ => return None,
    };
    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rejects_invalid_url() {
        let err = PriceFeedClient::new("not a url", None, 5)
            .err()
            .expect("url should be rejected");
        assert!(matches!(err, FeedError::InvalidUrl { .. }));
    }

    #[test]
    fn parses_numbers_and_numeric_strings() {
        let parsed = parse_prices(&json!({
            "prices": {
                "A": {"price": 89990, "name": "iPhone 16"},
                "B": {"price": "1 990,50"},
                "C": {"price": null},
                "D": {"price": -1},
                "E": 500
            }
        }))
        .unwrap();

        assert_eq!(parsed["A"].price, Some(89_990.0));
        assert_eq!(parsed["A"].name.as_deref(), Some("iPhone 16"));
        assert_eq!(parsed["B"].price, Some(1_990.5));
        assert_eq!(parsed["C"].price, None);
        assert_eq!(parsed["D"].price, None);
        assert_eq!(parsed["E"].price, Some(500.0));
    }

    #[test]
    fn missing_prices_object_is_a_shape_error() {
        let err = parse_prices(&json!({"data": []})).unwrap_err();
        assert!(matches!(err, FeedError::UnexpectedShape(_)));
    }
}
