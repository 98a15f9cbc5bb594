//! Request plumbing shared by every catalog route: request ids, bearer auth
//! for the admin surface, and a request budget for that same surface.
//!
//! Rejections use the same [`ApiError`] envelope as the handlers, so a
//! client sees one error shape whether a request failed in middleware or
//! in the catalog itself.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlates log lines and error bodies for one request.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Admin API keys. Product, price, category and transfer writes all sit
/// behind these.
#[derive(Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<String>>,
    pub enabled: bool,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl AuthState {
    /// Builds auth from `CATALOG_API_KEYS`.
    ///
    /// With no keys, a development server runs open and anything else
    /// refuses to start.
    pub fn from_keys(keys: &[String], is_development: bool) -> anyhow::Result<Self> {
        let keys: Vec<String> = keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        match (keys.is_empty(), is_development) {
            (false, _) => Ok(Self {
                api_keys: Arc::new(keys),
                enabled: true,
            }),
            (true, true) => {
                tracing::warn!("CATALOG_API_KEYS is empty; admin routes are open in development");
                Ok(Self {
                    api_keys: Arc::new(Vec::new()),
                    enabled: false,
                })
            }
            (true, false) => anyhow::bail!(
                "CATALOG_API_KEYS must list at least one admin key outside development"
            ),
        }
    }

    /// Compares against every key without short-circuiting.
    fn allows(&self, token: &str) -> bool {
        self.api_keys
            .iter()
            .fold(false, |found, key| {
                found | bool::from(key.as_bytes().ct_eq(token.as_bytes()))
            })
    }
}

#[derive(Debug)]
struct Window {
    opened: Instant,
    used: usize,
}

/// Shared request budget for the admin routes: at most `budget` requests
/// per `period`, counted in fixed windows.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    budget: usize,
    period: Duration,
    window: Arc<Mutex<Window>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(budget: usize, period: Duration) -> Self {
        Self {
            budget,
            period,
            window: Arc::new(Mutex::new(Window {
                opened: Instant::now(),
                used: 0,
            })),
        }
    }

    /// Spends one request from the current window, opening a fresh window
    /// once `period` has passed. Returns `false` when the budget is spent.
    async fn try_spend(&self) -> bool {
        let mut window = self.window.lock().await;
        if window.opened.elapsed() >= self.period {
            *window = Window {
                opened: Instant::now(),
                used: 0,
            };
        }
        if window.used >= self.budget {
            return false;
        }
        window.used += 1;
        true
    }
}

fn incoming_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

/// Reuses the caller's `x-request-id` or mints a `UUIDv4`, and echoes it
/// on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = incoming_request_id(req.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }
    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => {
            let request_id = request_id_of(&req);
            tracing::warn!(request_id = %request_id, path = %req.uri().path(), "admin request rejected");
            ApiError::new(request_id, "unauthorized", "missing or invalid admin key").into_response()
        }
    }
}

pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    if rate_limit.try_spend().await {
        next.run(req).await
    } else {
        ApiError::new(
            request_id_of(&req),
            "rate_limited",
            "too many admin requests; retry shortly",
        )
        .into_response()
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
