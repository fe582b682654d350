//! Cross-origin policy for the HTTP API

use axum::http::{header::CONTENT_TYPE, request::Parts, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::core::config::CorsConfig;

/// Whether `origin` is allowed by `pattern`.
///
/// A lone `*` allows any origin. Otherwise a single `*` stands for one or more
/// DNS labels, so `https://*.myshopify.com` allows `https://shop.myshopify.com`
/// but not `https://myshopify.com` or `https://evil.com/.myshopify.com`.
pub fn origin_matches(pattern: &str, origin: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    let Some((prefix, suffix)) = pattern.split_once('*') else {
        return pattern.eq_ignore_ascii_case(origin);
    };
    if suffix.contains('*') || origin.len() < prefix.len() + suffix.len() {
        return false;
    }

    let lower = origin.to_ascii_lowercase();
    if !lower.starts_with(&prefix.to_ascii_lowercase()) || !lower.ends_with(&suffix.to_ascii_lowercase()) {
        return false;
    }

    let labels = &lower[prefix.len()..lower.len() - suffix.len()];
    !labels.is_empty()
        && !labels.starts_with('.')
        && !labels.ends_with('.')
        && labels
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// Build the CORS layer: configured origins, GET/POST/PUT/DELETE, JSON bodies
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let patterns = config.allowed_origins.clone();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request: &Parts| {
                origin
                    .to_str()
                    .map(|origin| patterns.iter().any(|p| origin_matches(p, origin)))
                    .unwrap_or(false)
            },
        ))
}
