//! Rate limiting middleware

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

/// Per-client fixed-window counter
#[derive(Debug, Clone)]
struct Window {
    started: Instant,
    count: u32,
}

/// Rate limiter state, keyed by client IP
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
    max_per_window: u32,
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter allowing `requests_per_second` per client
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_per_window: requests_per_second,
            window: Duration::from_secs(1),
        }
    }

    /// Check if a request is allowed
    pub async fn check(&self, key: &str) -> bool {
        let mut windows = self.windows.write().await;
        let now = Instant::now();

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        entry.count += 1;
        entry.count <= self.max_per_window
    }

    /// Drop windows idle for longer than `max_age` (call periodically)
    pub async fn cleanup(&self, max_age: Duration) {
        let mut windows = self.windows.write().await;
        let now = Instant::now();
        windows.retain(|_, w| now.duration_since(w.started) < max_age);
    }
}

/// Create rate limiting middleware layer
pub fn rate_limit_layer(
    rate_limiter: RateLimiter,
) -> impl Fn(
    Request<Body>,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Response> + Send>>
       + Clone
       + Send {
    move |request: Request<Body>, next: Next| {
        let rate_limiter = rate_limiter.clone();
        Box::pin(async move {
            let client_key = extract_client_ip(&request);

            if !rate_limiter.check(&client_key).await {
                tracing::warn!(client = %client_key, "Rate limit exceeded");
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, "1")],
                    "Too many requests. Please try again later.",
                )
                    .into_response();
            }

            next.run(request).await
        })
    }
}

/// Extract client IP from proxy headers, falling back to a shared bucket
fn extract_client_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_caps_per_window() {
        let limiter = RateLimiter::new(5);

        for _ in 0..5 {
            assert!(limiter.check("test-client").await);
        }
        assert!(!limiter.check("test-client").await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_windows() {
        let limiter = RateLimiter::new(1);

        assert!(limiter.check("old-client").await);
        assert!(!limiter.check("old-client").await);

        // With max_age zero every window counts as idle
        limiter.cleanup(Duration::from_secs(0)).await;
        assert!(limiter.check("old-client").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_separates_clients() {
        let limiter = RateLimiter::new(1);

        assert!(limiter.check("client-a").await);
        assert!(limiter.check("client-b").await);
        assert!(!limiter.check("client-a").await);
    }
}
