//! Fixed-window request cap per client address.
//!
//! Clients are keyed by socket peer. Forwarding headers are only honoured when
//! the limiter is told it sits behind a trusted proxy.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ApiError;

const MAX_TRACKED_CLIENTS: usize = 10_000;

#[derive(Clone, Debug)]
pub struct WindowCounter {
    pub window: u64,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: u64 },
}

#[derive(Debug, Default)]
struct Counters {
    by_client: HashMap<String, WindowCounter>,
    /// Window of the last eviction pass; at most one pass per window.
    swept_window: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window_secs: u64,
    trust_proxy: bool,
    counters: Mutex<Counters>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.max(1),
            trust_proxy: false,
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Key clients on `cf-connecting-ip` / `x-real-ip` / `x-forwarded-for`
    /// before the socket peer. Only safe behind a proxy that sets them.
    pub fn trusting_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub async fn check(&self, client: &str) -> Decision {
        self.check_at(client, Utc::now().timestamp()).await
    }

    /// `now` is a unix timestamp in seconds.
    pub async fn check_at(&self, client: &str, now: i64) -> Decision {
        let now = now.max(0) as u64;
        let window = now / self.window_secs;
        let mut counters = self.counters.lock().await;
        if counters.by_client.len() > MAX_TRACKED_CLIENTS && counters.swept_window != window {
            counters.by_client.retain(|_, c| c.window == window);
            counters.swept_window = window;
        }
        let entry = counters
            .by_client
            .entry(client.to_string())
            .or_insert(WindowCounter { window, count: 0 });
        if entry.window != window {
            entry.window = window;
            entry.count = 0;
        }
        if entry.count >= self.max_requests {
            let retry_after = (window + 1) * self.window_secs - now;
            return Decision::Limited { retry_after };
        }
        entry.count += 1;
        Decision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }
}

pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request, limiter.trust_proxy);
    match limiter.check(&client).await {
        Decision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("ratelimit-limit", HeaderValue::from(limiter.max_requests()));
            headers.insert("ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        Decision::Limited { retry_after } => {
            warn!("Rate limit exceeded for {}", client);
            ApiError::RateLimited { retry_after }.into_response()
        }
    }
}

fn client_key(request: &Request, trust_proxy: bool) -> String {
    trust_proxy
        .then(|| forwarded_ip(request.headers()))
        .flatten()
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("cf-connecting-ip")
        .or_else(|| headers.get("x-real-ip"))
        .or_else(|| headers.get("x-forwarded-for"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .filter(|s| !s.is_empty())
}
