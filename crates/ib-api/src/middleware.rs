//! # ib-api Middleware
//!
//! The explicit request-processing stages applied ahead of the handlers:
//! CORS policy, per-client rate ceiling, and the security-header pass.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use configs::Settings;
use dashmap::DashMap;
use ib_core::error::AppError;
use tower_http::cors::CorsLayer;

use crate::handlers::ApiError;
use crate::AppState;

/// Fixed-window request counter keyed by client address. Windows reset
/// lazily on the first hit after expiry; the map is pruned when it grows
/// past a bound so idle addresses do not accumulate forever.
pub struct RateLimiter {
    windows: DashMap<IpAddr, Window>,
    max: u32,
    window: Duration,
}

struct Window {
    started: Instant,
    count: u32,
}

const PRUNE_THRESHOLD: usize = 10_000;

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max,
            window,
        }
    }

    /// Records one hit for `ip` and reports whether it is still within
    /// the ceiling.
    pub fn check(&self, ip: IpAddr) -> bool {
        if self.windows.len() > PRUNE_THRESHOLD {
            let window = self.window;
            self.windows.retain(|_, w| w.started.elapsed() < window);
        }

        let mut entry = self.windows.entry(ip).or_insert_with(|| Window {
            started: Instant::now(),
            count: 0,
        });
        if entry.started.elapsed() >= self.window {
            entry.started = Instant::now();
            entry.count = 0;
        }
        entry.count += 1;
        entry.count <= self.max
    }
}

/// Rate-ceiling stage: rejects over-limit clients before any handler
/// runs. The rejection body is plain text so legacy readers can parse
/// it too.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    if !state.limiter.check(ip) {
        return ApiError(AppError::RateLimitExceeded(ip.to_string())).into_response();
    }
    next.run(request).await
}

/// The client address a request is attributed to: the first
/// `X-Forwarded-For` hop when present (the deployment sits behind a
/// proxy), otherwise the peer address.
pub fn client_ip(request: &Request) -> IpAddr {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse() {
                return ip;
            }
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// CORS: a single configured origin with credentials, GET/POST only,
/// and the anti-forgery header allowed through.
pub fn cors_policy(settings: &Settings) -> CorsLayer {
    let origin = settings
        .allowed_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
}

// Restrictive default-source policy with explicit allowances for the
// inline handlers the client uses, the one external script host, and
// the datastore's realtime endpoints.
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' 'unsafe-eval' https://unpkg.com; \
    script-src-elem 'self' https://unpkg.com; \
    script-src-attr 'unsafe-inline'; \
    style-src 'self' 'unsafe-inline'; \
    img-src 'self' data: https:; \
    connect-src 'self' https://*.supabase.co wss://*.supabase.co; \
    font-src 'self' data: https:; \
    object-src 'none'; \
    media-src 'self'; \
    frame-src 'none'; \
    base-uri 'self'; \
    form-action 'self'";

/// Security-header stage applied to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("cross-origin"),
    );
    response
}
