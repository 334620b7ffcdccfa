//! # ib-api
//!
//! The web routing and orchestration layer for ita-board. Assembles the
//! middleware pipeline as an explicit, ordered list of stages around the
//! request handlers; all durable state lives behind the injected
//! `BoardStore`.

pub mod csrf;
pub mod handlers;
pub mod legacy;
pub mod middleware;

#[cfg(test)]
pub(crate) mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use configs::Settings;
use ib_core::traits::BoardStore;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::csrf::CsrfGuard;
use crate::middleware::RateLimiter;

/// State shared across all handlers. Constructed once in the binary and
/// cloned per request; everything inside is immutable or internally
/// synchronized.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BoardStore>,
    pub settings: Arc<Settings>,
    pub limiter: Arc<RateLimiter>,
    pub csrf: Arc<CsrfGuard>,
}

impl AppState {
    pub fn new(store: Arc<dyn BoardStore>, settings: Settings) -> Self {
        let limiter = Arc::new(RateLimiter::new(
            settings.rate_limit_max,
            Duration::from_secs(settings.rate_limit_window_secs),
        ));
        let csrf = Arc::new(CsrfGuard::new(&settings.csrf_secret));
        Self {
            store,
            settings: Arc::new(settings),
            limiter,
            csrf,
        }
    }
}

/// Builds the application router.
///
/// Stage order, outermost first: trace → request-id → CORS → rate
/// ceiling → security headers → routes. CSRF verification applies to the
/// `/api` subtree only, on non-GET methods.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/csrf-token", get(handlers::csrf_token))
        .route(
            "/threads",
            get(handlers::list_threads).post(handlers::create_thread),
        )
        .route(
            "/replies",
            get(handlers::list_replies).post(handlers::create_reply),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            csrf::protect,
        ));

    Router::new()
        .route("/", get(handlers::index))
        .nest("/api", api)
        .route("/subject.txt", get(legacy::subject_txt))
        .route("/SETTING.TXT", get(legacy::setting_txt))
        // `{file}` is matched last among root routes; the handler only
        // answers `{numeric_id}.dat` names.
        .route("/{file}", get(legacy::thread_dat))
        .nest_service("/static", ServeDir::new(&state.settings.static_dir))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ))
        .layer(middleware::cors_policy(&state.settings))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Convenience for binaries: the make-service with peer addresses
/// attached, so the rate ceiling can key by client IP.
pub fn into_service(
    router: Router,
) -> axum::extract::connect_info::IntoMakeServiceWithConnectInfo<Router, SocketAddr> {
    router.into_make_service_with_connect_info::<SocketAddr>()
}
