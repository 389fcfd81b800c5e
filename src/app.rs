use crate::config::Config;
use crate::error::{ApiError, ErrorDetail, GENERIC_FAILURE};
use crate::rate_limit::{self, RateLimiter};
use crate::routes;
use crate::tmdb::{MovieProvider, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{Request, State},
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router, ServiceExt,
};
use serde_json::json;
use std::{any::Any, net::SocketAddr, path::PathBuf, sync::Arc};
use tower::Layer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};

const MAX_BODY_BYTES: usize = 100 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MovieProvider>,
    pub limiter: Arc<RateLimiter>,
    /// Hides 500 detail messages when set.
    pub production: bool,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &Config, provider: Arc<dyn MovieProvider>) -> Self {
        Self {
            provider,
            limiter: Arc::new(
                RateLimiter::new(config.rate_limit_max, config.rate_limit_window_secs)
                    .trusting_proxy(config.trust_proxy),
            ),
            production: config.production,
            static_dir: config.static_dir.clone(),
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let provider: Arc<dyn MovieProvider> = Arc::new(TmdbClient::from_config(&config));
    let state = AppState::new(&config, provider);
    info!(
        "Rate limit: {} requests per {}s per client",
        config.rate_limit_max, config.rate_limit_window_secs
    );
    if config.trust_proxy {
        info!("Rate limit keyed on forwarding headers (TRUST_PROXY)");
    }
    info!("Serving static files from {:?}", config.static_dir);
    if config.production {
        info!("Production mode: error details are hidden");
    }

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Movie Explorer API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

/// Layers run outermost first: trailing-slash trim, trace, CORS, body cap,
/// rate limit, error reporting, panic recovery, then routes with static files
/// as fallback.
pub fn build_router(state: AppState) -> NormalizePath<Router> {
    let static_files = ServeDir::new(&state.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(routes::not_found.into_service());

    let router = Router::new()
        .merge(routes::api_routes())
        .route("/health", get(health).fallback(routes::not_found))
        .fallback_service(static_files)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            report_server_errors,
        ))
        .layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit::enforce,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn(reject_oversized_body))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Routing happens inside the router, so the trim has to wrap it.
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

async fn health() -> &'static str {
    "OK"
}

/// Gives body-cap rejections the same JSON shape as every other error.
async fn reject_oversized_body(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge.into_response();
    }
    response
}

/// Logs server-side failures and, outside production, exposes their detail.
async fn report_server_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let mut response = next.run(request).await;
    let Some(ErrorDetail(message)) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };
    error!("{} {} failed: {}", method, uri.path(), message);
    if state.production {
        return response;
    }
    (
        response.status(),
        Json(json!({ "error": GENERIC_FAILURE, "message": message })),
    )
        .into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::Internal(detail).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
