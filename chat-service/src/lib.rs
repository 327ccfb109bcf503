pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;

use axum::{
    http::{header, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ChatConfig;
use crate::services::{CapabilityService, Store};

#[derive(Clone)]
pub struct AppState {
    pub config: ChatConfig,
    pub store: Arc<dyn Store>,
    pub capabilities: CapabilityService,
    pub share_rate_limiter: IpRateLimiter,
}

pub fn build_router(state: AppState) -> Router {
    // Token redemption is unauthenticated, so it gets its own IP limiter.
    let redeem_route = Router::new()
        .route(
            &format!("{}/:token", handlers::SHARE_PATH_PREFIX),
            get(handlers::redeem_shared_chat),
        )
        .layer(from_fn_with_state(
            state.share_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let api_routes = Router::new()
        .route(
            "/api/v1/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/v1/users/:user_id",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route(
            "/api/v1/users/:user_id/chats",
            get(handlers::list_chats).post(handlers::create_chat),
        )
        .route(
            "/api/v1/users/:user_id/chats/:chat_id",
            get(handlers::get_chat)
                .patch(handlers::update_chat)
                .delete(handlers::delete_chat),
        )
        .route(
            "/api/v1/users/:user_id/chats/:chat_id/share",
            post(handlers::share_chat),
        )
        .merge(redeem_route);

    let cors = cors_layer(&state.config.security.allowed_origins);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .merge(api_routes)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                // The matched route, not the URI: share tokens must stay out of logs.
                let route = request
                    .extensions()
                    .get::<axum::extract::MatchedPath>()
                    .map(|path| path.as_str())
                    .unwrap_or("unmatched");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    route = %route,
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}
