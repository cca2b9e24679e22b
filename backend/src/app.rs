use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, middleware, state::AppState};

/// Assembles the `/api` router with auth, tracing, CORS and request-id layers.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/live-streams/active",
            get(handlers::live_streams::list_active_live_streams),
        )
        .route(
            "/api/live-streams/{id}",
            get(handlers::live_streams::get_live_stream),
        )
        .route(
            "/api/webhooks/mux",
            post(handlers::webhooks::receive_mux_event),
        );

    let user_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/live-streams",
            post(handlers::live_streams::create_live_stream),
        )
        .route(
            "/api/live-streams/my",
            get(handlers::live_streams::list_my_live_streams),
        )
        .route(
            "/api/live-streams/{id}",
            axum::routing::delete(handlers::live_streams::delete_live_stream),
        )
        .route(
            "/api/live-streams/{id}/activate",
            put(handlers::live_streams::activate_live_stream),
        )
        .route(
            "/api/live-streams/{id}/deactivate",
            put(handlers::live_streams::deactivate_live_stream),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ));

    let cors = cors_layer(&state.config.cors_allow_origins);

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(middleware::log_error_responses))
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(24 * 60 * 60))
}
