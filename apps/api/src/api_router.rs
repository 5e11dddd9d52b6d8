use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use smo_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{ACTOR_LOGIN_HEADER, ACTOR_NAME_HEADER};
use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(ACTOR_LOGIN_HEADER),
            HeaderName::from_static(ACTOR_NAME_HEADER),
        ]);

    let operation_routes = Router::new()
        .route(
            "/api/manifests",
            post(handlers::manifests::register_manifest_handler),
        )
        .route(
            "/api/manifests/{manifest_id}",
            put(handlers::manifests::edit_manifest_handler),
        )
        .route(
            "/api/manifests/{manifest_id}/cancel",
            post(handlers::manifests::cancel_manifest_handler),
        )
        .route(
            "/api/manifests/{manifest_id}/void",
            post(handlers::manifests::void_manifest_handler),
        )
        .route(
            "/api/manifests/{manifest_id}/deliver",
            post(handlers::manifests::deliver_manifest_handler),
        )
        .route(
            "/api/manifests/{manifest_id}/status",
            post(handlers::manifests::advance_manifest_handler),
        )
        .route_layer(from_fn(middleware::require_actor));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/api/board", get(handlers::board::board_handler))
        .route(
            "/api/manifests/{manifest_id}/history",
            get(handlers::board::manifest_history_handler),
        )
        .route(
            "/api/performance",
            get(handlers::performance::performance_report_handler),
        )
        .merge(operation_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}
