use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{
    handlers::{handle_resolve, handle_xmltv},
    state::AppState,
};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    // EPG dumps are far larger than axum's 2 MiB default
    let xmltv = post(handle_xmltv).layer(DefaultBodyLimit::max(state.max_body_bytes));

    Router::new()
        .route("/resolve", get(handle_resolve))
        .route("/xmltv", xmltv)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
