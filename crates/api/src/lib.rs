pub mod cookies;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth lifecycle
    let auth_routes = Router::new()
        .route("/login", get(routes::auth::login))
        .route("/callback", get(routes::auth::callback))
        .route("/logout", post(routes::auth::logout))
        .route("/me", get(routes::auth::me))
        .route("/env-info", get(routes::auth::env_info));

    // Drive proxy
    let file_routes = Router::new()
        .route("/", get(routes::files::list))
        .route("/download-multiple", post(routes::files::download_multiple))
        .route("/{id}", get(routes::files::get))
        .route("/{id}/content", get(routes::files::content));

    // Compose API
    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/files", file_routes)
        .route("/search", get(routes::search::search));

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
