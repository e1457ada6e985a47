pub mod config;
pub mod data_uri;
pub mod demo;
pub mod error;
pub mod flows;
pub mod gemini;
pub mod history;
pub mod model;
pub mod models;
pub mod orchestrator;
pub mod routes;

#[cfg(test)]
mod testing;

use axum::{routing::{get, post}, Router};
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};

pub use routes::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/fuse", post(routes::fuse))
        .route("/api/poster", post(routes::generate_poster))
        .route("/api/history", get(routes::list_history).delete(routes::clear_history))
        .route("/api/history/:id", get(routes::get_history_entry))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
