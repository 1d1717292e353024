mod dto;
mod error;
mod handlers;
mod state;

pub use dto::{LocationSuggestion, PropertiesRequest, PropertyRow};
pub use error::{ApiError, ErrorBody};
pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/properties_data", post(handlers::properties_data))
        .route("/locations", get(handlers::locations))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
