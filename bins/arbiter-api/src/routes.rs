use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/execute", post(handlers::execute))
        .route("/execute/fallback", post(handlers::execute_fallback))
        .route("/grade", post(handlers::grade))
        .route("/health", get(handlers::health_check))
        .route("/languages", get(handlers::list_languages))
}
