use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::server::AppState;

mod health;
mod invoke;
mod requests;

pub use invoke::{InvokeRequest, InvokeResponse};
pub use requests::{RequestLogEntry, RequestsQuery};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/llm/invoke", post(invoke::invoke))
        .route("/api/requests", get(requests::list_requests))
}
