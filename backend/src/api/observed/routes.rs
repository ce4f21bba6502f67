//! Defines the HTTP routes for the visitor's watched products.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{acknowledge, list};
use crate::state::AppState;

pub fn observed_router() -> Router<AppState> {
    Router::new()
        .route("/observed", get(list))
        .route("/observed/acknowledge", post(acknowledge))
}
