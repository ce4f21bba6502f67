//! Defines the HTTP routes for order history.

use axum::routing::get;
use axum::Router;

use super::handlers::{detail, history};
use crate::state::AppState;

pub fn orders_router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(history))
        .route("/orders/:id", get(detail))
}
