//! Defines the HTTP routes for viewing and editing the cart.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{add, remove, update, view};
use crate::state::AppState;

pub fn cart_router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(view))
        .route("/cart/add", post(add))
        .route("/cart/update", post(update))
        .route("/cart/remove", post(remove))
}
