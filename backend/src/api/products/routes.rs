//! Defines the HTTP routes for the public catalog.
//!
//! Listing and detail pages are open to everyone; reviews and watching
//! require a logged-in user.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{detail, listing, observe, review, unobserve};
use crate::state::AppState;

pub fn products_router() -> Router<AppState> {
    Router::new()
        .route("/", get(listing))
        .route("/products", get(listing))
        .route("/products/:id", get(detail))
        .route("/products/:id/reviews", post(review))
        .route("/products/:id/observe", post(observe))
        .route("/products/:id/unobserve", post(unobserve))
}
