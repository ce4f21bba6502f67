//! Defines the checkout route: the form on GET, order placement on POST.

use axum::routing::get;
use axum::Router;

use super::handlers::{checkout_page, place_order};
use crate::state::AppState;

pub fn checkout_router() -> Router<AppState> {
    Router::new().route("/checkout", get(checkout_page).post(place_order))
}
