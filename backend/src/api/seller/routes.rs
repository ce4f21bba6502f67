//! Defines the HTTP routes for seller onboarding and product management.

use axum::routing::get;
use axum::Router;

use super::handlers::{apply, apply_page, create, edit_page, new_page, products, update};
use crate::state::AppState;

pub fn seller_router() -> Router<AppState> {
    Router::new()
        .route("/seller/apply", get(apply_page).post(apply))
        .route("/seller/products", get(products))
        .route("/seller/products/new", get(new_page).post(create))
        .route("/seller/products/:id/edit", get(edit_page).post(update))
}
