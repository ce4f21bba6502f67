//! Defines the HTTP routes for the admin dashboard.
//!
//! Seller decisions and order status changes are plain form posts that
//! redirect back to `/admin`.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{approve_seller, dashboard, reject_seller, set_order_status};
use crate::state::AppState;

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/sellers/:user_id/approve", post(approve_seller))
        .route("/admin/sellers/:user_id/reject", post(reject_seller))
        .route("/admin/orders/:id/status", post(set_order_status))
}
