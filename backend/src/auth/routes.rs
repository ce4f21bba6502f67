//! Defines the HTTP routes specifically for authentication.
//!
//! These routes serve the registration and login forms and the logout
//! action. They are merged into the main Axum router.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{login, login_page, logout, register, register_page};
use crate::state::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}
