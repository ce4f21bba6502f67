//! Handler functions for the admin area. Every route requires `AdminUser`.

use axum::extract::{Form, Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use minijinja::context;
use serde::Deserialize;

use crate::auth::{AdminUser, Visitor};
use crate::database::models::{OrderStatus, SellerStatus};
use crate::errors::{AppError, AppResult};
use crate::services::{dashboard as stats, orders, sellers};
use crate::state::AppState;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

pub async fn dashboard(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    visitor: Visitor,
) -> AppResult<Html<String>> {
    let dashboard = state.db.call(|conn| stats::load(conn)).await?;
    views::render("admin.html", &visitor.nav(), context! { dashboard => dashboard })
}

/// Dashboard with an error message, for rejected admin actions.
async fn rejected(state: &AppState, visitor: &Visitor, err: AppError) -> AppResult<Response> {
    let dashboard = state.db.call(|conn| stats::load(conn)).await?;
    views::render_invalid("admin.html", &visitor.nav(), &err.to_string(), context! { dashboard => dashboard })
}

async fn decide(
    state: AppState,
    admin: AdminUser,
    visitor: Visitor,
    user_id: i64,
    status: SellerStatus,
) -> AppResult<Response> {
    match sellers::decide_and_notify(&state, user_id, status).await {
        Ok(()) => {
            tracing::info!(admin_id = admin.0.id, user_id, decision = %status, "seller decision recorded");
            Ok(Redirect::to("/admin").into_response())
        }
        Err(err) if err.is_validation() => rejected(&state, &visitor, err).await,
        Err(err) => Err(err),
    }
}

pub async fn approve_seller(
    State(state): State<AppState>,
    admin: AdminUser,
    visitor: Visitor,
    Path(user_id): Path<i64>,
) -> AppResult<Response> {
    decide(state, admin, visitor, user_id, SellerStatus::Approved).await
}

pub async fn reject_seller(
    State(state): State<AppState>,
    admin: AdminUser,
    visitor: Visitor,
    Path(user_id): Path<i64>,
) -> AppResult<Response> {
    decide(state, admin, visitor, user_id, SellerStatus::Rejected).await
}

pub async fn set_order_status(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    visitor: Visitor,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> AppResult<Response> {
    let result = match OrderStatus::parse(form.status.trim()) {
        Some(next) => state
            .db
            .call(move |conn| orders::set_status(conn, id, next))
            .await
            .map(|_| ()),
        None => Err(AppError::validation(format!("Unknown order status {:?}", form.status))),
    };
    match result {
        Ok(()) => Ok(Redirect::to("/admin").into_response()),
        Err(err) if err.is_validation() => rejected(&state, &visitor, err).await,
        Err(err) => Err(err),
    }
}
