//! Handlers for the order history pages.
//!
//! Users see their own orders; admins may open any order by id.

use axum::extract::{Path, State};
use axum::response::Html;
use minijinja::context;

use crate::auth::{CurrentUser, Visitor};
use crate::errors::AppResult;
use crate::services::orders;
use crate::state::AppState;
use crate::views;

pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    visitor: Visitor,
) -> AppResult<Html<String>> {
    let user_id = user.id;
    let list = state.db.call(move |conn| orders::history(conn, user_id)).await?;
    views::render("orders.html", &visitor.nav(), context! { orders => list })
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    visitor: Visitor,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    let detail = state
        .db
        .call(move |conn| orders::detail(conn, id, &user))
        .await?;
    views::render("order.html", &visitor.nav(), context! { detail => detail })
}
