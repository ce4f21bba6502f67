//! Handlers for listing watched products and acknowledging price changes.

use axum::extract::State;
use axum::response::{Html, Redirect};
use minijinja::context;

use crate::auth::{CurrentUser, Visitor};
use crate::errors::AppResult;
use crate::services::catalog;
use crate::state::AppState;
use crate::views;

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    visitor: Visitor,
) -> AppResult<Html<String>> {
    let user_id = user.id;
    let observations = state
        .db
        .call(move |conn| catalog::observed(conn, user_id))
        .await?;
    views::render("observed.html", &visitor.nav(), context! { observations => observations })
}

pub async fn acknowledge(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Redirect> {
    let user_id = user.id;
    let cleared = state
        .db
        .call(move |conn| catalog::acknowledge(conn, user_id))
        .await?;
    tracing::debug!(user_id, cleared, "price changes acknowledged");
    Ok(Redirect::to("/observed"))
}
