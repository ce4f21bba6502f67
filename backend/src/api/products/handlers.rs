//! Handler functions for the catalog.

use axum::extract::{Form, Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use minijinja::context;

use crate::auth::{CurrentUser, Visitor};
use crate::errors::AppResult;
use crate::services::catalog::{self, ListingQuery, ReviewForm};
use crate::state::AppState;
use crate::views;

pub async fn listing(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<ListingQuery>,
) -> AppResult<Html<String>> {
    let page_size = i64::from(state.config.catalog.page_size);
    let listing = state
        .db
        .call(move |conn| catalog::listing(conn, &query, page_size))
        .await?;
    views::render("products.html", &visitor.nav(), context! { listing => listing })
}

pub async fn detail(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    let viewer = visitor.user_id();
    let detail = state
        .db
        .call(move |conn| catalog::detail(conn, id, viewer))
        .await?;
    views::render("product.html", &visitor.nav(), context! { detail => detail })
}

pub async fn review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    visitor: Visitor,
    Path(id): Path<i64>,
    Form(form): Form<ReviewForm>,
) -> AppResult<Response> {
    let user_id = user.id;
    let result = state
        .db
        .call(move |conn| catalog::submit_review(conn, id, user_id, &form))
        .await;
    match result {
        Ok(()) => Ok(Redirect::to(&format!("/products/{id}")).into_response()),
        Err(err) if err.is_validation() => {
            let viewer = visitor.user_id();
            let detail = state
                .db
                .call(move |conn| catalog::detail(conn, id, viewer))
                .await?;
            views::render_invalid(
                "product.html",
                &visitor.nav(),
                &err.to_string(),
                context! { detail => detail },
            )
        }
        Err(err) => Err(err),
    }
}

pub async fn observe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    let user_id = user.id;
    state
        .db
        .call(move |conn| catalog::observe(conn, user_id, id))
        .await?;
    tracing::debug!(user_id, product_id = id, "watching price");
    Ok(Redirect::to(&format!("/products/{id}")))
}

pub async fn unobserve(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    let user_id = user.id;
    state
        .db
        .call(move |conn| catalog::unobserve(conn, user_id, id))
        .await?;
    Ok(Redirect::to(&format!("/products/{id}")))
}
