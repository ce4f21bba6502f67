//! Handler functions for the cart.
//!
//! A guest gets a cart token cookie on the first add; until then there is
//! no cart to show or edit.

use axum::extract::{Form, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use minijinja::context;
use serde::Deserialize;

use crate::auth::middleware::{build_cookie, set_cookie, CART_COOKIE, GUEST_CART_MAX_AGE};
use crate::auth::Visitor;
use crate::errors::{AppError, AppResult};
use crate::services::cart::{self, CartOwner, CartView};
use crate::state::AppState;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub product_id: i64,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub product_id: i64,
}

async fn load_cart(state: &AppState, owner: Option<CartOwner>) -> AppResult<CartView> {
    match owner {
        Some(owner) => state.db.call(move |conn| cart::view(conn, &owner)).await,
        None => Ok(CartView::default()),
    }
}

/// Cart page with the error above it and a 422 status.
async fn rejected(state: &AppState, visitor: &Visitor, owner: Option<CartOwner>, err: AppError) -> AppResult<Response> {
    let cart = load_cart(state, owner).await?;
    let mut nav = visitor.nav();
    nav.cart_units = cart.unit_count;
    views::render_invalid("cart.html", &nav, &err.to_string(), context! { cart => cart })
}

pub async fn view(State(state): State<AppState>, visitor: Visitor) -> AppResult<Html<String>> {
    let cart = load_cart(&state, visitor.cart_owner()).await?;
    views::render("cart.html", &visitor.nav(), context! { cart => cart })
}

pub async fn add(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<LineForm>,
) -> AppResult<Response> {
    let (owner, minted) = match visitor.cart_owner() {
        Some(owner) => (owner, None),
        None => {
            let token = uuid::Uuid::new_v4().to_string();
            (CartOwner::Guest(token.clone()), Some(token))
        }
    };

    let target = owner.clone();
    let result = state
        .db
        .call(move |conn| cart::add_item(conn, &target, form.product_id, form.quantity))
        .await;

    match result {
        Ok(()) => {
            let mut response = Redirect::to("/cart").into_response();
            // A rejected add creates no cart, so the token is only handed out here.
            if let Some(token) = minted {
                set_cookie(
                    response.headers_mut(),
                    &build_cookie(CART_COOKIE, &token, GUEST_CART_MAX_AGE, state.config.session.secure_cookie),
                )?;
            }
            Ok(response)
        }
        Err(err) if err.is_validation() => rejected(&state, &visitor, Some(owner), err).await,
        Err(err) => Err(err),
    }
}

pub async fn update(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<LineForm>,
) -> AppResult<Response> {
    let Some(owner) = visitor.cart_owner() else {
        return Ok(Redirect::to("/cart").into_response());
    };
    let target = owner.clone();
    let result = state
        .db
        .call(move |conn| cart::update_item(conn, &target, form.product_id, form.quantity))
        .await;
    match result {
        Ok(()) => Ok(Redirect::to("/cart").into_response()),
        Err(err) if err.is_validation() => rejected(&state, &visitor, Some(owner), err).await,
        Err(err) => Err(err),
    }
}

pub async fn remove(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<RemoveForm>,
) -> AppResult<Redirect> {
    if let Some(owner) = visitor.cart_owner() {
        state
            .db
            .call(move |conn| cart::remove_item(conn, &owner, form.product_id))
            .await?;
    }
    Ok(Redirect::to("/cart"))
}
