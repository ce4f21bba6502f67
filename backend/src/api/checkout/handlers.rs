//! Handler functions for checkout.

use axum::extract::{Form, State};
use axum::response::{IntoResponse, Redirect, Response};
use minijinja::context;

use crate::auth::Visitor;
use crate::errors::AppResult;
use crate::services::cart::{self, CartOwner, CartView};
use crate::services::checkout::{self, CheckoutForm};
use crate::state::AppState;
use crate::views;

async fn current_cart(state: &AppState, owner: &CartOwner) -> AppResult<CartView> {
    let owner = owner.clone();
    state.db.call(move |conn| cart::view(conn, &owner)).await
}

pub async fn checkout_page(State(state): State<AppState>, visitor: Visitor) -> AppResult<Response> {
    let Some(owner) = visitor.cart_owner() else {
        return Ok(Redirect::to("/cart").into_response());
    };
    let cart = current_cart(&state, &owner).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let form = CheckoutForm {
        full_name: visitor.user.as_ref().map(|u| u.name.clone()).unwrap_or_default(),
        payment_method: "card".to_string(),
        ..CheckoutForm::default()
    };
    let page = views::render("checkout.html", &visitor.nav(), context! { cart => cart, form => form })?;
    Ok(page.into_response())
}

pub async fn place_order(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<CheckoutForm>,
) -> AppResult<Response> {
    let Some(owner) = visitor.cart_owner() else {
        return Ok(Redirect::to("/cart").into_response());
    };

    match checkout::checkout(&state, owner.clone(), visitor.user.clone(), form.clone()).await {
        Ok(placed) => {
            let mut nav = visitor.nav();
            nav.cart_units = 0;
            let page = views::render("confirmation.html", &nav, context! { placed => placed })?;
            Ok(page.into_response())
        }
        Err(err) if err.is_validation() => {
            let cart = current_cart(&state, &owner).await?;
            if cart.is_empty() {
                return Ok(Redirect::to("/cart").into_response());
            }
            views::render_invalid(
                "checkout.html",
                &visitor.nav(),
                &err.to_string(),
                context! { cart => cart, form => form },
            )
        }
        Err(err) => Err(err),
    }
}
