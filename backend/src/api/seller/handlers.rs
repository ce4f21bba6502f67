//! Handler functions for sellers.
//!
//! Any logged-in customer may apply; the product pages require an approved
//! seller (or an admin, who may edit every product).

use axum::extract::{Form, Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use minijinja::context;

use crate::auth::{CurrentUser, SellerUser, Visitor};
use crate::database::queries::sellers as seller_profiles;
use crate::errors::AppResult;
use crate::services::sellers::{self, ApplicationForm, ProductForm};
use crate::state::AppState;
use crate::views;

pub async fn apply_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    visitor: Visitor,
) -> AppResult<Html<String>> {
    let user_id = user.id;
    let profile = state
        .db
        .call(move |conn| Ok(seller_profiles::find(conn, user_id)?))
        .await?;
    views::render(
        "seller_apply.html",
        &visitor.nav(),
        context! { profile => profile, form => ApplicationForm::default() },
    )
}

pub async fn apply(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    visitor: Visitor,
    Form(form): Form<ApplicationForm>,
) -> AppResult<Response> {
    let user_id = user.id;
    let submitted = form.clone();
    let result = state
        .db
        .call(move |conn| sellers::apply(conn, &user, &submitted))
        .await;
    match result {
        Ok(profile) => {
            tracing::info!(user_id, shop = %profile.shop_name, "seller application submitted");
            Ok(Redirect::to("/seller/apply").into_response())
        }
        Err(err) if err.is_validation() => {
            let profile = state
                .db
                .call(move |conn| Ok(seller_profiles::find(conn, user_id)?))
                .await?;
            views::render_invalid(
                "seller_apply.html",
                &visitor.nav(),
                &err.to_string(),
                context! { profile => profile, form => form },
            )
        }
        Err(err) => Err(err),
    }
}

pub async fn products(
    State(state): State<AppState>,
    SellerUser(seller): SellerUser,
    visitor: Visitor,
) -> AppResult<Html<String>> {
    let list = state
        .db
        .call(move |conn| sellers::own_products(conn, &seller))
        .await?;
    views::render("seller_products.html", &visitor.nav(), context! { products => list })
}

pub async fn new_page(SellerUser(_): SellerUser, visitor: Visitor) -> AppResult<Html<String>> {
    let form = ProductForm {
        stock: "1".to_string(),
        ..ProductForm::default()
    };
    views::render("product_form.html", &visitor.nav(), context! { form => form })
}

pub async fn create(
    State(state): State<AppState>,
    SellerUser(seller): SellerUser,
    visitor: Visitor,
    Form(form): Form<ProductForm>,
) -> AppResult<Response> {
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(err) if err.is_validation() => {
            return views::render_invalid(
                "product_form.html",
                &visitor.nav(),
                &err.to_string(),
                context! { form => form },
            );
        }
        Err(err) => return Err(err),
    };
    state
        .db
        .call(move |conn| sellers::create_product(conn, &seller, &draft))
        .await?;
    Ok(Redirect::to("/seller/products").into_response())
}

pub async fn edit_page(
    State(state): State<AppState>,
    SellerUser(seller): SellerUser,
    visitor: Visitor,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    let product = state
        .db
        .call(move |conn| sellers::editable_product(conn, &seller, id))
        .await?;
    views::render(
        "product_form.html",
        &visitor.nav(),
        context! { product_id => id, form => ProductForm::from_product(&product) },
    )
}

pub async fn update(
    State(state): State<AppState>,
    SellerUser(seller): SellerUser,
    visitor: Visitor,
    Path(id): Path<i64>,
    Form(form): Form<ProductForm>,
) -> AppResult<Response> {
    let result = match form.validate() {
        Ok(draft) => sellers::update_and_notify(&state, seller, id, draft).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => Ok(Redirect::to("/seller/products").into_response()),
        Err(err) if err.is_validation() => views::render_invalid(
            "product_form.html",
            &visitor.nav(),
            &err.to_string(),
            context! { product_id => id, form => form },
        ),
        Err(err) => Err(err),
    }
}
