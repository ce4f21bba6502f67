//! Handler functions for the authentication pages.
//!
//! These functions render the login and registration forms, validate what
//! the visitor posts, and hand the work to `auth::service`. A successful
//! login or registration sets the session cookie and drops the guest cart
//! cookie, because the guest cart was merged into the account.

use axum::extract::{Form, State};
use axum::response::{IntoResponse, Redirect, Response};
use minijinja::context;

use super::middleware::{build_cookie, expire_cookie, set_cookie, Visitor, CART_COOKIE, SESSION_COOKIE};
use super::models::{LoginForm, RegisterForm};
use super::service;
use crate::database::models::User;
use crate::errors::AppResult;
use crate::state::AppState;
use crate::views;

pub async fn register_page(visitor: Visitor) -> AppResult<Response> {
    if visitor.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let page = views::render("register.html", &visitor.nav(), context! { form => RegisterForm::default() })?;
    Ok(page.into_response())
}

pub async fn register(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let result = match form.validate() {
        Ok(account) => service::register(&state.db, account).await,
        Err(err) => Err(err.into()),
    };
    match result {
        Ok(user) => log_in(&state, &visitor, &user).await,
        Err(err) if err.is_validation() => views::render_invalid(
            "register.html",
            &visitor.nav(),
            &err.to_string(),
            context! { form => form },
        ),
        Err(err) => Err(err),
    }
}

pub async fn login_page(visitor: Visitor) -> AppResult<Response> {
    if visitor.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let page = views::render("login.html", &visitor.nav(), context! { form => LoginForm::default() })?;
    Ok(page.into_response())
}

pub async fn login(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    match service::authenticate(&state.db, &form.email, form.password.clone()).await {
        Ok(user) => log_in(&state, &visitor, &user).await,
        Err(err) if err.is_validation() => {
            tracing::debug!("failed login");
            views::render_invalid("login.html", &visitor.nav(), &err.to_string(), context! { form => form })
        }
        Err(err) => Err(err),
    }
}

/// Open a session, merge the guest cart and redirect home.
async fn log_in(state: &AppState, visitor: &Visitor, user: &User) -> AppResult<Response> {
    let ttl = state.config.session_ttl();
    let token = service::start_session(&state.db, user.id, ttl, visitor.guest_token.clone()).await?;
    tracing::info!(user_id = user.id, "logged in");

    let mut response = Redirect::to("/").into_response();
    let headers = response.headers_mut();
    set_cookie(
        headers,
        &build_cookie(SESSION_COOKIE, &token, ttl.as_secs(), state.config.session.secure_cookie),
    )?;
    if visitor.guest_token.is_some() {
        set_cookie(headers, &expire_cookie(CART_COOKIE))?;
    }
    Ok(response)
}

pub async fn logout(State(state): State<AppState>, visitor: Visitor) -> AppResult<Response> {
    if let Some(token) = visitor.session_token {
        service::end_session(&state.db, token).await?;
    }
    let mut response = Redirect::to("/").into_response();
    set_cookie(response.headers_mut(), &expire_cookie(SESSION_COOKIE))?;
    Ok(response)
}
