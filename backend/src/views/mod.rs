//! Server-side HTML rendering.
//!
//! Templates are compiled into the binary and loaded once into a shared
//! `minijinja` environment. Every page receives a `nav` value describing the
//! visitor (account, cart size, flagged observations) for the header.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use minijinja::{context, Environment, Value};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::database::models::User;
use crate::errors::AppResult;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("error.html", include_str!("../../templates/error.html")),
    ("products.html", include_str!("../../templates/products.html")),
    ("product.html", include_str!("../../templates/product.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("register.html", include_str!("../../templates/register.html")),
    ("cart.html", include_str!("../../templates/cart.html")),
    ("checkout.html", include_str!("../../templates/checkout.html")),
    ("confirmation.html", include_str!("../../templates/confirmation.html")),
    ("orders.html", include_str!("../../templates/orders.html")),
    ("order.html", include_str!("../../templates/order.html")),
    ("observed.html", include_str!("../../templates/observed.html")),
    ("seller_apply.html", include_str!("../../templates/seller_apply.html")),
    ("seller_products.html", include_str!("../../templates/seller_products.html")),
    ("product_form.html", include_str!("../../templates/product_form.html")),
    ("admin.html", include_str!("../../templates/admin.html")),
];

static ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_filter("money", money);
    for &(name, source) in TEMPLATES {
        if let Err(err) = env.add_template(name, source) {
            tracing::error!(template = name, error = %err, "template failed to compile");
        }
    }
    env
});

/// What the page header needs to know about the visitor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Nav {
    pub user: Option<User>,
    pub cart_units: i64,
    pub flagged: i64,
}

/// `1275` -> `$12.75`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

fn money(cents: i64) -> String {
    format_cents(cents)
}

pub fn render(name: &str, nav: &Nav, ctx: Value) -> AppResult<Html<String>> {
    let template = ENV.get_template(name)?;
    let page = template.render(context! { nav => nav, ..ctx })?;
    Ok(Html(page))
}

/// Re-render a form with its validation message and a 422 status.
pub fn render_invalid(name: &str, nav: &Nav, message: &str, ctx: Value) -> AppResult<Response> {
    let page = render(name, nav, context! { error => message, ..ctx })?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

pub fn render_error(status: StatusCode, message: &str) -> Result<String, minijinja::Error> {
    ENV.get_template("error.html")?.render(context! {
        nav => Nav::default(),
        status => status.as_u16(),
        reason => status.canonical_reason().unwrap_or("Error"),
        message => message,
    })
}
