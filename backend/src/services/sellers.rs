//! Seller onboarding and seller-side product management.
//!
//! A customer applies with a shop name, an admin approves or rejects the
//! application, and approved sellers maintain their own products. Editing a
//! product's price re-evaluates every observation of it; observers whose
//! flag newly turns on are emailed after the change is committed.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::notifications;
use crate::database::models::{
    Observer, Product, ProductDraft, ProductStatus, Role, SellerProfile, SellerStatus, User,
};
use crate::database::queries::{observations, products, sellers, users};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub const SHOP_NAME_LEN: std::ops::RangeInclusive<usize> = 3..=60;
pub const MAX_PRODUCT_NAME_LEN: usize = 120;
/// Highest accepted product price: $1,000,000.00.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApplicationForm {
    pub shop_name: String,
    #[serde(default)]
    pub description: String,
}

/// Open (or reopen) a seller application for a customer.
pub fn apply(conn: &Connection, user: &User, form: &ApplicationForm) -> AppResult<SellerProfile> {
    if user.role != Role::Customer {
        return Err(AppError::validation("Your account already has seller access"));
    }
    let shop_name = form.shop_name.trim();
    if !SHOP_NAME_LEN.contains(&shop_name.chars().count()) {
        return Err(AppError::validation(format!(
            "Shop names must be {} to {} characters long",
            SHOP_NAME_LEN.start(),
            SHOP_NAME_LEN.end()
        )));
    }
    if let Some(existing) = sellers::find(conn, user.id)? {
        if existing.status == SellerStatus::Pending {
            return Err(AppError::validation("Your application is already being reviewed"));
        }
    }
    if sellers::shop_name_taken(conn, shop_name, user.id)? {
        return Err(AppError::validation("That shop name is already taken"));
    }

    sellers::upsert_application(conn, user.id, shop_name, form.description.trim())?;
    sellers::find(conn, user.id)?
        .ok_or_else(|| AppError::Internal("seller application vanished".to_string()))
}

/// Record the admin's decision. Approval promotes the account to seller.
/// Returns the applicant's email and shop name for the notification.
pub fn decide(conn: &mut Connection, user_id: i64, status: SellerStatus) -> AppResult<(String, String)> {
    let tx = conn.transaction()?;
    let profile = sellers::find(&tx, user_id)?.ok_or(AppError::NotFound)?;
    if profile.status != SellerStatus::Pending {
        return Err(AppError::validation(format!(
            "This application was already {}",
            profile.status
        )));
    }
    let user = users::find_by_id(&tx, user_id)?.ok_or(AppError::NotFound)?;

    sellers::set_status(&tx, user_id, status)?;
    if status == SellerStatus::Approved && user.role == Role::Customer {
        users::set_role(&tx, user_id, Role::Seller)?;
    }
    tx.commit()?;

    tracing::info!(user_id, decision = %status, "seller application decided");
    Ok((user.email, profile.shop_name))
}

/// Decide and notify the applicant best-effort.
pub async fn decide_and_notify(state: &AppState, user_id: i64, status: SellerStatus) -> AppResult<()> {
    let (email, shop_name) = state
        .db
        .call(move |conn| decide(conn, user_id, status))
        .await?;
    let mail = notifications::seller_decision(&email, &shop_name, status);
    notifications::deliver(state.mailer.as_ref(), mail).await;
    Ok(())
}

/// Product editor form. Prices are typed as decimal amounts.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub price: String,
    pub stock: String,
    #[serde(default)]
    pub archived: Option<String>,
}

impl ProductForm {
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            price: format!("{}.{:02}", product.price_cents / 100, product.price_cents % 100),
            stock: product.stock.to_string(),
            archived: (product.status == ProductStatus::Archived)
                .then(|| "on".to_string()),
        }
    }

    pub fn validate(&self) -> AppResult<ProductDraft> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > MAX_PRODUCT_NAME_LEN {
            return Err(AppError::validation(format!(
                "Product names must be 1 to {MAX_PRODUCT_NAME_LEN} characters long"
            )));
        }
        let price_cents = parse_price(&self.price)
            .ok_or_else(|| AppError::validation("Enter the price as an amount like 12.50"))?;
        if price_cents > MAX_PRICE_CENTS {
            return Err(AppError::validation("Prices above $1,000,000.00 are not accepted"));
        }
        let stock: i64 = self
            .stock
            .trim()
            .parse()
            .ok()
            .filter(|s| *s >= 0)
            .ok_or_else(|| AppError::validation("Stock must be a whole number of zero or more"))?;

        Ok(ProductDraft {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_lowercase(),
            price_cents,
            stock,
            archived: self.archived.is_some(),
        })
    }
}

/// Parse `12`, `12.5` or `12.50` into cents.
pub fn parse_price(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (whole, frac) = match raw.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (raw, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    whole.checked_mul(100)?.checked_add(frac)
}

/// Products a seller may manage; admins manage all of them.
pub fn editable_product(conn: &Connection, editor: &User, id: i64) -> AppResult<Product> {
    let product = products::find(conn, id)?.ok_or(AppError::NotFound)?;
    if editor.role == Role::Admin || product.seller_id == Some(editor.id) {
        Ok(product)
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn own_products(conn: &Connection, seller: &User) -> AppResult<Vec<Product>> {
    Ok(products::list_by_seller(conn, seller.id)?)
}

pub fn create_product(conn: &Connection, seller: &User, draft: &ProductDraft) -> AppResult<i64> {
    let id = products::insert(conn, Some(seller.id), draft)?;
    tracing::info!(product_id = id, seller_id = seller.id, "product listed");
    Ok(id)
}

/// Save the draft and refresh observation flags when the price moved.
/// Returns the observers whose flag was newly raised.
pub fn update_product(
    conn: &mut Connection,
    editor: &User,
    id: i64,
    draft: &ProductDraft,
) -> AppResult<Vec<Observer>> {
    let tx = conn.transaction()?;
    let before = editable_product(&tx, editor, id)?;

    let mut notify = Vec::new();
    if before.price_cents != draft.price_cents {
        notify = observations::unflagged_observers(&tx, id, draft.price_cents)?;
        observations::refresh_flags(&tx, id, draft.price_cents)?;
    }
    products::update(&tx, id, draft)?;
    tx.commit()?;

    if before.price_cents != draft.price_cents {
        tracing::info!(
            product_id = id,
            old_price_cents = before.price_cents,
            new_price_cents = draft.price_cents,
            flagged = notify.len(),
            "product price changed"
        );
    }
    Ok(notify)
}

/// Update the product, then email newly affected observers best-effort.
pub async fn update_and_notify(
    state: &AppState,
    editor: User,
    id: i64,
    draft: ProductDraft,
) -> AppResult<()> {
    let name = draft.name.clone();
    let price_cents = draft.price_cents;
    let observers = state
        .db
        .call(move |conn| update_product(conn, &editor, id, &draft))
        .await?;

    for observer in &observers {
        let mail = notifications::price_change(observer, &name, price_cents);
        notifications::deliver(state.mailer.as_ref(), mail).await;
    }
    Ok(())
}
