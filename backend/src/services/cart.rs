//! Shopping cart rules.
//!
//! A cart belongs either to a logged-in user or to a guest token kept in a
//! cookie. Quantities are limited per line and by the product's stock.

use rusqlite::Connection;
use serde::Serialize;

use crate::database::models::{CartLine, ProductStatus};
use crate::database::queries::{carts, products};
use crate::errors::{AppError, AppResult};

pub const MAX_LINE_QUANTITY: i64 = 99;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    User(i64),
    Guest(String),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_cents: i64,
    pub unit_count: i64,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn from_lines(lines: Vec<CartLine>) -> AppResult<Self> {
        let total_cents = total_cents(&lines)?;
        let unit_count = lines.iter().map(|l| l.quantity).sum();
        Ok(Self {
            lines,
            total_cents,
            unit_count,
        })
    }
}

/// Sum of `unit price * quantity` over the lines, rejecting totals that do
/// not fit in an `i64`.
pub fn total_cents(lines: &[CartLine]) -> AppResult<i64> {
    lines.iter().try_fold(0i64, |total, line| {
        line.unit_price_cents
            .checked_mul(line.quantity)
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or_else(|| AppError::validation("The cart total is too large to process"))
    })
}

/// The owner's cart id; creates the cart when `create` is set.
pub fn cart_id(conn: &Connection, owner: &CartOwner, create: bool) -> AppResult<Option<i64>> {
    let id = match (owner, create) {
        (CartOwner::User(user_id), true) => Some(carts::get_or_create_for_user(conn, *user_id)?),
        (CartOwner::Guest(token), true) => Some(carts::get_or_create_for_guest(conn, token)?),
        (CartOwner::User(user_id), false) => carts::find_for_user(conn, *user_id)?.map(|c| c.id),
        (CartOwner::Guest(token), false) => carts::find_for_guest(conn, token)?.map(|c| c.id),
    };
    Ok(id)
}

fn check_line_quantity(conn: &Connection, product_id: i64, quantity: i64) -> AppResult<()> {
    let product = products::find(conn, product_id)?.ok_or(AppError::NotFound)?;
    if !product.is_purchasable() {
        return Err(AppError::validation(format!(
            "{} is currently not available",
            product.name
        )));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::validation(format!(
            "You can order at most {MAX_LINE_QUANTITY} of one product"
        )));
    }
    if quantity > product.stock {
        return Err(AppError::validation(format!(
            "Only {} of {} left in stock",
            product.stock, product.name
        )));
    }
    Ok(())
}

/// Add `quantity` units on top of what the cart already holds.
pub fn add_item(
    conn: &Connection,
    owner: &CartOwner,
    product_id: i64,
    quantity: i64,
) -> AppResult<()> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(AppError::validation(format!(
            "Quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )));
    }
    // The cart row is only created once the line is known to be valid.
    let existing = cart_id(conn, owner, false)?;
    let held = match existing {
        Some(cart) => carts::quantity_of(conn, cart, product_id)?,
        None => 0,
    };
    let combined = held + quantity;
    check_line_quantity(conn, product_id, combined)?;
    let cart = match existing {
        Some(cart) => cart,
        None => cart_id(conn, owner, true)?
            .ok_or_else(|| AppError::Internal("cart was not created".to_string()))?,
    };
    carts::set_quantity(conn, cart, product_id, combined)?;
    Ok(())
}

/// Set a line to `quantity`; zero removes it.
pub fn update_item(
    conn: &Connection,
    owner: &CartOwner,
    product_id: i64,
    quantity: i64,
) -> AppResult<()> {
    if quantity < 0 {
        return Err(AppError::validation("Quantity cannot be negative"));
    }
    let Some(cart) = cart_id(conn, owner, false)? else {
        return Ok(());
    };
    if quantity == 0 {
        carts::remove_item(conn, cart, product_id)?;
        return Ok(());
    }
    check_line_quantity(conn, product_id, quantity)?;
    carts::set_quantity(conn, cart, product_id, quantity)?;
    Ok(())
}

pub fn remove_item(conn: &Connection, owner: &CartOwner, product_id: i64) -> AppResult<()> {
    if let Some(cart) = cart_id(conn, owner, false)? {
        carts::remove_item(conn, cart, product_id)?;
    }
    Ok(())
}

pub fn view(conn: &Connection, owner: &CartOwner) -> AppResult<CartView> {
    match cart_id(conn, owner, false)? {
        Some(cart) => CartView::from_lines(carts::lines(conn, cart)?),
        None => Ok(CartView::default()),
    }
}

/// Move every line of the guest cart into the user's cart and delete the
/// guest cart. Summed quantities are capped at stock and the line limit;
/// lines for products that can no longer be bought are dropped. Returns the
/// number of lines carried over.
pub fn merge_guest_cart(conn: &mut Connection, guest_token: &str, user_id: i64) -> AppResult<usize> {
    let tx = conn.transaction()?;

    let Some(guest) = carts::find_for_guest(&tx, guest_token)? else {
        return Ok(0);
    };
    let guest_lines = carts::lines(&tx, guest.id)?;
    let user_cart = carts::get_or_create_for_user(&tx, user_id)?;

    let mut merged = 0;
    for line in guest_lines {
        if line.status != ProductStatus::Available || line.stock == 0 {
            continue;
        }
        let existing = carts::quantity_of(&tx, user_cart, line.product_id)?;
        let quantity = (existing + line.quantity)
            .min(line.stock)
            .min(MAX_LINE_QUANTITY);
        carts::set_quantity(&tx, user_cart, line.product_id, quantity)?;
        merged += 1;
    }
    carts::delete(&tx, guest.id)?;
    tx.commit()?;

    tracing::debug!(user_id, merged, "guest cart merged");
    Ok(merged)
}
