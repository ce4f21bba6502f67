//! Checkout: turning a cart into an order.
//!
//! The order is written in one transaction: address, payment, order row,
//! order items, stock reservation and cart cleanup either all happen or none
//! do. The confirmation email is sent after commit and may fail silently.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::cart::{self, CartOwner};
use super::notifications;
use crate::auth::models::normalize_email;
use crate::database::models::{
    Address, CartLine, NewAddress, NewPayment, Order, PaymentMethod, User,
};
use crate::database::queries::{addresses, carts, orders, payments, products};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Raw checkout form as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckoutForm {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub email: String,
    pub payment_method: String,
    #[serde(default)]
    pub card_holder: String,
    #[serde(default, skip_serializing)]
    pub card_number: String,
}

/// Checkout data that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedCheckout {
    pub email: String,
    pub address: NewAddress,
    pub method: PaymentMethod,
    pub card_holder: Option<String>,
    pub card_last4: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub lines: Vec<CartLine>,
    pub address: Address,
}

/// Luhn checksum over a string of ASCII digits.
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (i, ch) in digits.chars().rev().enumerate() {
        let Some(mut d) = ch.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    !digits.is_empty() && sum % 10 == 0
}

fn required(value: &str, label: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::validation(format!("{label} is required")))
    } else {
        Ok(value.to_string())
    }
}

impl CheckoutForm {
    /// Validate against the visitor: guests must give an email, logged-in
    /// users always use their account email.
    pub fn validate(&self, user: Option<&User>) -> AppResult<ValidatedCheckout> {
        let address = NewAddress {
            user_id: user.map(|u| u.id),
            full_name: required(&self.full_name, "Full name")?,
            street: required(&self.street, "Street")?,
            city: required(&self.city, "City")?,
            postal_code: required(&self.postal_code, "Postal code")?,
            country: required(&self.country, "Country")?,
        };

        let email = match user {
            Some(user) => user.email.clone(),
            None => normalize_email(&self.email)
                .map_err(|_| AppError::validation("A valid email address is required"))?,
        };

        let method = PaymentMethod::parse(self.payment_method.trim())
            .ok_or_else(|| AppError::validation("Please choose a payment method"))?;

        let (card_holder, card_last4) = if method == PaymentMethod::Card {
            let holder = required(&self.card_holder, "Card holder")?;
            let digits: String = self
                .card_number
                .chars()
                .filter(|c| !matches!(c, ' ' | '-'))
                .collect();
            if !(12..=19).contains(&digits.len()) || !luhn_valid(&digits) {
                return Err(AppError::validation("The card number is not valid"));
            }
            (Some(holder), Some(digits[digits.len() - 4..].to_string()))
        } else {
            (None, None)
        };

        Ok(ValidatedCheckout {
            email,
            address,
            method,
            card_holder,
            card_last4,
        })
    }
}

/// Write the order for the owner's cart in a single transaction.
pub fn place_order(
    conn: &mut Connection,
    owner: &CartOwner,
    checkout: &ValidatedCheckout,
) -> AppResult<PlacedOrder> {
    let tx = conn.transaction()?;

    let cart_id = cart::cart_id(&tx, owner, false)?
        .ok_or_else(|| AppError::validation("Your cart is empty"))?;
    let lines = carts::lines(&tx, cart_id)?;
    if lines.is_empty() {
        return Err(AppError::validation("Your cart is empty"));
    }
    let total_cents = cart::total_cents(&lines)?;

    let address_id = addresses::insert(&tx, &checkout.address)?;
    let payment_id = payments::insert(
        &tx,
        &NewPayment {
            method: checkout.method,
            card_holder: checkout.card_holder.clone(),
            card_last4: checkout.card_last4.clone(),
            amount_cents: total_cents,
        },
    )?;
    let order_id = orders::insert(
        &tx,
        checkout.address.user_id,
        &checkout.email,
        address_id,
        payment_id,
        total_cents,
    )?;

    for line in &lines {
        if !products::reserve_stock(&tx, line.product_id, line.quantity)? {
            // Dropping `tx` rolls back everything written above.
            return Err(AppError::validation(format!(
                "Sorry, {} no longer has {} in stock",
                line.name, line.quantity
            )));
        }
        orders::insert_item(&tx, order_id, line)?;
    }
    carts::clear(&tx, cart_id)?;

    let order = orders::find(&tx, order_id)?
        .ok_or_else(|| AppError::Internal("order vanished inside its transaction".to_string()))?;
    let address = addresses::find(&tx, address_id)?
        .ok_or_else(|| AppError::Internal("address vanished inside its transaction".to_string()))?;
    tx.commit()?;

    Ok(PlacedOrder {
        order,
        lines,
        address,
    })
}

/// Validate, place the order, then send the confirmation email best-effort.
pub async fn checkout(
    state: &AppState,
    owner: CartOwner,
    user: Option<User>,
    form: CheckoutForm,
) -> AppResult<PlacedOrder> {
    let validated = form.validate(user.as_ref())?;
    let placed = state
        .db
        .call(move |conn| place_order(conn, &owner, &validated))
        .await?;

    tracing::info!(
        order_id = placed.order.id,
        total_cents = placed.order.total_cents,
        guest = placed.order.user_id.is_none(),
        "order placed"
    );

    let mail = notifications::order_confirmation(&placed.order, &placed.lines);
    notifications::deliver(state.mailer.as_ref(), mail).await;
    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::models::{OrderStatus, ProductStatus, Role};
    use crate::database::queries::{fixtures, users};
    use crate::database::Database;
    use adapters::MemoryMailer;
    use std::sync::Arc;

    fn form() -> CheckoutForm {
        CheckoutForm {
            full_name: "Ann Example".into(),
            street: "1 Main St".into(),
            city: "Springfield".into(),
            postal_code: "12345".into(),
            country: "US".into(),
            email: "Guest@Example.com".into(),
            payment_method: "card".into(),
            card_holder: "Ann Example".into(),
            card_number: "4242 4242 4242 4242".into(),
        }
    }

    fn guest() -> CartOwner {
        CartOwner::Guest("guest-1".into())
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4242424242424242"));
        assert!(luhn_valid("79927398713"));
        assert!(!luhn_valid("4242424242424241"));
        assert!(!luhn_valid("42424242x4242424"));
        assert!(!luhn_valid(""));
    }

    #[test]
    fn test_validate_card_keeps_last_four() {
        let checkout = form().validate(None).unwrap();
        assert_eq!(checkout.email, "guest@example.com");
        assert_eq!(checkout.card_last4.as_deref(), Some("4242"));
        assert_eq!(checkout.method, PaymentMethod::Card);
    }

    #[test]
    fn test_validate_rejections() {
        let mut f = form();
        f.email = String::new();
        assert!(f.validate(None).is_err());

        let mut f = form();
        f.card_number = "4242 4242 4242 4241".into();
        assert!(f.validate(None).is_err());

        let mut f = form();
        f.city = "  ".into();
        assert!(matches!(f.validate(None), Err(AppError::Validation(m)) if m == "City is required"));

        let mut f = form();
        f.payment_method = "barter".into();
        assert!(f.validate(None).is_err());
    }

    #[test]
    fn test_logged_in_user_email_wins() {
        let conn = fixtures::conn();
        let id = fixtures::user(&conn, "member@example.com", Role::Customer);
        let user = users::find_by_id(&conn, id).unwrap().unwrap();
        let mut f = form();
        f.email = String::new();
        f.payment_method = "invoice".into();
        f.card_number = String::new();
        let checkout = f.validate(Some(&user)).unwrap();
        assert_eq!(checkout.email, "member@example.com");
        assert_eq!(checkout.address.user_id, Some(id));
        assert!(checkout.card_last4.is_none());
    }

    #[test]
    fn test_place_order_writes_everything() {
        let mut conn = fixtures::conn();
        let kite = fixtures::product(&conn, "Kite", 1000, 2);
        let ball = fixtures::product(&conn, "Ball", 250, 10);
        cart::add_item(&conn, &guest(), kite, 2).unwrap();
        cart::add_item(&conn, &guest(), ball, 3).unwrap();

        let placed = place_order(&mut conn, &guest(), &form().validate(None).unwrap()).unwrap();
        assert_eq!(placed.order.total_cents, 2750);
        assert_eq!(placed.order.status, OrderStatus::Placed);
        assert_eq!(placed.order.user_id, None);
        assert_eq!(placed.address.city, "Springfield");

        let kite_row = products::find(&conn, kite).unwrap().unwrap();
        assert_eq!(kite_row.stock, 0);
        assert_eq!(kite_row.status, ProductStatus::SoldOut);
        assert_eq!(products::find(&conn, ball).unwrap().unwrap().stock, 7);
        assert_eq!(orders::items(&conn, placed.order.id).unwrap().len(), 2);
        assert!(cart::view(&conn, &guest()).unwrap().is_empty());

        let payment = payments::find(&conn, placed.order.payment_id).unwrap().unwrap();
        assert_eq!(payment.card_last4.as_deref(), Some("4242"));
        assert_eq!(payment.amount_cents, 2750);
    }

    #[test]
    fn test_place_order_rolls_back_on_missing_stock() {
        let mut conn = fixtures::conn();
        let kite = fixtures::product(&conn, "Kite", 1000, 5);
        let ball = fixtures::product(&conn, "Ball", 250, 5);
        cart::add_item(&conn, &guest(), kite, 2).unwrap();
        cart::add_item(&conn, &guest(), ball, 4).unwrap();
        // Someone else bought most of the kites meanwhile.
        products::reserve_stock(&conn, kite, 4).unwrap();

        let err = place_order(&mut conn, &guest(), &form().validate(None).unwrap()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("Kite")));

        assert_eq!(orders::count(&conn).unwrap(), 0);
        assert_eq!(products::find(&conn, ball).unwrap().unwrap().stock, 5);
        let addresses: i64 = conn
            .query_row("SELECT COUNT(*) FROM addresses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(addresses, 0);
        assert_eq!(cart::view(&conn, &guest()).unwrap().lines.len(), 2);
    }

    #[test]
    fn test_place_order_rejects_overflowing_total() {
        let mut conn = fixtures::conn();
        let huge = fixtures::product(&conn, "Yacht", i64::MAX / 2 + 1, 5);
        cart::add_item(&conn, &guest(), huge, 2).unwrap();

        let err = place_order(&mut conn, &guest(), &form().validate(None).unwrap()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("too large")));
        assert_eq!(orders::count(&conn).unwrap(), 0);
        assert_eq!(products::find(&conn, huge).unwrap().unwrap().stock, 5);
    }

    #[test]
    fn test_place_order_with_empty_cart() {
        let mut conn = fixtures::conn();
        let err = place_order(&mut conn, &guest(), &form().validate(None).unwrap()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Your cart is empty"));
    }

    fn state_with(mailer: MemoryMailer) -> AppState {
        AppState::new(
            Database::open_in_memory().unwrap(),
            Arc::new(mailer),
            Config::default(),
        )
    }

    #[tokio::test]
    async fn test_checkout_sends_confirmation() {
        let mailer = MemoryMailer::new();
        let state = state_with(mailer.clone());
        {
            let conn = state.db.lock();
            let kite = fixtures::product(&conn, "Kite", 1000, 2);
            cart::add_item(&conn, &guest(), kite, 1).unwrap();
        }

        let placed = checkout(&state, guest(), None, form()).await.unwrap();
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "guest@example.com");
        assert!(sent[0].subject.contains(&placed.order.id.to_string()));
    }

    #[tokio::test]
    async fn test_checkout_survives_mail_failure() {
        let state = state_with(MemoryMailer::failing());
        {
            let conn = state.db.lock();
            let kite = fixtures::product(&conn, "Kite", 1000, 2);
            cart::add_item(&conn, &guest(), kite, 1).unwrap();
        }

        let placed = checkout(&state, guest(), None, form()).await.unwrap();
        let conn = state.db.lock();
        assert!(orders::find(&conn, placed.order.id).unwrap().is_some());
    }
}
