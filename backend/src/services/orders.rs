//! Order history and the admin status workflow.

use rusqlite::Connection;
use serde::Serialize;

use crate::database::models::{Address, Order, OrderItem, OrderStatus, OrderSummary, Payment, Role, User};
use crate::database::queries::{addresses, orders, payments, products};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub address: Option<Address>,
    pub payment: Option<Payment>,
}

pub fn history(conn: &Connection, user_id: i64) -> AppResult<Vec<OrderSummary>> {
    Ok(orders::list_for_user(conn, user_id)?)
}

/// The order as seen by `viewer`. Orders of other customers are reported as
/// missing rather than forbidden.
pub fn detail(conn: &Connection, id: i64, viewer: &User) -> AppResult<OrderDetail> {
    let order = orders::find(conn, id)?.ok_or(AppError::NotFound)?;
    if viewer.role != Role::Admin && order.user_id != Some(viewer.id) {
        return Err(AppError::NotFound);
    }
    Ok(OrderDetail {
        items: orders::items(conn, id)?,
        address: addresses::find(conn, order.address_id)?,
        payment: payments::find(conn, order.payment_id)?,
        order,
    })
}

/// Move an order along its workflow. Cancelling puts the units back.
pub fn set_status(conn: &mut Connection, id: i64, next: OrderStatus) -> AppResult<Order> {
    let tx = conn.transaction()?;
    let order = orders::find(&tx, id)?.ok_or(AppError::NotFound)?;
    if !order.status.can_become(next) {
        return Err(AppError::validation(format!(
            "An order that is {} cannot become {}",
            order.status, next
        )));
    }

    orders::set_status(&tx, id, next)?;
    if next == OrderStatus::Cancelled {
        for item in orders::items(&tx, id)? {
            products::restore_stock(&tx, item.product_id, item.quantity)?;
        }
    }
    tx.commit()?;

    tracing::info!(order_id = id, from = %order.status, to = %next, "order status changed");
    Ok(Order {
        status: next,
        ..order
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CartLine, NewAddress, NewPayment, PaymentMethod, ProductStatus};
    use crate::database::queries::{fixtures, users};

    fn seed_order(conn: &Connection, user_id: Option<i64>, product_id: i64, quantity: i64) -> i64 {
        let address = addresses::insert(
            conn,
            &NewAddress {
                user_id,
                full_name: "Ann".into(),
                street: "1 Main St".into(),
                city: "Springfield".into(),
                postal_code: "12345".into(),
                country: "US".into(),
            },
        )
        .unwrap();
        let payment = payments::insert(
            conn,
            &NewPayment {
                method: PaymentMethod::Invoice,
                card_holder: None,
                card_last4: None,
                amount_cents: 1000 * quantity,
            },
        )
        .unwrap();
        let order = orders::insert(conn, user_id, "ann@example.com", address, payment, 1000 * quantity)
            .unwrap();
        orders::insert_item(
            conn,
            order,
            &CartLine {
                product_id,
                name: "Kite".into(),
                unit_price_cents: 1000,
                quantity,
                stock: 0,
                status: ProductStatus::Available,
                line_total_cents: 1000 * quantity,
            },
        )
        .unwrap();
        assert!(products::reserve_stock(conn, product_id, quantity).unwrap());
        order
    }

    #[test]
    fn test_detail_is_private() {
        let conn = fixtures::conn();
        let ann = fixtures::user(&conn, "ann@example.com", Role::Customer);
        let bob = fixtures::user(&conn, "bob@example.com", Role::Customer);
        let root = fixtures::user(&conn, "root@example.com", Role::Admin);
        let kite = fixtures::product(&conn, "Kite", 1000, 5);
        let order = seed_order(&conn, Some(ann), kite, 2);

        let user = |id| users::find_by_id(&conn, id).unwrap().unwrap();
        let own = detail(&conn, order, &user(ann)).unwrap();
        assert_eq!(own.items.len(), 1);
        assert_eq!(own.address.unwrap().city, "Springfield");
        assert_eq!(own.payment.unwrap().method, PaymentMethod::Invoice);

        assert!(matches!(detail(&conn, order, &user(bob)), Err(AppError::NotFound)));
        assert!(detail(&conn, order, &user(root)).is_ok());
        assert_eq!(history(&conn, ann).unwrap()[0].item_count, 2);
        assert!(history(&conn, bob).unwrap().is_empty());
    }

    #[test]
    fn test_status_workflow() {
        let mut conn = fixtures::conn();
        let kite = fixtures::product(&conn, "Kite", 1000, 5);
        let order = seed_order(&conn, None, kite, 2);

        assert!(matches!(
            set_status(&mut conn, order, OrderStatus::Delivered),
            Err(AppError::Validation(_))
        ));
        assert_eq!(set_status(&mut conn, order, OrderStatus::Shipped).unwrap().status, OrderStatus::Shipped);
        set_status(&mut conn, order, OrderStatus::Delivered).unwrap();
        assert!(set_status(&mut conn, order, OrderStatus::Cancelled).is_err());
        assert_eq!(products::find(&conn, kite).unwrap().unwrap().stock, 3);
        assert!(matches!(set_status(&mut conn, 999, OrderStatus::Shipped), Err(AppError::NotFound)));
    }

    #[test]
    fn test_cancel_restores_sold_out_stock() {
        let mut conn = fixtures::conn();
        let kite = fixtures::product(&conn, "Kite", 1000, 2);
        let order = seed_order(&conn, None, kite, 2);
        assert_eq!(products::find(&conn, kite).unwrap().unwrap().status, ProductStatus::SoldOut);

        set_status(&mut conn, order, OrderStatus::Cancelled).unwrap();
        let product = products::find(&conn, kite).unwrap().unwrap();
        assert_eq!(product.stock, 2);
        assert_eq!(product.status, ProductStatus::Available);
        assert_eq!(orders::revenue_cents(&conn).unwrap(), 0);
    }
}
