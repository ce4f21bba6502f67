//! Orders, their line items and the aggregates shown on the admin dashboard.

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::models::{CartLine, Order, OrderItem, OrderStatus, OrderSummary};
use crate::database::now_rfc3339;

pub fn insert(
    conn: &Connection,
    user_id: Option<i64>,
    email: &str,
    address_id: i64,
    payment_id: i64,
    total_cents: i64,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO orders (user_id, email, address_id, payment_id, total_cents, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_id,
            email,
            address_id,
            payment_id,
            total_cents,
            OrderStatus::Placed,
            now_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Snapshot a cart line (name and unit price) into the order.
pub fn insert_item(conn: &Connection, order_id: i64, line: &CartLine) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO order_items (order_id, product_id, product_name, unit_price_cents, quantity)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            order_id,
            line.product_id,
            line.name,
            line.unit_price_cents,
            line.quantity,
        ],
    )?;
    Ok(())
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Order>> {
    conn.query_row("SELECT * FROM orders WHERE id = ?1", [id], Order::from_row)
        .optional()
}

pub fn items(conn: &Connection, order_id: i64) -> rusqlite::Result<Vec<OrderItem>> {
    let mut stmt = conn.prepare(
        "SELECT product_id, product_name, unit_price_cents, quantity
           FROM order_items WHERE order_id = ?1 ORDER BY product_name",
    )?;
    let rows = stmt.query_map([order_id], |row| {
        let unit_price_cents: i64 = row.get(2)?;
        let quantity: i64 = row.get(3)?;
        Ok(OrderItem {
            product_id: row.get(0)?,
            product_name: row.get(1)?,
            unit_price_cents,
            quantity,
            line_total_cents: unit_price_cents.saturating_mul(quantity),
        })
    })?;
    rows.collect()
}

const SUMMARY_SELECT: &str = "SELECT o.*,
        (SELECT COALESCE(SUM(quantity), 0) FROM order_items i WHERE i.order_id = o.id) AS item_count
   FROM orders o";

fn summary_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderSummary> {
    Ok(OrderSummary {
        order: Order::from_row(row)?,
        item_count: row.get("item_count")?,
    })
}

pub fn list_for_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<OrderSummary>> {
    let mut stmt = conn.prepare(&format!(
        "{SUMMARY_SELECT} WHERE o.user_id = ?1 ORDER BY o.id DESC"
    ))?;
    let rows = stmt.query_map([user_id], summary_from_row)?;
    rows.collect()
}

pub fn recent(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<OrderSummary>> {
    let mut stmt = conn.prepare(&format!("{SUMMARY_SELECT} ORDER BY o.id DESC LIMIT ?1"))?;
    let rows = stmt.query_map([limit], summary_from_row)?;
    rows.collect()
}

pub fn set_status(conn: &Connection, id: i64, status: OrderStatus) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE orders SET status = ?1 WHERE id = ?2",
        params![status, id],
    )
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
}

/// Sum of all orders that were not cancelled.
pub fn revenue_cents(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(SUM(total_cents), 0) FROM orders WHERE status != 'cancelled'",
        [],
        |row| row.get(0),
    )
}
