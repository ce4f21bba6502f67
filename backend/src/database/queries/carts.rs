//! Data access for carts and their lines.
//!
//! A cart is keyed either by user id or by guest token; lines are joined with
//! their product so prices and stock are always current.

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::models::{Cart, CartLine};
use crate::database::now_rfc3339;

fn cart_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Cart> {
    Ok(Cart {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        guest_token: row.get("guest_token")?,
    })
}

pub fn find_for_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Option<Cart>> {
    conn.query_row("SELECT * FROM carts WHERE user_id = ?1", [user_id], cart_from_row)
        .optional()
}

pub fn find_for_guest(conn: &Connection, token: &str) -> rusqlite::Result<Option<Cart>> {
    conn.query_row("SELECT * FROM carts WHERE guest_token = ?1", [token], cart_from_row)
        .optional()
}

pub fn get_or_create_for_user(conn: &Connection, user_id: i64) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO carts (user_id, created_at) VALUES (?1, ?2)",
        params![user_id, now_rfc3339()],
    )?;
    conn.query_row("SELECT id FROM carts WHERE user_id = ?1", [user_id], |row| row.get(0))
}

pub fn get_or_create_for_guest(conn: &Connection, token: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO carts (guest_token, created_at) VALUES (?1, ?2)",
        params![token, now_rfc3339()],
    )?;
    conn.query_row("SELECT id FROM carts WHERE guest_token = ?1", [token], |row| row.get(0))
}

pub fn lines(conn: &Connection, cart_id: i64) -> rusqlite::Result<Vec<CartLine>> {
    let mut stmt = conn.prepare(
        "SELECT ci.product_id, ci.quantity, p.name, p.price_cents, p.stock, p.status
           FROM cart_items ci
           JOIN products p ON p.id = ci.product_id
          WHERE ci.cart_id = ?1
          ORDER BY p.name",
    )?;
    let rows = stmt.query_map([cart_id], CartLine::from_row)?;
    rows.collect()
}

pub fn quantity_of(conn: &Connection, cart_id: i64, product_id: i64) -> rusqlite::Result<i64> {
    Ok(conn
        .query_row(
            "SELECT quantity FROM cart_items WHERE cart_id = ?1 AND product_id = ?2",
            [cart_id, product_id],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0))
}

pub fn set_quantity(
    conn: &Connection,
    cart_id: i64,
    product_id: i64,
    quantity: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES (?1, ?2, ?3)
         ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = excluded.quantity",
        params![cart_id, product_id, quantity],
    )?;
    Ok(())
}

pub fn remove_item(conn: &Connection, cart_id: i64, product_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM cart_items WHERE cart_id = ?1 AND product_id = ?2",
        [cart_id, product_id],
    )
}

pub fn clear(conn: &Connection, cart_id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM cart_items WHERE cart_id = ?1", [cart_id])
}

pub fn delete(conn: &Connection, cart_id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM carts WHERE id = ?1", [cart_id])
}

/// Total units in the cart (navigation badge).
pub fn unit_count(conn: &Connection, cart_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(SUM(quantity), 0) FROM cart_items WHERE cart_id = ?1",
        [cart_id],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;
    use crate::database::queries::fixtures;

    #[test]
    fn test_get_or_create_is_stable() {
        let conn = fixtures::conn();
        let user = fixtures::user(&conn, "ann@example.com", Role::Customer);
        let a = get_or_create_for_user(&conn, user).unwrap();
        let b = get_or_create_for_user(&conn, user).unwrap();
        assert_eq!(a, b);

        let g1 = get_or_create_for_guest(&conn, "guest-1").unwrap();
        assert_ne!(g1, a);
        assert_eq!(get_or_create_for_guest(&conn, "guest-1").unwrap(), g1);
        assert_eq!(find_for_guest(&conn, "guest-1").unwrap().unwrap().id, g1);
        assert_eq!(find_for_user(&conn, user).unwrap().unwrap().id, a);
    }

    #[test]
    fn test_lines_and_quantities() {
        let conn = fixtures::conn();
        let kite = fixtures::product(&conn, "Kite", 1000, 5);
        let ball = fixtures::product(&conn, "Ball", 250, 5);
        let cart = get_or_create_for_guest(&conn, "g").unwrap();

        set_quantity(&conn, cart, kite, 1).unwrap();
        set_quantity(&conn, cart, kite, 2).unwrap();
        set_quantity(&conn, cart, ball, 4).unwrap();

        let lines = lines(&conn, cart).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Ball");
        assert_eq!(lines[0].line_total_cents, 1000);
        assert_eq!(lines[1].quantity, 2);
        assert_eq!(unit_count(&conn, cart).unwrap(), 6);
        assert_eq!(quantity_of(&conn, cart, kite).unwrap(), 2);

        remove_item(&conn, cart, kite).unwrap();
        assert_eq!(quantity_of(&conn, cart, kite).unwrap(), 0);
        clear(&conn, cart).unwrap();
        assert_eq!(unit_count(&conn, cart).unwrap(), 0);
        delete(&conn, cart).unwrap();
        assert!(find_for_guest(&conn, "g").unwrap().is_none());
    }
}
