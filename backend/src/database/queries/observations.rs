//! Watched products and their price-change flags.
//!
//! An observation remembers the price the user saw. Price edits flag every
//! observation whose remembered price no longer matches.

use rusqlite::{params, Connection};

use crate::database::models::{Observation, Observer};

/// Start (or restart) watching a product at its current price.
pub fn observe(
    conn: &Connection,
    user_id: i64,
    product_id: i64,
    price_cents: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO observations (user_id, product_id, observed_price_cents, price_changed)
         VALUES (?1, ?2, ?3, 0)
         ON CONFLICT (user_id, product_id)
         DO UPDATE SET observed_price_cents = excluded.observed_price_cents, price_changed = 0",
        params![user_id, product_id, price_cents],
    )?;
    Ok(())
}

pub fn unobserve(conn: &Connection, user_id: i64, product_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM observations WHERE user_id = ?1 AND product_id = ?2",
        [user_id, product_id],
    )
}

pub fn is_observing(conn: &Connection, user_id: i64, product_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM observations WHERE user_id = ?1 AND product_id = ?2)",
        [user_id, product_id],
        |row| row.get(0),
    )
}

pub fn list_for_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Observation>> {
    let mut stmt = conn.prepare(
        "SELECT o.product_id, p.name, o.observed_price_cents, p.price_cents, o.price_changed, p.status
           FROM observations o
           JOIN products p ON p.id = o.product_id
          WHERE o.user_id = ?1
          ORDER BY o.price_changed DESC, p.name",
    )?;
    let rows = stmt.query_map([user_id], |row| {
        Ok(Observation {
            product_id: row.get(0)?,
            product_name: row.get(1)?,
            observed_price_cents: row.get(2)?,
            current_price_cents: row.get(3)?,
            price_changed: row.get(4)?,
            status: row.get(5)?,
        })
    })?;
    rows.collect()
}

/// Observers of `product_id` whose flag is clear and whose remembered price
/// differs from `new_price_cents`: the ones a price change newly affects.
pub fn unflagged_observers(
    conn: &Connection,
    product_id: i64,
    new_price_cents: i64,
) -> rusqlite::Result<Vec<Observer>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.email, u.name, o.observed_price_cents
           FROM observations o
           JOIN users u ON u.id = o.user_id
          WHERE o.product_id = ?1 AND o.price_changed = 0 AND o.observed_price_cents != ?2
          ORDER BY u.id",
    )?;
    let rows = stmt.query_map([product_id, new_price_cents], |row| {
        Ok(Observer {
            user_id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            observed_price_cents: row.get(3)?,
        })
    })?;
    rows.collect()
}

/// Set each observation's flag to whether the remembered price differs from
/// the product's new price.
pub fn refresh_flags(conn: &Connection, product_id: i64, new_price_cents: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE observations
            SET price_changed = CASE WHEN observed_price_cents != ?2 THEN 1 ELSE 0 END
          WHERE product_id = ?1",
        [product_id, new_price_cents],
    )
}

/// Clear the user's flags and remember today's prices.
pub fn acknowledge(conn: &Connection, user_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE observations
            SET price_changed = 0,
                observed_price_cents = (SELECT price_cents FROM products p
                                         WHERE p.id = observations.product_id)
          WHERE user_id = ?1",
        [user_id],
    )
}

pub fn flagged_count(conn: &Connection, user_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM observations WHERE user_id = ?1 AND price_changed = 1",
        [user_id],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;
    use crate::database::queries::{fixtures, products};

    #[test]
    fn test_flagging_follows_price() {
        let conn = fixtures::conn();
        let ann = fixtures::user(&conn, "ann@example.com", Role::Customer);
        let bo = fixtures::user(&conn, "bo@example.com", Role::Customer);
        let kite = fixtures::product(&conn, "Kite", 1000, 5);

        observe(&conn, ann, kite, 1000).unwrap();
        observe(&conn, bo, kite, 800).unwrap();
        assert!(is_observing(&conn, ann, kite).unwrap());

        let newly = unflagged_observers(&conn, kite, 800).unwrap();
        assert_eq!(newly.len(), 1);
        assert_eq!(newly[0].user_id, ann);

        refresh_flags(&conn, kite, 800).unwrap();
        assert_eq!(flagged_count(&conn, ann).unwrap(), 1);
        assert_eq!(flagged_count(&conn, bo).unwrap(), 0);
        assert!(unflagged_observers(&conn, kite, 700).unwrap().len() == 1);
    }

    #[test]
    fn test_acknowledge_remembers_current_price() {
        let conn = fixtures::conn();
        let ann = fixtures::user(&conn, "ann@example.com", Role::Customer);
        let kite = fixtures::product(&conn, "Kite", 1000, 5);
        observe(&conn, ann, kite, 1000).unwrap();

        products::update(&conn, kite, &fixtures::draft("Kite", 750, 5)).unwrap();
        refresh_flags(&conn, kite, 750).unwrap();

        let listed = list_for_user(&conn, ann).unwrap();
        assert!(listed[0].price_changed);
        assert_eq!(listed[0].observed_price_cents, 1000);
        assert_eq!(listed[0].current_price_cents, 750);

        acknowledge(&conn, ann).unwrap();
        let listed = list_for_user(&conn, ann).unwrap();
        assert!(!listed[0].price_changed);
        assert_eq!(listed[0].observed_price_cents, 750);

        assert_eq!(unobserve(&conn, ann, kite).unwrap(), 1);
        assert!(list_for_user(&conn, ann).unwrap().is_empty());
    }
}
