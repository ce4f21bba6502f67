//! Payment records. Only the method and masked card details are stored.

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::models::{NewPayment, Payment};
use crate::database::now_rfc3339;

pub fn insert(conn: &Connection, payment: &NewPayment) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO payments (method, card_holder, card_last4, amount_cents, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            payment.method,
            payment.card_holder,
            payment.card_last4,
            payment.amount_cents,
            now_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Payment>> {
    conn.query_row(
        "SELECT id, method, card_holder, card_last4, amount_cents, created_at
           FROM payments WHERE id = ?1",
        [id],
        |row| {
            Ok(Payment {
                id: row.get(0)?,
                method: row.get(1)?,
                card_holder: row.get(2)?,
                card_last4: row.get(3)?,
                amount_cents: row.get(4)?,
                created_at: row.get(5)?,
            })
        },
    )
    .optional()
}
