//! Shipping addresses captured at checkout.

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::models::{Address, NewAddress};

pub fn insert(conn: &Connection, address: &NewAddress) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO addresses (user_id, full_name, street, city, postal_code, country)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            address.user_id,
            address.full_name,
            address.street,
            address.city,
            address.postal_code,
            address.country,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Address>> {
    conn.query_row(
        "SELECT id, full_name, street, city, postal_code, country FROM addresses WHERE id = ?1",
        [id],
        |row| {
            Ok(Address {
                id: row.get(0)?,
                full_name: row.get(1)?,
                street: row.get(2)?,
                city: row.get(3)?,
                postal_code: row.get(4)?,
                country: row.get(5)?,
            })
        },
    )
    .optional()
}

/// Most recent address the user shipped to, used to prefill checkout.
pub fn latest_for_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Option<Address>> {
    let id: Option<i64> = conn
        .query_row(
            "SELECT MAX(id) FROM addresses WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
    match id {
        Some(id) => find(conn, id),
        None => Ok(None),
    }
}
