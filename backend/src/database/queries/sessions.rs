//! Login sessions keyed by an opaque token.

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::models::Session;

pub fn insert(conn: &Connection, token: &str, user_id: i64, expires_at: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, expires_at],
    )?;
    Ok(())
}

pub fn find(conn: &Connection, token: &str) -> rusqlite::Result<Option<Session>> {
    conn.query_row(
        "SELECT token, user_id, expires_at FROM sessions WHERE token = ?1",
        [token],
        |row| {
            Ok(Session {
                token: row.get(0)?,
                user_id: row.get(1)?,
                expires_at: row.get(2)?,
            })
        },
    )
    .optional()
}

pub fn delete(conn: &Connection, token: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", [token])
}

/// Remove every session that expired at or before `now`.
pub fn delete_expired(conn: &Connection, now: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", [now])
}
