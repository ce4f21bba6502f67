//! User accounts and roles.

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::models::{Role, User};
use crate::database::now_rfc3339;

pub fn insert(
    conn: &Connection,
    email: &str,
    name: &str,
    password_hash: &str,
    role: Role,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (email, name, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![email, name, password_hash, role, now_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT * FROM users WHERE email = ?1",
        [email],
        User::from_row,
    )
    .optional()
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row("SELECT * FROM users WHERE id = ?1", [id], User::from_row)
        .optional()
}

pub fn email_exists(conn: &Connection, email: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM users WHERE email = ?1)",
        [email],
        |row| row.get(0),
    )
}

pub fn set_role(conn: &Connection, id: i64, role: Role) -> rusqlite::Result<usize> {
    conn.execute("UPDATE users SET role = ?1 WHERE id = ?2", params![role, id])
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}
