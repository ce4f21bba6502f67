//! Seller profiles and the pending-application queue.

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::models::{SellerApplication, SellerProfile, SellerStatus};
use crate::database::now_rfc3339;

pub fn find(conn: &Connection, user_id: i64) -> rusqlite::Result<Option<SellerProfile>> {
    conn.query_row(
        "SELECT * FROM seller_profiles WHERE user_id = ?1",
        [user_id],
        SellerProfile::from_row,
    )
    .optional()
}

/// Whether another user already owns `shop_name` (case-insensitive).
pub fn shop_name_taken(conn: &Connection, shop_name: &str, user_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM seller_profiles
                         WHERE lower(shop_name) = lower(?1) AND user_id != ?2)",
        params![shop_name, user_id],
        |row| row.get(0),
    )
}

/// Create the application, or reopen an earlier one as pending.
pub fn upsert_application(
    conn: &Connection,
    user_id: i64,
    shop_name: &str,
    description: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO seller_profiles (user_id, shop_name, description, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (user_id)
         DO UPDATE SET shop_name = excluded.shop_name,
                       description = excluded.description,
                       status = excluded.status",
        params![user_id, shop_name, description, SellerStatus::Pending, now_rfc3339()],
    )?;
    Ok(())
}

pub fn set_status(conn: &Connection, user_id: i64, status: SellerStatus) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE seller_profiles SET status = ?1 WHERE user_id = ?2",
        params![status, user_id],
    )
}

pub fn pending(conn: &Connection) -> rusqlite::Result<Vec<SellerApplication>> {
    let mut stmt = conn.prepare(
        "SELECT s.*, u.email, u.name
           FROM seller_profiles s
           JOIN users u ON u.id = s.user_id
          WHERE s.status = 'pending'
          ORDER BY s.created_at, s.user_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(SellerApplication {
            profile: SellerProfile::from_row(row)?,
            email: row.get("email")?,
            name: row.get("name")?,
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;
    use crate::database::queries::fixtures;

    #[test]
    fn test_application_lifecycle() {
        let conn = fixtures::conn();
        let ann = fixtures::user(&conn, "ann@example.com", Role::Customer);
        let bo = fixtures::user(&conn, "bo@example.com", Role::Customer);

        upsert_application(&conn, ann, "Ann's Attic", "old things").unwrap();
        assert!(shop_name_taken(&conn, "ann's attic", bo).unwrap());
        assert!(!shop_name_taken(&conn, "Ann's Attic", ann).unwrap());

        let pending_now = pending(&conn).unwrap();
        assert_eq!(pending_now.len(), 1);
        assert_eq!(pending_now[0].email, "ann@example.com");

        set_status(&conn, ann, SellerStatus::Rejected).unwrap();
        assert!(pending(&conn).unwrap().is_empty());

        upsert_application(&conn, ann, "Ann's Loft", "renamed").unwrap();
        let profile = find(&conn, ann).unwrap().unwrap();
        assert_eq!(profile.status, SellerStatus::Pending);
        assert_eq!(profile.shop_name, "Ann's Loft");
    }
}
