//! Product reviews, one per user and product.

use rusqlite::{params, Connection};

use crate::database::models::Review;
use crate::database::now_rfc3339;

/// Insert the user's review or replace their earlier one.
pub fn upsert(
    conn: &Connection,
    product_id: i64,
    user_id: i64,
    rating: i64,
    comment: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO reviews (product_id, user_id, rating, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (product_id, user_id)
         DO UPDATE SET rating = excluded.rating,
                       comment = excluded.comment,
                       created_at = excluded.created_at",
        params![product_id, user_id, rating, comment, now_rfc3339()],
    )?;
    Ok(())
}

pub fn list_for_product(conn: &Connection, product_id: i64) -> rusqlite::Result<Vec<Review>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.product_id, r.user_id, u.name, r.rating, r.comment, r.created_at
           FROM reviews r
           JOIN users u ON u.id = r.user_id
          WHERE r.product_id = ?1
          ORDER BY r.created_at DESC, r.id DESC",
    )?;
    let rows = stmt.query_map([product_id], |row| {
        Ok(Review {
            id: row.get(0)?,
            product_id: row.get(1)?,
            user_id: row.get(2)?,
            author_name: row.get(3)?,
            rating: row.get(4)?,
            comment: row.get(5)?,
            created_at: row.get(6)?,
        })
    })?;
    rows.collect()
}

/// Mean rating, or `None` when nobody reviewed the product yet.
pub fn average_rating(conn: &Connection, product_id: i64) -> rusqlite::Result<Option<f64>> {
    conn.query_row(
        "SELECT AVG(rating) FROM reviews WHERE product_id = ?1",
        [product_id],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;
    use crate::database::queries::fixtures;

    #[test]
    fn test_one_review_per_user() {
        let conn = fixtures::conn();
        let ann = fixtures::user(&conn, "ann@example.com", Role::Customer);
        let bo = fixtures::user(&conn, "bo@example.com", Role::Customer);
        let kite = fixtures::product(&conn, "Kite", 1000, 5);

        assert_eq!(average_rating(&conn, kite).unwrap(), None);
        upsert(&conn, kite, ann, 2, "meh").unwrap();
        upsert(&conn, kite, ann, 4, "grew on me").unwrap();
        upsert(&conn, kite, bo, 5, "").unwrap();

        let reviews = list_for_product(&conn, kite).unwrap();
        assert_eq!(reviews.len(), 2);
        let ann_review = reviews.iter().find(|r| r.user_id == ann).unwrap();
        assert_eq!(ann_review.rating, 4);
        assert_eq!(ann_review.comment, "grew on me");
        assert_eq!(average_rating(&conn, kite).unwrap(), Some(4.5));
    }

    #[test]
    fn test_rating_bounds_enforced_by_schema() {
        let conn = fixtures::conn();
        let ann = fixtures::user(&conn, "ann@example.com", Role::Customer);
        let kite = fixtures::product(&conn, "Kite", 1000, 5);
        assert!(upsert(&conn, kite, ann, 6, "").is_err());
        assert!(upsert(&conn, kite, ann, 0, "").is_err());
    }
}
