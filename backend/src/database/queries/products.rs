//! Product catalog queries.
//!
//! Covers the filtered, paginated listing, seller-side management and the
//! guarded stock updates used by checkout and order cancellation.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::database::models::{Product, ProductDraft, ProductStatus};
use crate::database::now_rfc3339;

/// Catalog filter; empty strings mean "no filter".
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub query: String,
    pub category: String,
}

/// Status implied by the editable fields.
fn status_for(draft: &ProductDraft) -> ProductStatus {
    if draft.archived {
        ProductStatus::Archived
    } else if draft.stock == 0 {
        ProductStatus::SoldOut
    } else {
        ProductStatus::Available
    }
}

/// Escape `%`, `_` and the escape character itself for `LIKE ... ESCAPE '!'`.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '!') {
            out.push('!');
        }
        out.push(ch);
    }
    out
}

fn where_clause(filter: &ProductFilter) -> (String, Vec<Value>) {
    let mut where_parts = vec!["status != 'archived'".to_string()];
    let mut values: Vec<Value> = Vec::new();

    let query = filter.query.trim();
    if !query.is_empty() {
        where_parts.push(
            "(lower(name) LIKE ? ESCAPE '!' OR lower(description) LIKE ? ESCAPE '!')".to_string(),
        );
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
        values.push(Value::Text(pattern.clone()));
        values.push(Value::Text(pattern));
    }
    let category = filter.category.trim();
    if !category.is_empty() {
        where_parts.push("category = ?".to_string());
        values.push(Value::Text(category.to_string()));
    }

    (format!(" WHERE {}", where_parts.join(" AND ")), values)
}

pub fn insert(
    conn: &Connection,
    seller_id: Option<i64>,
    draft: &ProductDraft,
) -> rusqlite::Result<i64> {
    let now = now_rfc3339();
    conn.execute(
        "INSERT INTO products
             (seller_id, name, description, category, price_cents, stock, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            seller_id,
            draft.name,
            draft.description,
            draft.category,
            draft.price_cents,
            draft.stock,
            status_for(draft),
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, id: i64, draft: &ProductDraft) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE products
            SET name = ?1, description = ?2, category = ?3, price_cents = ?4,
                stock = ?5, status = ?6, updated_at = ?7
          WHERE id = ?8",
        params![
            draft.name,
            draft.description,
            draft.category,
            draft.price_cents,
            draft.stock,
            status_for(draft),
            now_rfc3339(),
            id,
        ],
    )
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Product>> {
    conn.query_row("SELECT * FROM products WHERE id = ?1", [id], Product::from_row)
        .optional()
}

/// Non-archived products, newest first.
pub fn list(
    conn: &Connection,
    filter: &ProductFilter,
    limit: i64,
    offset: i64,
) -> rusqlite::Result<Vec<Product>> {
    let (clause, mut values) = where_clause(filter);
    let sql = format!("SELECT * FROM products{clause} ORDER BY id DESC LIMIT ? OFFSET ?");
    values.push(Value::Integer(limit));
    values.push(Value::Integer(offset));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), Product::from_row)?;
    rows.collect()
}

pub fn count(conn: &Connection, filter: &ProductFilter) -> rusqlite::Result<i64> {
    let (clause, values) = where_clause(filter);
    conn.query_row(
        &format!("SELECT COUNT(*) FROM products{clause}"),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )
}

pub fn categories(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT category FROM products
          WHERE status != 'archived' AND category != ''
          ORDER BY category",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
}

pub fn list_by_seller(conn: &Connection, seller_id: i64) -> rusqlite::Result<Vec<Product>> {
    let mut stmt = conn.prepare("SELECT * FROM products WHERE seller_id = ?1 ORDER BY id DESC")?;
    let rows = stmt.query_map([seller_id], Product::from_row)?;
    rows.collect()
}

/// Take `quantity` units out of stock. Returns `false` (and changes nothing)
/// when the product is not available or has fewer units left.
pub fn reserve_stock(conn: &Connection, id: i64, quantity: i64) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE products
            SET stock = stock - ?1,
                status = CASE WHEN stock - ?1 = 0 THEN 'sold_out' ELSE status END,
                updated_at = ?3
          WHERE id = ?2 AND status = 'available' AND stock >= ?1",
        params![quantity, id, now_rfc3339()],
    )?;
    Ok(changed == 1)
}

/// Put units back (order cancellation). Sold-out products become available.
pub fn restore_stock(conn: &Connection, id: i64, quantity: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE products
            SET stock = stock + ?1,
                status = CASE WHEN status = 'sold_out' THEN 'available' ELSE status END,
                updated_at = ?3
          WHERE id = ?2",
        params![quantity, id, now_rfc3339()],
    )
}

pub fn count_listed(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM products WHERE status != 'archived'",
        [],
        |row| row.get(0),
    )
}
