//! Figures and work queues for the admin dashboard.

use rusqlite::Connection;
use serde::Serialize;

use crate::database::models::{OrderSummary, SellerApplication};
use crate::database::queries::{orders, products, sellers, users};
use crate::errors::AppResult;

pub const RECENT_ORDERS: i64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user_count: i64,
    pub product_count: i64,
    pub order_count: i64,
    pub revenue_cents: i64,
    pub recent_orders: Vec<OrderSummary>,
    pub pending_sellers: Vec<SellerApplication>,
}

pub fn load(conn: &Connection) -> AppResult<Dashboard> {
    Ok(Dashboard {
        user_count: users::count(conn)?,
        product_count: products::count_listed(conn)?,
        order_count: orders::count(conn)?,
        revenue_cents: orders::revenue_cents(conn)?,
        recent_orders: orders::recent(conn, RECENT_ORDERS)?,
        pending_sellers: sellers::pending(conn)?,
    })
}
