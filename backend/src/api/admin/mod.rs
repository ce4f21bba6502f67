//! Admin dashboard, seller moderation and order status updates.

pub mod handlers;
pub mod routes;
