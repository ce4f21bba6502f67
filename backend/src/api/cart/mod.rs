//! Cart pages for guests and logged-in users.

pub mod handlers;
pub mod routes;
