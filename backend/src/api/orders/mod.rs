//! Order history for logged-in customers.

pub mod handlers;
pub mod routes;
