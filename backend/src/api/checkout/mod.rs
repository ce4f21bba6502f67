//! Checkout form and order placement.

pub mod handlers;
pub mod routes;
