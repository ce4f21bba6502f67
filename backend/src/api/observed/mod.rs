//! Watched products and their price-change flags.

pub mod handlers;
pub mod routes;
