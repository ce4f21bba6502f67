//! Catalog pages: listing, product detail, reviews and the price-watch toggle.

pub mod handlers;
pub mod routes;
