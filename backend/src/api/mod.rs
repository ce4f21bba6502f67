//! Central module for organizing the application's storefront endpoints.
//!
//! Each area (catalog, cart, checkout, orders, watched products, seller
//! tools, admin) has its own `handlers` and `routes`. Authentication routes
//! live in `crate::auth`.

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod observed;
pub mod orders;
pub mod products;
pub mod seller;
