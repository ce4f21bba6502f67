//! Database query functions (Data Access Objects).
//!
//! One submodule per table. Every function takes a plain `&Connection`, so
//! the same call works inside or outside a transaction (`Transaction` derefs
//! to `Connection`). All SQL is parameterized.

pub mod addresses;
pub mod carts;
pub mod observations;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod sellers;
pub mod sessions;
pub mod users;
