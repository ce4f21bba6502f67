//! Seller onboarding and the seller's product editor.

pub mod handlers;
pub mod routes;
