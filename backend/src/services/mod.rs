//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business operations
//! and orchestrate interactions between the data-access layer and the mail
//! adapters, such as placing orders or moderating seller applications.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod dashboard;
pub mod notifications;
pub mod orders;
pub mod sellers;
