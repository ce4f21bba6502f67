//! Core `adapters` crate for abstracting outbound mail delivery.
//!
//! This crate defines the `MailAdapter` trait, which the storefront uses for
//! every email it sends (order confirmations, price-change alerts, seller
//! decisions), and provides the concrete transports: a log-only console
//! adapter, an HTTP webhook relay and an in-memory recorder used by tests.

pub mod console;
pub mod errors;
pub mod memory;
pub mod models;
pub mod webhook;

use async_trait::async_trait;

pub use console::ConsoleMailer;
pub use errors::MailError;
pub use memory::MemoryMailer;
pub use models::{MailKind, OutgoingMail};
pub use webhook::{WebhookConfig, WebhookMailer};

/// A transport able to deliver one email at a time.
///
/// Callers treat delivery as best-effort: an `Err` is logged by the caller and
/// never undoes the business operation that triggered the mail.
#[async_trait]
pub trait MailAdapter: Send + Sync {
    /// Short transport name used in log lines.
    fn name(&self) -> &'static str;

    /// Deliver a single message.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}
