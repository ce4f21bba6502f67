//! Custom error types specific to the `adapters` crate.
//!
//! Every transport maps its own failures (HTTP errors, rejected payloads,
//! invalid addresses) into `MailError` so the backend handles them uniformly.

use thiserror::Error;

/// Errors that can occur while handing a message to a mail transport.
#[derive(Debug, Error)]
pub enum MailError {
    /// The recipient address is empty or obviously malformed.
    #[error("invalid recipient address: {0:?}")]
    InvalidRecipient(String),

    /// The transport could not be reached.
    #[error("mail transport unreachable: {0}")]
    Transport(String),

    /// The relay answered with a non-success status.
    #[error("mail relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The adapter is misconfigured (for example an empty webhook URL).
    #[error("mail adapter misconfigured: {0}")]
    Config(String),
}

impl MailError {
    /// Whether retrying the same message later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            MailError::Transport(_) => true,
            MailError::Rejected { status, .. } => *status >= 500 || *status == 429,
            MailError::InvalidRecipient(_) | MailError::Config(_) => false,
        }
    }
}
