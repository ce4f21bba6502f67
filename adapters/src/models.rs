//! Generic data models for the `adapters` crate.
//!
//! `OutgoingMail` is the transport-neutral representation of a message; every
//! adapter receives the same shape regardless of how it delivers it.

use serde::{Deserialize, Serialize};

use crate::errors::MailError;

/// What triggered a message. Relays use it as a tag for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailKind {
    OrderConfirmation,
    PriceChange,
    SellerDecision,
}

impl MailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailKind::OrderConfirmation => "order_confirmation",
            MailKind::PriceChange => "price_change",
            MailKind::SellerDecision => "seller_decision",
        }
    }
}

/// A plain-text email ready to be handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub kind: MailKind,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    pub fn new(
        kind: MailKind,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Rejects recipients that no relay would accept.
    pub fn validate(&self) -> Result<(), MailError> {
        let to = self.to.trim();
        let valid = match to.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        };
        if valid && !to.contains(char::is_whitespace) {
            Ok(())
        } else {
            Err(MailError::InvalidRecipient(self.to.clone()))
        }
    }
}
