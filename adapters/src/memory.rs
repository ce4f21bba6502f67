//! In-memory mail adapter that records every message it accepts.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::MailError;
use crate::models::OutgoingMail;
use crate::MailAdapter;

/// Records sent mail; can be switched into a failing mode to exercise
/// best-effort delivery paths.
#[derive(Debug, Default, Clone)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every `send` fails with a transport error.
    pub fn failing() -> Self {
        let mailer = Self::default();
        *mailer.failing.lock() = true;
        mailer
    }

    /// Snapshot of the messages accepted so far.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl MailAdapter for MemoryMailer {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if *self.failing.lock() {
            return Err(MailError::Transport("memory mailer set to fail".to_string()));
        }
        mail.validate()?;
        self.sent.lock().push(mail.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MailKind;

    #[tokio::test]
    async fn test_records_sent_mail() {
        let mailer = MemoryMailer::new();
        let mail = OutgoingMail::new(MailKind::PriceChange, "cy@example.com", "Price", "Down");
        mailer.send(&mail).await.unwrap();

        let clone = mailer.clone();
        assert_eq!(clone.sent(), vec![mail]);
    }

    #[tokio::test]
    async fn test_failing_mailer_records_nothing() {
        let mailer = MemoryMailer::failing();
        let mail = OutgoingMail::new(MailKind::PriceChange, "cy@example.com", "Price", "Down");
        let err = mailer.send(&mail).await.unwrap_err();
        assert!(err.is_transient());
        assert!(mailer.sent().is_empty());
    }
}
