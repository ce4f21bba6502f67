//! Log-only mail adapter.
//!
//! Used in development and whenever no relay is configured: the message is
//! written to the application log instead of being delivered.

use async_trait::async_trait;

use crate::errors::MailError;
use crate::models::OutgoingMail;
use crate::MailAdapter;

/// Writes each message to the log at `info` level.
#[derive(Debug, Default, Clone)]
pub struct ConsoleMailer;

#[async_trait]
impl MailAdapter for ConsoleMailer {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        mail.validate()?;
        log::info!(
            "mail [{}] to={} subject={:?}\n{}",
            mail.kind.as_str(),
            mail.to,
            mail.subject,
            mail.body
        );
        Ok(())
    }
}
