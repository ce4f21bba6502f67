//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Duration;

use adapters::{ConsoleMailer, MailAdapter, MailError, WebhookConfig, WebhookMailer};

use crate::config::{Config, MailBackend};
use crate::database::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub mailer: Arc<dyn MailAdapter>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, mailer: Arc<dyn MailAdapter>, config: Config) -> Self {
        Self {
            db,
            mailer,
            config: Arc::new(config),
        }
    }
}

/// Build the mail transport selected in the configuration.
pub fn build_mailer(config: &Config) -> Result<Arc<dyn MailAdapter>, MailError> {
    match config.mail.backend {
        MailBackend::Log => Ok(Arc::new(ConsoleMailer)),
        MailBackend::Webhook => {
            let mailer = WebhookMailer::new(WebhookConfig {
                endpoint: config.mail.webhook_url.clone(),
                from: config.mail.from.clone(),
                timeout: Duration::from_secs(config.mail.timeout_secs),
            })?;
            Ok(Arc::new(mailer))
        }
    }
}
