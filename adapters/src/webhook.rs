//! HTTP mail relay adapter.
//!
//! Posts each message as JSON to a relay endpoint (any transactional-mail
//! service exposing a "send" webhook). A 2xx answer counts as delivered.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::errors::MailError;
use crate::models::OutgoingMail;
use crate::MailAdapter;

/// Connection settings for the relay.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub endpoint: String,
    pub from: String,
    pub timeout: Duration,
}

pub struct WebhookMailer {
    endpoint: String,
    from: String,
    client: reqwest::Client,
}

impl WebhookMailer {
    pub fn new(config: WebhookConfig) -> Result<Self, MailError> {
        if config.endpoint.trim().is_empty() {
            return Err(MailError::Config("webhook endpoint is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| MailError::Config(err.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint,
            from: config.from,
            client,
        })
    }

    fn payload(&self, mail: &OutgoingMail) -> serde_json::Value {
        build_payload(&self.from, mail)
    }
}

/// JSON body understood by the relay.
fn build_payload(from: &str, mail: &OutgoingMail) -> serde_json::Value {
    json!({
        "from": from,
        "to": mail.to,
        "subject": mail.subject,
        "text": mail.body,
        "tag": mail.kind.as_str(),
    })
}

#[async_trait]
impl MailAdapter for WebhookMailer {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        mail.validate()?;

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&self.payload(mail))
            .send()
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            log::debug!("relay accepted {} mail for {}", mail.kind.as_str(), mail.to);
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MailKind;

    fn config(endpoint: &str) -> WebhookConfig {
        WebhookConfig {
            endpoint: endpoint.to_string(),
            from: "shop@funshop.test".to_string(),
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_empty_endpoint_is_config_error() {
        assert!(matches!(
            WebhookMailer::new(config("  ")),
            Err(MailError::Config(_))
        ));
    }

    #[test]
    fn test_payload_shape() {
        let mail = OutgoingMail::new(
            MailKind::OrderConfirmation,
            "dee@example.com",
            "Order #7",
            "Thanks",
        );
        let payload = build_payload("shop@funshop.test", &mail);
        assert_eq!(payload["from"], "shop@funshop.test");
        assert_eq!(payload["to"], "dee@example.com");
        assert_eq!(payload["subject"], "Order #7");
        assert_eq!(payload["text"], "Thanks");
        assert_eq!(payload["tag"], "order_confirmation");
    }

    #[tokio::test]
    async fn test_invalid_recipient_short_circuits() {
        let mailer = WebhookMailer::new(config("http://127.0.0.1:9/send")).unwrap();
        let mail = OutgoingMail::new(MailKind::PriceChange, "nope", "s", "b");
        assert!(matches!(
            mailer.send(&mail).await,
            Err(MailError::InvalidRecipient(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_transport_error() {
        // Port 9 (discard) is closed on test machines.
        let mailer = WebhookMailer::new(config("http://127.0.0.1:9/send")).unwrap();
        let mail = OutgoingMail::new(MailKind::PriceChange, "eve@example.com", "s", "b");
        let err = mailer.send(&mail).await.unwrap_err();
        assert!(matches!(err, MailError::Transport(_)));
    }
}
