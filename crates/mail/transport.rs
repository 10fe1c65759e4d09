use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;
use url::Url;

use super::OutgoingMail;

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<()>;
    fn transport_name(&self) -> &'static str;
}

/// Posts each mail as JSON to an HTTP relay that renders and sends it.
pub struct RelayTransport {
    relay_url: Url,
    client: Client,
}

impl RelayTransport {
    pub fn new(relay_url: Url) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(3)).build()?;
        Ok(Self { relay_url, client })
    }
}

#[async_trait]
impl MailTransport for RelayTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        let response = self
            .client
            .post(self.relay_url.clone())
            .json(mail)
            .send()
            .await
            .map_err(sanitize_reqwest_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "mail relay returned non-success status: {}",
            response.status()
        ))
    }

    fn transport_name(&self) -> &'static str {
        "relay"
    }
}

/// Relay errors can echo the URL, which may carry credentials.
fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("mail relay request timed out");
    }
    if error.is_connect() {
        return anyhow!("mail relay connection failed");
    }
    anyhow!("mail relay request failed")
}

/// Writes mail to the log. Used when no relay is configured.
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        info!(
            recipient = ?mail.recipient,
            template = %mail.template,
            payload = %mail.payload,
            "mail: would send"
        );
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::mail::MailRecipient;

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        let mail = OutgoingMail {
            recipient: MailRecipient::Staff,
            template: "ticket_open".to_string(),
            payload: json!({"id": 1}),
            queued_at: Utc::now(),
        };
        assert!(LogTransport.deliver(&mail).await.is_ok());
    }

    #[tokio::test]
    async fn relay_errors_do_not_leak_the_url() {
        let relay = RelayTransport::new(Url::parse("http://user:pw@127.0.0.1:9/send").unwrap()).unwrap();
        let mail = OutgoingMail {
            recipient: MailRecipient::User(2),
            template: "ticket_update".to_string(),
            payload: json!({}),
            queued_at: Utc::now(),
        };

        let err = relay.deliver(&mail).await.unwrap_err();
        assert!(!err.to_string().contains("pw"));
    }
}
