use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use super::{MailDispatcher, MailRecipient, MailTransport, OutgoingMail};

const QUEUE_CAPACITY: usize = 256;

/// Bounded queue drained by one background task that hands each mail to every transport.
#[derive(Clone)]
pub struct MailQueue {
    tx: mpsc::Sender<OutgoingMail>,
}

impl MailQueue {
    /// Must be called inside a Tokio runtime.
    pub fn new(transports: Vec<Arc<dyn MailTransport>>) -> Self {
        Self::with_capacity(transports, QUEUE_CAPACITY)
    }

    pub fn with_capacity(transports: Vec<Arc<dyn MailTransport>>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<OutgoingMail>(capacity);

        tokio::spawn(async move {
            while let Some(mail) = rx.recv().await {
                for transport in &transports {
                    if let Err(error) = transport.deliver(&mail).await {
                        warn!(
                            transport = transport.transport_name(),
                            template = %mail.template,
                            error = %error,
                            "mail: delivery failed"
                        );
                    }
                }
            }
        });

        Self { tx }
    }
}

impl MailDispatcher for MailQueue {
    fn send(&self, recipient: MailRecipient, template: &str, payload: Value) {
        let mail = OutgoingMail {
            recipient,
            template: template.to_string(),
            payload,
            queued_at: Utc::now(),
        };

        match self.tx.try_send(mail) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(mail)) => {
                warn!(template = %mail.template, "mail: queue full; dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(mail)) => {
                warn!(template = %mail.template, "mail: queue closed; dropping message");
            }
        }
    }
}
