use crate::email::{EmailError, EmailMessage, EmailProvider};
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::{debug, info};

/// Logs each message and keeps a copy for inspection.
#[derive(Default)]
pub struct NullProvider {
    outbox: Mutex<Vec<EmailMessage>>,
}

impl NullProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages "sent" so far, oldest first.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EmailProvider for NullProvider {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            "Email not delivered (null provider): to={} subject={:?}",
            message.to.join(", "),
            message.subject
        );
        debug!("Suppressed email body:\n{}", message.text);

        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(message);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}
