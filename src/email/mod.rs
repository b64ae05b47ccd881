pub mod config;
pub mod error;
pub mod providers;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError>;
    fn name(&self) -> &str;
}

pub type DynEmailProvider = Arc<dyn EmailProvider>;

pub async fn create_provider(config: &EmailProviderConfig) -> Result<DynEmailProvider, EmailError> {
    match config {
        EmailProviderConfig::Ses(ses_config) => {
            Ok(Arc::new(providers::SesProvider::new(ses_config).await?))
        }
        EmailProviderConfig::Null => Ok(Arc::new(providers::NullProvider::new())),
    }
}

const FALLBACK_SENDER: &str = "noreply@localhost";

/// Sender identity bound to a provider.
#[derive(Clone)]
pub struct Mailer {
    from: String,
    reply_to: Option<String>,
    provider: DynEmailProvider,
}

impl Mailer {
    pub fn new(
        from: impl Into<String>,
        reply_to: Option<String>,
        provider: DynEmailProvider,
    ) -> Self {
        Self {
            from: from.into(),
            reply_to,
            provider,
        }
    }

    /// A mailer that only logs.
    pub fn null() -> Self {
        Self::new(FALLBACK_SENDER, None, Arc::new(providers::NullProvider::new()))
    }

    /// Falls back to [`Mailer::null`] when email is unconfigured or the provider fails to start.
    pub async fn from_config(config: Option<&EmailConfig>) -> Self {
        let Some(config) = config else {
            info!("No [email] section configured, outgoing mail will only be logged");
            return Self::null();
        };

        match create_provider(&config.provider).await {
            Ok(provider) => {
                info!("Email provider ready: {}", provider.name());
                Self::new(config.sender(), config.reply_to.clone(), provider)
            }
            Err(e) => {
                warn!("Failed to initialize email provider, falling back to logging: {}", e);
                Self::new(
                    config.sender(),
                    config.reply_to.clone(),
                    Arc::new(providers::NullProvider::new()),
                )
            }
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn send(&self, to: &str, subject: &str, text: String) -> Result<(), EmailError> {
        let message = EmailMessage::new(self.from.clone(), to, subject)
            .with_text(text)
            .with_reply_to(self.reply_to.clone());
        message.validate()?;
        self.provider.send_email(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mailer_fills_in_sender() {
        let outbox = Arc::new(providers::NullProvider::new());
        let mailer = Mailer::new(
            "Visit Italy! <noreply@example.it>",
            Some("info@example.it".to_string()),
            outbox.clone(),
        );

        mailer
            .send("ada@example.it", "Grazie", "Body".to_string())
            .await
            .unwrap();
        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "Visit Italy! <noreply@example.it>");
        assert_eq!(sent[0].reply_to.as_deref(), Some("info@example.it"));

        assert!(mailer.send("nobody", "x", String::new()).await.is_err());
        assert_eq!(outbox.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_is_null() {
        let mailer = Mailer::from_config(None).await;
        assert_eq!(mailer.provider_name(), "null");
    }
}
