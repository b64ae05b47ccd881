use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::{
    Client,
    config::{Credentials, Region},
    types::{Body, Content, Destination, EmailContent, Message},
};
use tracing::{debug, error};

use crate::email::{EmailError, EmailMessage, EmailProvider, SesConfig};

pub struct SesProvider {
    client: Client,
}

fn utf8_content(data: &str) -> Result<Content, EmailError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| EmailError::Provider(e.to_string()))
}

impl SesProvider {
    /// Credentials come from the config when both keys are set, else the default chain.
    pub async fn new(config: &SesConfig) -> Result<Self, EmailError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials =
                    Credentials::new(access_key, secret_key, None, None, "galleria-ses");
                loader = loader.credentials_provider(credentials);
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(EmailError::Config(
                    "access_key_id and secret_access_key must be set together".to_string(),
                ));
            }
            (None, None) => {}
        }

        let client = Client::new(&loader.load().await);
        Ok(Self { client })
    }
}

#[async_trait]
impl EmailProvider for SesProvider {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        debug!("Sending email via SES to {:?}", message.to);

        let destination = Destination::builder()
            .set_to_addresses(Some(message.to.clone()))
            .build();

        let body = Body::builder().text(utf8_content(&message.text)?).build();
        let content = EmailContent::builder()
            .simple(
                Message::builder()
                    .subject(utf8_content(&message.subject)?)
                    .body(body)
                    .build(),
            )
            .build();

        let mut request = self
            .client
            .send_email()
            .from_email_address(&message.from)
            .destination(destination)
            .content(content);

        if let Some(reply_to) = &message.reply_to {
            request = request.reply_to_addresses(reply_to);
        }

        match request.send().await {
            Ok(output) => {
                debug!("SES accepted message {:?}", output.message_id());
                Ok(())
            }
            Err(e) => {
                error!("Failed to send email via SES: {}", e);
                Err(EmailError::Provider(e.to_string()))
            }
        }
    }

    fn name(&self) -> &str {
        "ses"
    }
}
