use galleria::email::{
    EmailConfig, EmailMessage, EmailProviderConfig, Mailer, create_provider,
    providers::NullProvider,
};
use std::sync::Arc;

#[tokio::test]
async fn test_null_provider_integration() {
    let email_config = EmailConfig {
        from_address: "noreply@example.com".to_string(),
        from_name: Some("Test App".to_string()),
        reply_to: Some("support@example.com".to_string()),
        provider: EmailProviderConfig::Null,
    };

    let provider = create_provider(&email_config.provider).await.unwrap();
    assert_eq!(provider.name(), "null");

    let message = EmailMessage::new(
        email_config.sender(),
        "user@example.com",
        "Test Email from Null Provider",
    )
    .with_text("This is a test email that will only be logged.")
    .with_reply_to(email_config.reply_to.clone());

    assert!(provider.send_email(message).await.is_ok());
}

#[tokio::test]
async fn test_configured_null_mailer_sends_through_provider() {
    let email_config = EmailConfig {
        from_address: "contact@visititaly.example".to_string(),
        from_name: Some("Visit Italy!".to_string()),
        reply_to: None,
        provider: EmailProviderConfig::Null,
    };

    let mailer = Mailer::from_config(Some(&email_config)).await;
    assert_eq!(mailer.provider_name(), "null");
    mailer
        .send(
            "ada@example.com",
            "Thank you for contacting us",
            "We received your message.".to_string(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_outbox_records_messages_in_order() {
    let outbox = Arc::new(NullProvider::new());
    let mailer = Mailer::new("site@example.com", None, outbox.clone());

    mailer.send("a@example.com", "First", "one".to_string()).await.unwrap();
    mailer.send("b@example.com", "Second", "two".to_string()).await.unwrap();

    let sent = outbox.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, vec!["a@example.com".to_string()]);
    assert_eq!(sent[1].subject, "Second");
    assert_eq!(sent[1].text, "two");
}
