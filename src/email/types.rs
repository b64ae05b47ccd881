use serde::Serialize;

/// A plain-text message ready for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub from: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
}

impl EmailMessage {
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            from: from.into(),
            reply_to: None,
            subject: subject.into(),
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_reply_to(mut self, reply_to: Option<String>) -> Self {
        self.reply_to = reply_to;
        self
    }

    /// Every recipient must at least look like `local@domain`.
    pub fn validate(&self) -> Result<(), super::EmailError> {
        if self.to.is_empty() {
            return Err(super::EmailError::InvalidAddress("no recipients".to_string()));
        }
        match self
            .to
            .iter()
            .find(|addr| !addr.contains('@') || addr.starts_with('@') || addr.ends_with('@'))
        {
            Some(bad) => Err(super::EmailError::InvalidAddress(bad.clone())),
            None => Ok(()),
        }
    }
}
