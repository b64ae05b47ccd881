use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Checkbox-style fields count as set unless absent, null, `false` or empty.
fn is_checked(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Raw contact form body, JSON or urlencoded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactSubmission {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub company: Option<String>,
    pub image: Option<String>,
    pub message: Option<String>,
    #[serde(alias = "newsletter")]
    pub news_letter: Option<Value>,
    pub privacy: Option<Value>,
}

/// A submission that passed validation; every field trimmed and clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub company: String,
    pub image: String,
    pub message: String,
    pub news_letter: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactStatus {
    pub submitted_at: String,
    pub subject: String,
}

impl ContactSubmission {
    /// The first failing rule wins; the error is the user-facing message.
    pub fn validate(&self) -> Result<Contact, String> {
        let required = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ];
        if let Some((field, _)) = required
            .iter()
            .find(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        {
            return Err(format!("{} is required", field));
        }

        let email = self.email.as_deref().unwrap_or_default().trim();
        if !is_valid_email(email) {
            return Err("Please enter a valid email address".to_string());
        }

        if !is_checked(&self.privacy) {
            return Err("You must agree to the privacy policy".to_string());
        }

        let clean =
            |value: &Option<String>| crate::text::clamp_input(value.as_deref().unwrap_or(""));
        Ok(Contact {
            first_name: clean(&self.first_name),
            last_name: clean(&self.last_name),
            email: clean(&self.email),
            phone: clean(&self.phone),
            subject: clean(&self.subject),
            company: clean(&self.company),
            image: clean(&self.image),
            message: clean(&self.message),
            news_letter: is_checked(&self.news_letter),
        })
    }
}
