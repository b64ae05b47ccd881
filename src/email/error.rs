use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email configuration error: {0}")]
    Config(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Email provider error: {0}")]
    Provider(String),
}
