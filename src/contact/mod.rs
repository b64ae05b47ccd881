// Contact module - visitor enquiries, storage and notification emails
mod handlers;
pub mod notify;
mod rate_limit;
pub mod store;
mod types;

pub use handlers::{contact_status_handler, submit_contact_handler};
pub use rate_limit::RateLimiter;
pub use types::*;

use crate::db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Db(#[from] DbError),
}
