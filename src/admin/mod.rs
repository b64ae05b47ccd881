// Admin module - password-protected blog post management
mod auth;
mod handlers;

pub use auth::{basic_credentials, challenge, is_authorized, require_admin};
pub use handlers::{
    add_post_form_handler, add_post_handler, admin_index_handler, delete_post_handler,
    edit_post_form_handler, edit_post_handler,
};
