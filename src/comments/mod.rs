// Comments module - per-image visitor comments
mod handlers;
pub mod store;

pub use handlers::{
    add_comment_handler, comments_modal_handler, list_comments_handler, post_comment_handler,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub image_name: String,
    pub author: String,
    pub comment: String,
    pub created: String,
}

impl Comment {
    /// `MM/DD/YYYY HH:MM:SS AM`, or the stored value when it doesn't parse.
    pub fn created_display(&self) -> String {
        chrono::NaiveDateTime::parse_from_str(&self.created, "%Y-%m-%d %H:%M:%S")
            .map(|dt| dt.format("%m/%d/%Y %I:%M:%S %p").to_string())
            .unwrap_or_else(|_| self.created.clone())
    }
}

/// Submitted by both the AJAX and the server-rendered forms.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommentForm {
    pub image_name: String,
    pub author: String,
    pub comment: String,
    pub image_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub image_name: String,
    pub author: String,
    pub comment: String,
}

impl CommentForm {
    /// `None` when the image, author or comment is blank.
    pub fn validate(&self) -> Option<NewComment> {
        let comment = NewComment {
            image_name: self.image_name.trim().to_string(),
            author: crate::text::clamp_input(&self.author),
            comment: crate::text::clamp_input(&self.comment),
        };
        let complete = !comment.image_name.is_empty()
            && !comment.author.is_empty()
            && !comment.comment.is_empty();
        complete.then_some(comment)
    }
}
