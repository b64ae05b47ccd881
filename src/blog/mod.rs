// Blog module - SQLite-backed posts with filtering, facets and pagination
mod handlers;
mod metadata;
mod pagination;
pub mod store;
mod types;

pub use handlers::{
    blog_filters_handler, blog_image_handler, blog_index_handler, blog_post_detail_handler,
    blog_segment_handler,
};
pub use metadata::{BlogPageMetadata, DEFAULT_BLOG_IMAGE, blog_metadata, post_metadata};
pub use pagination::{PageLink, Pagination, page_url, paginate};
pub use types::*;

use crate::db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Post not found")]
    NotFound,
}

/// Pages needed for `total` posts, never less than one.
pub fn total_pages(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 5);
    }
}
