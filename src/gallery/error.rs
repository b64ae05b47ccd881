use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid path")]
    InvalidPath,

    #[error("Not found")]
    NotFound,
}

impl GalleryError {
    /// Both rejection kinds surface to callers as a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GalleryError::NotFound | GalleryError::InvalidPath)
    }
}
