use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::{
    path::{Component, Path, PathBuf},
    time::UNIX_EPOCH,
};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Long-lived for images, short for CSS/JS, moderate otherwise.
    ByContentType,
    /// Always revalidate.
    NoCache,
}

/// Streams files from one directory, refusing anything that resolves outside it.
#[derive(Clone)]
pub struct StaticFileHandler {
    pub static_dir: PathBuf,
    canonical_dir: PathBuf,
    policy: CachePolicy,
    case_insensitive_fallback: bool,
}

impl StaticFileHandler {
    pub fn new(static_dir: PathBuf) -> Self {
        let static_dir = std::path::absolute(&static_dir).unwrap_or(static_dir);
        let canonical_dir =
            std::fs::canonicalize(&static_dir).unwrap_or_else(|_| static_dir.clone());
        Self {
            static_dir,
            canonical_dir,
            policy: CachePolicy::ByContentType,
            case_insensitive_fallback: false,
        }
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// On a miss, retry matching each path component case-insensitively.
    pub fn with_case_insensitive_fallback(mut self) -> Self {
        self.case_insensitive_fallback = true;
        self
    }

    fn locate(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            warn!("Path traversal attempt: {:?}", path);
            return None;
        }

        let file_path = self.static_dir.join(relative);
        let file_path = if file_path.is_file() {
            file_path
        } else if self.case_insensitive_fallback {
            find_case_insensitive(&self.static_dir, relative)?
        } else {
            return None;
        };

        match std::fs::canonicalize(&file_path) {
            Ok(canonical) if canonical.starts_with(&self.canonical_dir) => Some(file_path),
            Ok(_) => {
                warn!("Symlink leaves served directory: {:?}", file_path);
                None
            }
            Err(_) => None,
        }
    }

    pub async fn serve(&self, path: &str) -> Response {
        debug!("Attempting to serve file {:?} from {:?}", path, self.static_dir);

        let Some(file_path) = self.locate(path) else {
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        };

        let metadata = match tokio::fs::metadata(&file_path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return (StatusCode::NOT_FOUND, "File not found").into_response(),
            Err(e) => {
                debug!("Failed to get metadata for {:?}: {}", file_path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        let file = match File::open(&file_path).await {
            Ok(file) => file,
            Err(e) => {
                debug!("Failed to open file {:?}: {}", file_path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        let content_type = mime_guess::from_path(&file_path)
            .first_or_octet_stream()
            .to_string();

        let stream = ReaderStream::new(file);
        let body = Body::from_stream(stream);

        let cache_control = match self.policy {
            CachePolicy::NoCache => "no-cache, no-store, must-revalidate",
            CachePolicy::ByContentType if content_type.starts_with("image/") => {
                "public, max-age=31536000"
            }
            CachePolicy::ByContentType
                if content_type.starts_with("text/css")
                    || content_type.starts_with("application/javascript")
                    || content_type.starts_with("text/javascript") =>
            {
                "public, max-age=300, must-revalidate"
            }
            CachePolicy::ByContentType => "public, max-age=3600",
        };

        let mut response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, cache_control)
            .header(header::CONTENT_LENGTH, metadata.len());

        if let Ok(modified) = metadata.modified()
            && let Ok(duration) = modified.duration_since(UNIX_EPOCH)
        {
            let http_date = httpdate::fmt_http_date(modified);
            response = response.header(header::LAST_MODIFIED, http_date);

            let etag = format!("\"{}-{}\"", duration.as_secs(), metadata.len());
            response = response.header(header::ETAG, etag);
        }

        match response.body(body) {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to build response for {:?}: {}", file_path, e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn find_case_insensitive(base: &Path, relative: &Path) -> Option<PathBuf> {
    let mut current = base.to_path_buf();
    for component in relative.components() {
        let Component::Normal(wanted) = component else {
            continue;
        };
        let wanted = wanted.to_str()?.to_lowercase();
        let found = std::fs::read_dir(&current)
            .ok()?
            .flatten()
            .find(|entry| {
                entry.file_name().to_str().map(str::to_lowercase).as_deref() == Some(&wanted)
            })?;
        current = found.path();
    }
    current.is_file().then_some(current)
}
