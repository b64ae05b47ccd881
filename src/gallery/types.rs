use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Relative URL returned for folders with no image anywhere beneath them.
pub const SENTINEL_ICON: &str = "/static/img/folder-icon.png";

/// A normalized, `/`-joined path relative to the content root.
///
/// Never contains empty, `.` or `..` components. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelPath(String);

impl RelPath {
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Build from components already known to be valid names.
    pub(crate) fn from_components<'a>(components: impl IntoIterator<Item = &'a str>) -> Self {
        let joined = components.into_iter().collect::<Vec<_>>().join("/");
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    pub fn last(&self) -> Option<&str> {
        self.components().last()
    }

    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            Self(name.to_string())
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.components().fold(root.to_path_buf(), |acc, c| acc.join(c))
    }

    /// The path with each component percent-encoded, `/` kept as separator.
    pub fn encoded(&self) -> String {
        let encoded: Vec<_> = self
            .components()
            .map(|c| urlencoding::encode(c).into_owned())
            .collect();
        encoded.join("/")
    }

    /// URL under `/content/`, each component percent-encoded.
    pub fn content_url(&self) -> String {
        format!("/content/{}", self.encoded())
    }

    /// Folder page URL; the root maps to `/`.
    pub fn folder_url(&self) -> String {
        if self.is_root() {
            "/".to_string()
        } else {
            format!("/folder/{}", self.encoded())
        }
    }

    pub fn comments_url(&self) -> String {
        format!("/comments/modal/{}", self.encoded())
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RelPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    Image(RelPath),
    Sentinel,
}

impl Thumbnail {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Thumbnail::Sentinel)
    }

    /// The value the view layer expects: a `/content/` URL or the sentinel icon.
    pub fn url(&self) -> String {
        match self {
            Thumbnail::Image(path) => path.content_url(),
            Thumbnail::Sentinel => SENTINEL_ICON.to_string(),
        }
    }
}

impl Serialize for Thumbnail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Thumbnail::Image(path) => serializer.serialize_str(path.as_str()),
            Thumbnail::Sentinel => serializer.serialize_str(SENTINEL_ICON),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Caption {
    pub title: String,
    pub full_title: String,
}

impl Caption {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.full_title.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubfolderEntry {
    pub name: String,
    pub path: RelPath,
    pub thumbnail: Thumbnail,
    pub thumbnail_url: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageEntry {
    pub name: String,
    pub folder_path: RelPath,
    pub path_with_name: RelPath,
    #[serde(skip)]
    pub absolute_path: PathBuf,
    pub url: String,
    pub comments_url: String,
    pub caption: Caption,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FolderListing {
    pub folders: Vec<SubfolderEntry>,
    pub images: Vec<ImageEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub path: String,
    pub url: String,
}

impl Breadcrumb {
    /// `path` is either a site URL starting with `/` or a gallery folder path.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let url = if path.starts_with('/') {
            path.clone()
        } else {
            RelPath::from_components(path.split('/').filter(|c| !c.is_empty())).folder_url()
        };
        Self {
            name: name.into(),
            path,
            url,
        }
    }

    pub fn home() -> Self {
        Self::new("Home", "")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchicalMetadata {
    pub keywords: Vec<String>,
    pub breadcrumbs: Vec<Breadcrumb>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guide {
    pub text: String,
    pub meta_description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMetadata {
    pub folder_name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub page_title: String,
    pub meta_description: String,
    pub meta_keywords: String,
    pub og_image: String,
    pub og_type: String,
    pub schema_json: String,
}

/// Everything the folder view needs for one request.
#[derive(Debug, Clone, Serialize)]
pub struct FolderView {
    pub current_path: RelPath,
    pub listing: FolderListing,
    pub page: PageMetadata,
}
