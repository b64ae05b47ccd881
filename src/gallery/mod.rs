// Gallery module - folder listings, thumbnails, captions and page metadata
mod compose;
mod error;
mod guide;
mod handlers;
mod hierarchy;
mod listing;
mod path;
mod thumbnail;
mod types;
mod xmp;

pub use compose::compose;
pub use error::GalleryError;
pub use guide::{
    DEFAULT_META_DESCRIPTION, GUIDE_MISSING, guide_file_name, load_guide, meta_description,
};
pub use handlers::{content_handler, folder_handler, home_handler};
pub use hierarchy::{breadcrumbs, collect_keywords, walk};
pub use listing::{DirectoryScan, image_entry, scan_directory, subfolder_entry};
pub use path::ContentRoot;
pub use thumbnail::{FirstPick, PickStrategy, RandomPick, pick_thumbnail};
pub use types::*;
pub use xmp::{MAX_XMP_BYTES, MAX_XMP_DEPTH, extract_caption};

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "mov"];

pub fn is_image(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub type SharedGallery = Arc<Gallery>;

pub struct Gallery {
    root: Arc<ContentRoot>,
    app_title: String,
    picker: Arc<dyn PickStrategy>,
    max_concurrency: usize,
}

enum Listed {
    Folder(SubfolderEntry),
    Image(ImageEntry),
}

impl Gallery {
    pub fn new(config: &crate::GalleryConfig, app_title: impl Into<String>) -> Self {
        let max_concurrency = config
            .max_concurrent_reads
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(4)
            .max(1);

        Self {
            root: Arc::new(ContentRoot::new(&config.content_directory)),
            app_title: app_title.into(),
            picker: Arc::new(RandomPick),
            max_concurrency,
        }
    }

    /// Replace the thumbnail chooser, e.g. with [`FirstPick`] for stable output.
    pub fn with_picker(mut self, picker: Arc<dyn PickStrategy>) -> Self {
        self.picker = picker;
        self
    }

    pub fn root(&self) -> &ContentRoot {
        &self.root
    }

    pub fn app_title(&self) -> &str {
        &self.app_title
    }

    pub fn resolve(&self, input: &str) -> Result<RelPath, GalleryError> {
        self.root.resolve(input)
    }

    /// List a resolved folder, picking thumbnails and extracting captions on a
    /// bounded pool of blocking tasks. Dropping the future aborts pending work.
    pub async fn list(&self, rel: &RelPath) -> Result<FolderListing, GalleryError> {
        let scan = {
            let root = self.root.clone();
            let rel = rel.clone();
            tokio::task::spawn_blocking(move || scan_directory(&root, &rel))
                .await
                .map_err(|e| GalleryError::IoError(std::io::Error::other(e)))??
        };

        debug!(
            "Scanned {:?}: {} folders, {} images",
            rel.as_str(),
            scan.folders.len(),
            scan.images.len()
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<Listed> = JoinSet::new();

        for name in scan.folders {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let root = self.root.clone();
            let picker = self.picker.clone();
            let rel = rel.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let folder = rel.join(&name);
                let thumbnail = catch_unwind(AssertUnwindSafe(|| {
                    pick_thumbnail(&root, &folder, picker.as_ref())
                }))
                .unwrap_or(Thumbnail::Sentinel);
                Listed::Folder(subfolder_entry(&rel, &name, thumbnail))
            });
        }

        for name in scan.images {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let root = self.root.clone();
            let rel = rel.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let absolute = root.absolute(&rel.join(&name));
                let caption =
                    catch_unwind(AssertUnwindSafe(|| xmp::extract_caption_in(&root, &absolute)))
                        .unwrap_or_default();
                Listed::Image(image_entry(&root, &rel, &name, caption))
            });
        }

        let mut listing = FolderListing::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Listed::Folder(folder)) => listing.folders.push(folder),
                Ok(Listed::Image(image)) => listing.images.push(image),
                Err(e) => warn!("Listing task for {:?} did not finish: {}", rel.as_str(), e),
            }
        }

        listing::sort_listing(&mut listing);
        Ok(listing)
    }

    pub async fn walk(&self, rel: &RelPath) -> HierarchicalMetadata {
        let root = self.root.clone();
        let rel = rel.clone();
        tokio::task::spawn_blocking(move || walk(&root, &rel))
            .await
            .unwrap_or_default()
    }

    pub async fn guide(&self, rel: &RelPath) -> Guide {
        let root = self.root.clone();
        let rel = rel.clone();
        tokio::task::spawn_blocking(move || load_guide(&root, &rel))
            .await
            .unwrap_or_else(|_| Guide {
                text: GUIDE_MISSING.to_string(),
                meta_description: meta_description(GUIDE_MISSING),
            })
    }

    /// Resolve an untrusted folder path and build everything its page shows.
    pub async fn render_folder(&self, input: &str) -> Result<FolderView, GalleryError> {
        let rel = self.resolve(input)?;
        let listing = self.list(&rel).await?;
        let (hierarchy, guide) = tokio::join!(self.walk(&rel), self.guide(&rel));
        let page = compose(&self.app_title, &rel, &listing, hierarchy, guide);

        Ok(FolderView {
            current_path: rel,
            listing,
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions() {
        for name in ["a.jpg", "b.JPEG", "c.Png", "d.gif", "e.bmp", "f.webp", "g.MOV"] {
            assert!(is_image(name), "{}", name);
        }
        for name in ["a.xmp", "Guide.txt", "jpg", ".jpg", "a.jpg.bak", "tiff.tif"] {
            assert!(!is_image(name), "{}", name);
        }
    }
}
