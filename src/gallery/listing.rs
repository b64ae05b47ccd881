use super::{
    Caption, ContentRoot, FolderListing, GalleryError, ImageEntry, RelPath, SubfolderEntry,
    Thumbnail, guide, is_image,
};
use std::fs;
use tracing::debug;

const RESERVED_NAMES: [&str; 2] = ["about.txt", "keywords.txt"];

/// Names found in one directory, already classified and sorted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectoryScan {
    pub folders: Vec<String>,
    pub images: Vec<String>,
}

pub(crate) fn is_reserved(folder: &RelPath, name: &str) -> bool {
    RESERVED_NAMES.contains(&name) || name == guide::guide_file_name(folder)
}

/// Classify the entries of `folder` into subfolders and images.
///
/// Symlinks are followed; any whose target leaves the root is dropped. Names
/// that are not valid UTF-8 cannot be addressed by URL and are skipped.
pub fn scan_directory(
    root: &ContentRoot,
    folder: &RelPath,
) -> Result<DirectoryScan, GalleryError> {
    let full_path = root.absolute(folder);
    let entries = fs::read_dir(&full_path).map_err(|e| {
        debug!("Cannot list {:?}: {}", full_path, e);
        GalleryError::NotFound
    })?;

    let mut scan = DirectoryScan::default();

    for entry in entries.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            debug!("Skipping non UTF-8 entry in {:?}", full_path);
            continue;
        };
        if is_reserved(folder, &name) {
            continue;
        }

        let path = entry.path();
        if !root.admits_entry(&path) {
            debug!("Skipping entry outside content root: {:?}", path);
            continue;
        }

        // Follows symlinks; dangling links fall out here.
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };

        if metadata.is_dir() {
            scan.folders.push(name);
        } else if metadata.is_file() && is_image(&name) {
            scan.images.push(name);
        }
    }

    sort_case_folded(&mut scan.folders);
    sort_case_folded(&mut scan.images);

    Ok(scan)
}

pub(crate) fn sort_case_folded(names: &mut [String]) {
    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
}

pub fn subfolder_entry(folder: &RelPath, name: &str, thumbnail: Thumbnail) -> SubfolderEntry {
    let path = folder.join(name);
    SubfolderEntry {
        name: name.to_string(),
        url: path.folder_url(),
        path,
        thumbnail_url: thumbnail.url(),
        thumbnail,
    }
}

pub fn image_entry(
    root: &ContentRoot,
    folder: &RelPath,
    name: &str,
    caption: Caption,
) -> ImageEntry {
    let path_with_name = folder.join(name);
    ImageEntry {
        name: name.to_string(),
        folder_path: folder.clone(),
        absolute_path: root.absolute(&path_with_name),
        url: path_with_name.content_url(),
        comments_url: path_with_name.comments_url(),
        path_with_name,
        caption,
    }
}

/// Order both sequences by case-folded name, whatever order they arrived in.
pub(crate) fn sort_listing(listing: &mut FolderListing) {
    let key = |name: &str| name.to_lowercase();
    listing
        .folders
        .sort_by(|a, b| key(&a.name).cmp(&key(&b.name)).then_with(|| a.name.cmp(&b.name)));
    listing
        .images
        .sort_by(|a, b| key(&a.name).cmp(&key(&b.name)).then_with(|| a.name.cmp(&b.name)));
}
