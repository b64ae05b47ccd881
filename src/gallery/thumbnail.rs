use super::{ContentRoot, RelPath, Thumbnail, is_image};
use rand::Rng;
use std::path::Path;
use tracing::trace;
use walkdir::WalkDir;

const MAX_WALK_DEPTH: usize = 64;

/// Chooses one index out of `len` candidates (`len > 0`).
pub trait PickStrategy: Send + Sync {
    fn choose(&self, len: usize) -> usize;
}

/// Uniform choice from the thread-local RNG, so repeated views rotate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPick;

impl PickStrategy for RandomPick {
    fn choose(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Always the first candidate in name order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstPick;

impl PickStrategy for FirstPick {
    fn choose(&self, _len: usize) -> usize {
        0
    }
}

/// Representative image for a folder: a random direct image, else the first
/// image of a depth-first walk, else the sentinel icon.
pub fn pick_thumbnail(
    root: &ContentRoot,
    folder: &RelPath,
    picker: &dyn PickStrategy,
) -> Thumbnail {
    let full_path = root.absolute(folder);

    let mut direct = direct_images(root, &full_path);
    if !direct.is_empty() {
        direct.sort_by_key(|name| name.to_lowercase());
        let index = picker.choose(direct.len()).min(direct.len() - 1);
        return Thumbnail::Image(folder.join(&direct[index]));
    }

    match first_nested_image(root, folder, &full_path) {
        Some(path) => Thumbnail::Image(path),
        None => {
            trace!("No images beneath {:?}", full_path);
            Thumbnail::Sentinel
        }
    }
}

fn direct_images(root: &ContentRoot, dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let path = entry.path();
            (is_image(&name) && path.is_file() && root.admits_entry(&path)).then_some(name)
        })
        .collect()
}

/// Depth-first, files before subdirectories at every level, names in order.
fn first_nested_image(root: &ContentRoot, folder: &RelPath, dir: &Path) -> Option<RelPath> {
    let mut walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(MAX_WALK_DEPTH)
        .follow_links(true)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter();

    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else {
            continue;
        };

        if entry.path_is_symlink() && !root.contains_target(entry.path()) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        if entry.file_type().is_file()
            && let Some(name) = entry.file_name().to_str()
            && is_image(name)
            && let Ok(relative) = entry.path().strip_prefix(dir)
        {
            let components: Option<Vec<&str>> = relative
                .components()
                .map(|c| c.as_os_str().to_str())
                .collect();
            if let Some(components) = components {
                return Some(components.into_iter().fold(folder.clone(), |acc, c| acc.join(c)));
            }
        }
    }

    None
}
