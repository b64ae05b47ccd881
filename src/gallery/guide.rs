use super::{ContentRoot, Guide, RelPath};
use crate::text;
use tracing::debug;

pub const GUIDE_MISSING: &str = "Guide missing! Check back later.";
pub const DEFAULT_META_DESCRIPTION: &str = "Browse our Guides";
pub const META_DESCRIPTION_LEN: usize = 155;

pub fn guide_file_name(rel: &RelPath) -> String {
    match rel.last() {
        Some(last) => format!("{} Guide.txt", last),
        None => "Guide.txt".to_string(),
    }
}

/// Guide text for a folder plus the plain-text description derived from it.
pub fn load_guide(root: &ContentRoot, rel: &RelPath) -> Guide {
    let path = root.absolute(rel).join(guide_file_name(rel));

    let content = if root.admits_entry(&path) {
        std::fs::read_to_string(&path).map(|s| s.trim().to_string())
    } else {
        Err(std::io::Error::from(std::io::ErrorKind::NotFound))
    };

    match content {
        Ok(text) => Guide {
            meta_description: meta_description(&text),
            text,
        },
        Err(e) => {
            debug!("Guide unavailable at {:?}: {}", path, e);
            Guide {
                text: GUIDE_MISSING.to_string(),
                meta_description: meta_description(GUIDE_MISSING),
            }
        }
    }
}

/// Tag-stripped, entity-decoded and length-capped. Empty input keeps the default.
pub fn meta_description(html: &str) -> String {
    if html.is_empty() {
        return DEFAULT_META_DESCRIPTION.to_string();
    }
    text::plain_summary(html, META_DESCRIPTION_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_guide_file_names() {
        assert_eq!(guide_file_name(&RelPath::root()), "Guide.txt");
        let rel = RelPath::root().join("Nord").join("Lakes");
        assert_eq!(guide_file_name(&rel), "Lakes Guide.txt");
    }

    #[test]
    fn test_root_guide_is_trimmed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Guide.txt"), "\n  Welcome.  \n").unwrap();
        let root = ContentRoot::new(temp_dir.path());

        let guide = load_guide(&root, &RelPath::root());
        assert_eq!(guide.text, "Welcome.");
        assert_eq!(guide.meta_description, "Welcome.");
    }

    #[test]
    fn test_missing_guide_uses_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("Sud")).unwrap();
        let root = ContentRoot::new(temp_dir.path());

        let guide = load_guide(&root, &RelPath::root().join("Sud"));
        assert_eq!(guide.text, GUIDE_MISSING);
        assert_eq!(guide.meta_description, GUIDE_MISSING);
    }

    #[test]
    fn test_meta_description_strips_markup_and_truncates() {
        assert_eq!(
            meta_description("<p>Caff&egrave; &amp; <b>gelato</b></p>"),
            "Caffè & gelato"
        );

        let long = format!("<p>{}</p>", "a".repeat(200));
        let meta = meta_description(&long);
        assert_eq!(meta, format!("{}...", "a".repeat(155)));

        let exact = "b".repeat(155);
        assert_eq!(meta_description(&exact), exact);
    }

    #[test]
    fn test_empty_guide_keeps_default_description() {
        assert_eq!(meta_description(""), DEFAULT_META_DESCRIPTION);
    }
}
