use super::{Breadcrumb, ContentRoot, HierarchicalMetadata, RelPath};
use std::path::Path;
use tracing::trace;

const KEYWORDS_FILE: &str = "keywords.txt";

/// Home followed by one crumb per component, each carrying the accumulated path.
pub fn breadcrumbs(rel: &RelPath) -> Vec<Breadcrumb> {
    let mut crumbs = vec![Breadcrumb::home()];
    let mut current = RelPath::root();
    for component in rel.components() {
        current = current.join(component);
        crumbs.push(Breadcrumb::new(component, current.as_str()));
    }
    crumbs
}

/// Keywords from `keywords.txt` at `rel` and every ancestor up to the root,
/// nearest folder first, duplicates dropped on first sight.
pub fn collect_keywords(root: &ContentRoot, rel: &RelPath) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    let mut current = root.absolute(rel);

    loop {
        if !current.starts_with(root.path()) {
            break;
        }

        for keyword in read_keywords(root, &current.join(KEYWORDS_FILE)) {
            if !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => break,
        }
    }

    keywords
}

pub fn walk(root: &ContentRoot, rel: &RelPath) -> HierarchicalMetadata {
    HierarchicalMetadata {
        keywords: collect_keywords(root, rel),
        breadcrumbs: breadcrumbs(rel),
    }
}

fn read_keywords(root: &ContentRoot, path: &Path) -> Vec<String> {
    if !root.admits_entry(path) {
        return Vec::new();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => content
            .trim()
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            trace!("No keywords at {:?}: {}", path, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn rel(s: &str) -> RelPath {
        super::super::path::normalize(s).unwrap()
    }

    fn setup() -> (TempDir, ContentRoot) {
        let temp_dir = TempDir::new().unwrap();
        let content = temp_dir.path().join("content");
        fs::create_dir_all(content.join("Nord/Lakes/Como")).unwrap();
        fs::write(temp_dir.path().join(KEYWORDS_FILE), "outside").unwrap();
        fs::write(content.join(KEYWORDS_FILE), "italy, travel").unwrap();
        fs::write(content.join("Nord").join(KEYWORDS_FILE), "nord, italy").unwrap();
        fs::write(content.join("Nord/Lakes/Como").join(KEYWORDS_FILE), " , como,,lake ,").unwrap();
        let root = ContentRoot::new(&content);
        (temp_dir, root)
    }

    #[test]
    fn test_breadcrumbs_accumulate_paths() {
        let crumbs = breadcrumbs(&rel("Nord/Lakes/Como"));
        assert_eq!(
            crumbs,
            vec![
                Breadcrumb::new("Home", ""),
                Breadcrumb::new("Nord", "Nord"),
                Breadcrumb::new("Lakes", "Nord/Lakes"),
                Breadcrumb::new("Como", "Nord/Lakes/Como"),
            ]
        );
        assert_eq!(breadcrumbs(&RelPath::root()), vec![Breadcrumb::home()]);
    }

    #[test]
    fn test_keywords_nearest_first_without_duplicates() {
        let (_t, root) = setup();
        assert_eq!(collect_keywords(&root, &rel("Nord")), vec!["nord", "italy", "travel"]);
    }

    #[test]
    fn test_keywords_stop_at_root() {
        let (_t, root) = setup();
        let keywords = collect_keywords(&root, &RelPath::root());
        assert_eq!(keywords, vec!["italy", "travel"]);
    }

    #[test]
    fn test_levels_without_file_are_skipped() {
        let (_t, root) = setup();
        assert_eq!(
            collect_keywords(&root, &rel("Nord/Lakes/Como")),
            vec!["como", "lake", "nord", "italy", "travel"]
        );
    }

    #[test]
    fn test_keywords_are_monotonic_towards_leaves() {
        let (_t, root) = setup();
        let chain = ["", "Nord", "Nord/Lakes", "Nord/Lakes/Como"];
        for pair in chain.windows(2) {
            let parent = collect_keywords(&root, &rel(pair[0]));
            let child = collect_keywords(&root, &rel(pair[1]));
            assert!(parent.iter().all(|k| child.contains(k)), "{:?} vs {:?}", pair, child);
        }
    }
}
