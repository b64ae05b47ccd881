use super::{FolderListing, Guide, HierarchicalMetadata, PageMetadata, RelPath};
use serde::Serialize;

const MAX_KEYWORDS: usize = 10;
const MAX_SCHEMA_IMAGES: usize = 5;

#[derive(Serialize)]
struct ImageGallerySchema<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
    name: &'a str,
    description: &'a str,
    keywords: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    image: Vec<String>,
}

pub fn compose(
    app_title: &str,
    rel: &RelPath,
    listing: &FolderListing,
    hierarchy: HierarchicalMetadata,
    guide: Guide,
) -> PageMetadata {
    let folder_name = rel.last().unwrap_or(app_title).to_string();
    let page_title = if rel.is_root() {
        app_title.to_string()
    } else {
        format!("{} - {}", folder_name, app_title)
    };

    let mut keywords = hierarchy.keywords;
    keywords.truncate(MAX_KEYWORDS);
    let meta_keywords = keywords.join(", ");

    let og_image = match (listing.images.first(), listing.folders.first()) {
        (Some(image), _) => image.url.clone(),
        (None, Some(folder)) if !folder.thumbnail.is_sentinel() => folder.thumbnail_url.clone(),
        _ => String::new(),
    };

    let schema = ImageGallerySchema {
        context: "https://schema.org",
        kind: "ImageGallery",
        name: &folder_name,
        description: &guide.meta_description,
        keywords: &meta_keywords,
        image: listing
            .images
            .iter()
            .take(MAX_SCHEMA_IMAGES)
            .map(|image| image.url.clone())
            .collect(),
    };
    let schema_json = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());

    PageMetadata {
        folder_name,
        description: guide.text,
        keywords,
        breadcrumbs: hierarchy.breadcrumbs,
        page_title,
        meta_description: guide.meta_description,
        meta_keywords,
        og_image,
        og_type: "website".to_string(),
        schema_json,
    }
}
