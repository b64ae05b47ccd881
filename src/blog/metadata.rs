use super::{PostDetail, PostFilter, PostSummary};
use crate::gallery::Breadcrumb;
use serde::Serialize;
use serde_json::{Value, json};

pub const DEFAULT_BLOG_IMAGE: &str = "/static/img/blog-default.jpg";
const STOP_WORDS: [&str; 9] = [
    "with", "that", "this", "from", "they", "have", "been", "were", "said",
];
const LISTING_KEYWORDS: usize = 15;
const POST_KEYWORDS: usize = 10;
const POST_DESCRIPTION_LEN: usize = 160;

/// Head and structured-data fields for blog pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogPageMetadata {
    pub page_title: String,
    pub meta_description: String,
    pub meta_keywords: String,
    pub og_image: String,
    pub og_type: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub schema_json: String,
}

fn significant_words(title: &str) -> impl Iterator<Item = String> + '_ {
    title
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .map(str::to_lowercase)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
}

/// Order-preserving dedup, then cap.
fn finish_keywords(keywords: Vec<String>, cap: usize) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for keyword in keywords {
        if !keyword.is_empty() && !unique.contains(&keyword) {
            unique.push(keyword);
        }
    }
    unique.truncate(cap);
    unique
}

fn pretty(schema: &Value) -> String {
    serde_json::to_string_pretty(schema).unwrap_or_default()
}

fn filter_crumb(name: &str, key: &str) -> Breadcrumb {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(key, name)
        .finish();
    Breadcrumb::new(name, format!("/blog?{}", query))
}

/// Metadata for a listing page; `page_url` is the absolute request URL.
pub fn blog_metadata(
    app_title: &str,
    posts: &[PostSummary],
    filter: &PostFilter,
    page_url: &str,
) -> BlogPageMetadata {
    let mut title_parts = Vec::new();
    let mut description_parts = Vec::new();
    let mut keywords = Vec::new();

    if !filter.search.is_empty() {
        title_parts.push(format!("Search: \"{}\"", filter.search));
        description_parts.push(format!("posts matching \"{}\"", filter.search));
        keywords.extend(filter.search.split_whitespace().map(str::to_string));
    }
    if !filter.category.is_empty() {
        title_parts.push(format!("Category: {}", filter.category));
        description_parts.push(format!("{} posts", filter.category));
        keywords.push(filter.category.to_lowercase());
    }
    if !filter.province.is_empty() {
        title_parts.push(format!("Province: {}", filter.province));
        description_parts.push(format!("posts from {}", filter.province));
        keywords.push(filter.province.to_lowercase());
    }
    if !filter.city.is_empty() {
        title_parts.push(format!("City: {}", filter.city));
        description_parts.push(format!("posts from {}", filter.city));
        keywords.push(filter.city.to_lowercase());
    }
    if !filter.author.is_empty() {
        title_parts.push(format!("Author: {}", filter.author));
        description_parts.push(format!("posts by {}", filter.author));
        keywords.push(filter.author.to_lowercase());
    }

    let (page_title, meta_description) = if title_parts.is_empty() {
        (
            app_title.to_string(),
            "Explore our collection of blog posts covering various topics and locations."
                .to_string(),
        )
    } else {
        (
            format!("{} - {}", title_parts.join(" | "), app_title),
            format!("Browse {} on {}.", description_parts.join(" and "), app_title),
        )
    };

    let og_image = posts
        .first()
        .map(|post| post.image.as_str())
        .filter(|image| !image.is_empty() && !image.starts_with("/static/"))
        .unwrap_or(DEFAULT_BLOG_IMAGE)
        .to_string();

    for post in posts.iter().take(5) {
        keywords.extend(significant_words(&post.title).take(3));
        if !post.category.is_empty() {
            keywords.push(post.category.to_lowercase());
        }
    }
    let keywords = finish_keywords(keywords, LISTING_KEYWORDS).join(", ");

    let mut breadcrumbs = vec![Breadcrumb::new("Home", "/"), Breadcrumb::new("Blog", "/blog")];
    for (value, key) in [
        (&filter.category, "category"),
        (&filter.province, "province"),
        (&filter.city, "city"),
        (&filter.author, "author"),
    ] {
        if !value.is_empty() {
            breadcrumbs.push(filter_crumb(value, key));
        }
    }

    let mut schema = json!({
        "@context": "https://schema.org",
        "@type": "Blog",
        "name": format!("{} Blog", app_title),
        "description": meta_description,
        "url": page_url,
        "keywords": keywords,
    });
    if !posts.is_empty() {
        let entries: Vec<Value> = posts
            .iter()
            .take(10)
            .map(|post| {
                let mut entry = json!({
                    "@type": "BlogPosting",
                    "headline": post.title,
                    "description": post.excerpt,
                    "datePublished": post.date,
                    "author": { "@type": "Person", "name": post.author },
                    "image": post.image,
                });
                if !post.category.is_empty() {
                    entry["keywords"] = json!(post.category);
                }
                entry
            })
            .collect();
        schema["blogPost"] = Value::Array(entries);
    }

    BlogPageMetadata {
        page_title,
        meta_description,
        meta_keywords: keywords,
        og_image,
        og_type: "website".to_string(),
        breadcrumbs,
        schema_json: pretty(&schema),
    }
}

/// Metadata for a single post.
pub fn post_metadata(app_title: &str, post: &PostDetail) -> BlogPageMetadata {
    let meta_description = if post.excerpt.is_empty() {
        let text = crate::text::strip_simple_tags(&post.content);
        text.chars().take(POST_DESCRIPTION_LEN).collect()
    } else {
        post.excerpt.clone()
    };

    let mut keywords: Vec<String> = significant_words(&post.title).take(5).collect();
    for value in [&post.category, &post.province, &post.city] {
        if !value.is_empty() {
            keywords.push(value.to_lowercase());
        }
    }
    keywords.extend(
        post.author
            .to_lowercase()
            .split_whitespace()
            .take(2)
            .map(str::to_string),
    );
    let keywords = finish_keywords(keywords, POST_KEYWORDS).join(", ");

    let mut schema = json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "description": meta_description,
        "datePublished": post.date,
        "dateModified": post.modified_date,
        "author": { "@type": "Person", "name": post.author },
        "publisher": { "@type": "Organization", "name": app_title },
        "image": { "@type": "ImageObject", "url": post.image_url },
    });
    if !post.category.is_empty() {
        schema["keywords"] = json!(post.category);
    }
    let location: Vec<&str> = [post.city.as_str(), post.province.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
    if !location.is_empty() {
        schema["locationCreated"] = json!({ "@type": "Place", "name": location.join(", ") });
    }

    BlogPageMetadata {
        page_title: format!("{} - {}", post.title, app_title),
        meta_description,
        meta_keywords: keywords,
        og_image: post.image_url.clone(),
        og_type: "article".to_string(),
        breadcrumbs: vec![
            Breadcrumb::new("Home", "/"),
            Breadcrumb::new("Blog", "/blog"),
            Breadcrumb::new(post.title.clone(), format!("/blog/post/{}", post.id)),
        ],
        schema_json: pretty(&schema),
    }
}
