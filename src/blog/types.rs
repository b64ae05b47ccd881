use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.jpg";
const EXCERPT_LIMIT: usize = 200;
const EXCERPT_CUT: usize = 197;

/// One row of the `blogs` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub slug: Option<String>,
    pub date: String,
    pub modified_date: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub image: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub next_post_slug: Option<String>,
    pub prev_post_slug: Option<String>,
}

impl BlogPost {
    /// Site-relative image URL, the placeholder when none is stored.
    pub fn image_url(&self) -> String {
        match self.image.as_deref().map(str::trim) {
            None | Some("") => PLACEHOLDER_IMAGE.to_string(),
            Some(image) if image.starts_with('/') || image.starts_with("http") => image.to_string(),
            Some(image) => format!("/{}", image),
        }
    }

    /// The stored excerpt, else the tag-stripped content cut near 200 chars.
    pub fn display_excerpt(&self) -> String {
        if let Some(excerpt) = self.excerpt.as_deref()
            && !excerpt.is_empty()
        {
            return excerpt.to_string();
        }

        let text = crate::text::strip_simple_tags(self.content.as_deref().unwrap_or(""));
        if text.chars().count() > EXCERPT_LIMIT {
            let mut cut: String = text.chars().take(EXCERPT_CUT).collect();
            cut.push_str("...");
            cut
        } else {
            text
        }
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone().filter(|s| !s.is_empty()),
            author: self.author.clone().unwrap_or_else(|| "Unknown".to_string()),
            date: self.date.clone(),
            excerpt: self.display_excerpt(),
            image: self.image_url(),
            category: self.category.clone().unwrap_or_default(),
            province: self.province.clone().unwrap_or_default(),
            city: self.city.clone().unwrap_or_default(),
        }
    }

    pub fn detail(&self) -> PostDetail {
        PostDetail {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone().unwrap_or_else(|| self.id.to_string()),
            image_url: self.image_url(),
            content: self.content.clone().unwrap_or_default(),
            author: self.author.clone().unwrap_or_else(|| "Unknown".to_string()),
            date: self.date.clone(),
            modified_date: self.modified_date.clone().unwrap_or_else(|| self.date.clone()),
            category: self.category.clone().unwrap_or_default(),
            province: self.province.clone().unwrap_or_default(),
            city: self.city.clone().unwrap_or_default(),
            excerpt: self.excerpt.clone().unwrap_or_default(),
            next_post_slug: self.next_post_slug.clone(),
            prev_post_slug: self.prev_post_slug.clone(),
        }
    }
}

/// A post as shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub slug: Option<String>,
    pub author: String,
    pub date: String,
    pub excerpt: String,
    pub image: String,
    pub category: String,
    pub province: String,
    pub city: String,
}

/// A post as shown on its own page or in the detail drawer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub image_url: String,
    pub content: String,
    pub author: String,
    pub date: String,
    pub modified_date: String,
    pub category: String,
    pub province: String,
    pub city: String,
    pub excerpt: String,
    pub next_post_slug: Option<String>,
    pub prev_post_slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Facets {
    pub categories: Vec<FacetCount>,
    pub provinces: Vec<FacetCount>,
    pub cities: Vec<FacetCount>,
    pub authors: Vec<FacetCount>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterValues {
    pub categories: Vec<String>,
    pub provinces: Vec<String>,
    pub cities: Vec<String>,
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    TitleAsc,
    TitleDesc,
    DateAsc,
    #[default]
    DateDesc,
    AuthorAsc,
    AuthorDesc,
}

impl SortOrder {
    /// Unknown values fall back to newest first.
    pub fn parse(value: &str) -> Self {
        match value {
            "title_asc" => Self::TitleAsc,
            "title_desc" => Self::TitleDesc,
            "date_asc" => Self::DateAsc,
            "author_asc" => Self::AuthorAsc,
            "author_desc" => Self::AuthorDesc,
            _ => Self::DateDesc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TitleAsc => "title_asc",
            Self::TitleDesc => "title_desc",
            Self::DateAsc => "date_asc",
            Self::DateDesc => "date_desc",
            Self::AuthorAsc => "author_asc",
            Self::AuthorDesc => "author_desc",
        }
    }

    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            Self::TitleAsc => "title ASC",
            Self::TitleDesc => "title DESC",
            Self::DateAsc => "date ASC",
            Self::DateDesc => "date DESC",
            Self::AuthorAsc => "author ASC",
            Self::AuthorDesc => "author DESC",
        }
    }
}

/// Raw listing query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlogQuery {
    pub search: String,
    pub category: String,
    pub province: String,
    pub city: String,
    pub author: String,
    pub sort: String,
}

/// Listing filters; every non-empty field is ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub search: String,
    pub category: String,
    pub province: String,
    pub city: String,
    pub author: String,
    pub sort: SortOrder,
}

impl From<BlogQuery> for PostFilter {
    fn from(query: BlogQuery) -> Self {
        Self {
            search: query.search.trim().to_string(),
            category: query.category,
            province: query.province,
            city: query.city,
            author: query.author,
            sort: SortOrder::parse(&query.sort),
        }
    }
}

impl PostFilter {
    pub fn is_filtered(&self) -> bool {
        !(self.search.is_empty()
            && self.category.is_empty()
            && self.province.is_empty()
            && self.city.is_empty()
            && self.author.is_empty())
    }
}

/// Current filter values echoed back to the page.
#[derive(Debug, Clone, Serialize)]
pub struct FilterState {
    pub search_query: String,
    pub category_filter: String,
    pub province_filter: String,
    pub city_filter: String,
    pub author_filter: String,
    pub sort_by: String,
}

impl From<&PostFilter> for FilterState {
    fn from(filter: &PostFilter) -> Self {
        Self {
            search_query: filter.search.clone(),
            category_filter: filter.category.clone(),
            province_filter: filter.province.clone(),
            city_filter: filter.city.clone(),
            author_filter: filter.author.clone(),
            sort_by: filter.sort.as_str().to_string(),
        }
    }
}

/// Admin create/edit form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub slug: String,
    pub date: String,
    pub author: String,
    pub category: String,
    pub province: String,
    pub city: String,
    pub image: String,
    pub excerpt: String,
    pub content: String,
}

/// A form that passed validation, with optional fields normalized to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub slug: Option<String>,
    pub date: String,
    pub author: String,
    pub category: String,
    pub province: Option<String>,
    pub city: Option<String>,
    pub image: Option<String>,
    pub excerpt: String,
    pub content: String,
}

impl PostForm {
    pub fn from_post(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone().unwrap_or_default(),
            date: post.date.clone(),
            author: post.author.clone().unwrap_or_default(),
            category: post.category.clone().unwrap_or_default(),
            province: post.province.clone().unwrap_or_default(),
            city: post.city.clone().unwrap_or_default(),
            image: post.image.clone().unwrap_or_default(),
            excerpt: post.excerpt.clone().unwrap_or_default(),
            content: post.content.clone().unwrap_or_default(),
        }
    }

    /// `None` when any required field is blank. Content is kept verbatim.
    pub fn validate(&self) -> Option<NewPost> {
        let clean = |value: &str| crate::text::clamp_input(value);
        let optional = |value: &str| Some(clean(value)).filter(|v| !v.is_empty());

        let post = NewPost {
            title: clean(&self.title),
            slug: optional(&self.slug),
            date: self.date.trim().to_string(),
            author: clean(&self.author),
            category: clean(&self.category),
            province: optional(&self.province),
            city: optional(&self.city),
            image: optional(&self.image),
            excerpt: clean(&self.excerpt),
            content: self.content.clone(),
        };

        let required = [
            &post.title,
            &post.date,
            &post.author,
            &post.category,
            &post.excerpt,
            &post.content,
        ];
        required.iter().all(|v| !v.trim().is_empty()).then_some(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> BlogPost {
        BlogPost {
            id: 7,
            title: "Roma".into(),
            date: "2024-03-01".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_image_url_normalization() {
        let mut p = post();
        assert_eq!(p.image_url(), PLACEHOLDER_IMAGE);
        p.image = Some("data/images/roma.jpg".into());
        assert_eq!(p.image_url(), "/data/images/roma.jpg");
        p.image = Some("https://cdn.example.com/r.jpg".into());
        assert_eq!(p.image_url(), "https://cdn.example.com/r.jpg");
    }

    #[test]
    fn test_excerpt_falls_back_to_content() {
        let mut p = post();
        p.content = Some(format!("<p>{}</p>", "x".repeat(250)));
        let excerpt = p.display_excerpt();
        assert_eq!(excerpt.chars().count(), 200);
        assert!(excerpt.ends_with("..."));

        p.content = Some("<b>short</b> text".into());
        assert_eq!(p.display_excerpt(), "short text");

        p.excerpt = Some("Given".into());
        assert_eq!(p.display_excerpt(), "Given");
    }

    #[test]
    fn test_detail_defaults() {
        let detail = post().detail();
        assert_eq!(detail.slug, "7");
        assert_eq!(detail.modified_date, "2024-03-01");
        assert_eq!(detail.author, "Unknown");
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(SortOrder::parse("title_asc"), SortOrder::TitleAsc);
        assert_eq!(SortOrder::parse("bogus"), SortOrder::DateDesc);
        assert_eq!(SortOrder::parse(""), SortOrder::DateDesc);
    }

    #[test]
    fn test_form_validation() {
        let mut form = PostForm {
            title: " Firenze ".into(),
            date: "2024-05-02".into(),
            author: "Gio".into(),
            category: "Art".into(),
            excerpt: "Uffizi".into(),
            content: "<p>Botticelli</p>".into(),
            province: "  ".into(),
            ..Default::default()
        };
        let post = form.validate().unwrap();
        assert_eq!(post.title, "Firenze");
        assert_eq!(post.province, None);
        assert_eq!(post.content, "<p>Botticelli</p>");

        form.excerpt.clear();
        assert!(form.validate().is_none());
    }
}
