use crate::{
    AppState,
    gallery::{Breadcrumb, Gallery, breadcrumbs},
    request::{absolute_url, referer},
    templating::flatten_into,
};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

const ABOUT_FILE: &str = "about.txt";
const SITE_DESCRIPTION: &str = "Learn more about our Italy photo gallery and travel experiences.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OriginQuery {
    from: Option<String>,
}

#[derive(Debug, Serialize)]
struct PageHead {
    breadcrumbs: Vec<Breadcrumb>,
    page_title: String,
    meta_description: String,
    meta_keywords: String,
    og_type: String,
    schema_json: String,
}

/// The gallery folder a visitor came from: an explicit path, else a
/// `/folder/...` URL in the `from` query or the referer.
pub fn origin_folder(
    from_path: Option<String>,
    from_query: Option<&str>,
    referer: Option<&str>,
) -> Option<String> {
    if let Some(path) = from_path.filter(|p| !p.is_empty()) {
        return Some(path);
    }

    let referrer = from_query.filter(|q| !q.is_empty()).or(referer)?;
    let base = url::Url::parse("http://localhost/").ok()?;
    let parsed = base.join(referrer).ok()?;
    let (_, folder) = parsed.path().split_once("/folder/")?;
    urlencoding::decode(folder).ok().map(|f| f.into_owned())
}

/// Breadcrumbs of the origin folder followed by `last`; Home alone when the
/// origin is missing or does not resolve.
pub fn origin_breadcrumbs(
    gallery: &Gallery,
    origin: Option<String>,
    last: Breadcrumb,
) -> Vec<Breadcrumb> {
    let mut crumbs = match origin.map(|o| gallery.resolve(&o)) {
        Some(Ok(rel)) => breadcrumbs(&rel),
        Some(Err(e)) => {
            debug!("Ignoring origin folder: {}", e);
            vec![Breadcrumb::home()]
        }
        None => vec![Breadcrumb::home()],
    };
    crumbs.push(last);
    crumbs
}

fn schema(kind: &str, name: &str, description: &str, url: &str) -> String {
    serde_json::to_string_pretty(&json!({
        "@context": "https://schema.org",
        "@type": kind,
        "name": name,
        "description": description,
        "url": url,
    }))
    .unwrap_or_default()
}

async fn read_about(gallery: &Gallery) -> String {
    let path = gallery.root().path().join(ABOUT_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => text.trim().to_string(),
        Err(_) => String::new(),
    }
}

pub async fn about_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    from_path: Option<Path<String>>,
    Query(query): Query<OriginQuery>,
) -> Response {
    let origin = origin_folder(
        from_path.map(|Path(p)| p),
        query.from.as_deref(),
        referer(&headers),
    );
    let crumbs = origin_breadcrumbs(
        &app_state.gallery,
        origin,
        Breadcrumb::new("About", "/about"),
    );

    let about_content = read_about(&app_state.gallery).await;
    let meta_description = if about_content.is_empty() {
        SITE_DESCRIPTION.to_string()
    } else {
        about_content.clone()
    };
    let url = absolute_url(app_state.config.app.base_url.as_deref(), &headers, "/about");

    let head = PageHead {
        breadcrumbs: crumbs,
        page_title: format!("About - {}", app_state.config.app.name),
        schema_json: schema("AboutPage", "About", &meta_description, &url),
        meta_description,
        meta_keywords: "about, Italy, travel, photography, gallery".to_string(),
        og_type: "website".to_string(),
    };

    let mut globals = liquid::object!({
        "app_name": app_state.config.app.name,
        "about_content": about_content,
    });
    flatten_into(&mut globals, &head);
    app_state
        .template_engine
        .render_page("about.html.liquid", globals)
        .await
}

pub async fn contact_page_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    from_path: Option<Path<String>>,
    Query(query): Query<OriginQuery>,
) -> Response {
    let origin = origin_folder(
        from_path.map(|Path(p)| p),
        query.from.as_deref(),
        referer(&headers),
    );
    let crumbs = origin_breadcrumbs(
        &app_state.gallery,
        origin.clone(),
        Breadcrumb::new("Contact", "/contact"),
    );
    let url = absolute_url(app_state.config.app.base_url.as_deref(), &headers, "/contact");

    let head = PageHead {
        breadcrumbs: crumbs,
        page_title: format!("Contact - {}", app_state.config.app.name),
        meta_description: SITE_DESCRIPTION.to_string(),
        meta_keywords: "contact, Italy, travel, photography, gallery".to_string(),
        og_type: "website".to_string(),
        schema_json: schema("ContactPage", "Contact", SITE_DESCRIPTION, &url),
    };

    let mut globals = liquid::object!({
        "app_name": app_state.config.app.name,
        "origin_folder": origin.unwrap_or_default(),
    });
    flatten_into(&mut globals, &head);
    app_state
        .template_engine
        .render_page("contact.html.liquid", globals)
        .await
}

pub async fn privacy_handler(State(app_state): State<AppState>) -> Response {
    let globals = liquid::object!({
        "app_name": app_state.config.app.name,
        "page_title": format!("Privacy - {}", app_state.config.app.name),
    });
    app_state
        .template_engine
        .render_page("parts/privacy.html.liquid", globals)
        .await
}
