use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

type Partials = liquid::partials::EagerCompiler<liquid::partials::InMemorySource>;

pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf) -> Self {
        Self {
            template_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn template_dir(&self) -> &std::path::Path {
        &self.template_dir
    }

    pub async fn load_template(&self, path: &str) -> Result<String, String> {
        let template_path = self.template_dir.join(path);

        let metadata = tokio::fs::metadata(&template_path)
            .await
            .map_err(|e| format!("Failed to get metadata for {}: {}", path, e))?;

        let modified = metadata
            .modified()
            .map_err(|e| format!("Failed to get modified time: {}", e))?;

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(path)
            && cached.modified >= modified
        {
            debug!("Using cached template for {}", path);
            return Ok(cached.content.clone());
        }

        info!("Loading template: {}", path);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|e| format!("Failed to read template {}: {}", path, e))?;

        cache.insert(
            path.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    /// Every `_*.liquid` file under the template directory, keyed by file name
    /// so `{% include "_header.html.liquid" %}` works from any subdirectory.
    async fn load_partials(&self) -> Partials {
        let mut partials = Partials::empty();

        for entry in walkdir::WalkDir::new(&self.template_dir)
            .follow_links(true)
            .into_iter()
            .flatten()
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !name.starts_with('_') || !name.ends_with(".liquid") {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.template_dir) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");

            match self.load_template(&relative).await {
                Ok(content) => {
                    partials.add(name.to_string(), content);
                }
                Err(e) => error!("Failed to load partial {}: {}", relative, e),
            }
        }

        partials
    }

    pub async fn render_template(
        &self,
        template_name: &str,
        globals: liquid::Object,
    ) -> Result<String, String> {
        let template_content = self.load_template(template_name).await?;
        let partials = self.load_partials().await;

        let parser = liquid::ParserBuilder::with_stdlib()
            .partials(partials)
            .build()
            .map_err(|e| format!("Failed to create parser: {}", e))?;

        let template = parser
            .parse(&template_content)
            .map_err(|e| format!("Failed to parse template: {}", e))?;

        let mut full_globals = globals;
        if !full_globals.contains_key("current_year") {
            full_globals.insert(
                "current_year".into(),
                liquid::model::Value::scalar(chrono::Utc::now().format("%Y").to_string()),
            );
        }

        template
            .render(&full_globals)
            .map_err(|e| format!("Failed to render template: {}", e))
    }

    /// Render to an HTML response, mapping failures to a logged 500.
    pub async fn render_page(&self, template_name: &str, globals: liquid::Object) -> Response {
        match self.render_template(template_name, globals).await {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!("Template rendering error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    /// As [`Self::render_page`] with revalidation forced on every view.
    pub async fn render_uncached(&self, template_name: &str, globals: liquid::Object) -> Response {
        let mut response = self.render_page(template_name, globals).await;
        if response.status().is_success() {
            response.headers_mut().insert(
                header::CACHE_CONTROL,
                header::HeaderValue::from_static("no-cache, no-store, must-revalidate"),
            );
            response
                .headers_mut()
                .insert(header::PRAGMA, header::HeaderValue::from_static("no-cache"));
            response
                .headers_mut()
                .insert(header::EXPIRES, header::HeaderValue::from_static("0"));
        }
        response
    }
}

/// Convert any serializable value into a liquid value, `nil` on failure.
pub fn to_liquid<T: serde::Serialize>(value: &T) -> liquid::model::Value {
    liquid::model::to_value(value).unwrap_or(liquid::model::Value::Nil)
}

/// Copy the fields of a serializable struct into the top level of `globals`.
pub fn flatten_into<T: serde::Serialize>(globals: &mut liquid::Object, value: &T) {
    if let liquid::model::Value::Object(fields) = to_liquid(value) {
        globals.extend(fields);
    }
}
