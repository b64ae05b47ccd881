use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod admin;
pub mod blog;
pub mod comments;
pub mod contact;
pub mod db;
pub mod email;
pub mod gallery;
pub mod pages;
pub mod request;
pub mod startup_checks;
pub mod static_files;
pub mod templating;
pub mod text;

pub const DEFAULT_ADMIN_PASSWORD: &str = "password";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub templates: TemplateConfig,
    pub static_files: StaticConfig,
    pub gallery: GalleryConfig,
    pub database: DatabaseConfig,
    pub blog: BlogConfig,
    pub admin: AdminConfig,
    pub contact: ContactConfig,
    pub email: Option<email::EmailConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Key clients by `X-Forwarded-For`; only enable behind a reverse proxy that sets it.
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub content_directory: PathBuf,
    /// Upper bound on concurrent thumbnail/caption reads; defaults to available parallelism.
    pub max_concurrent_reads: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub images_directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlogConfig {
    pub posts_per_page: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactConfig {
    pub admin_email: String,
    pub submissions_per_minute: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_posts_per_page() -> usize {
    10
}

fn default_submissions_per_minute() -> u32 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            trust_forwarded_for: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Visit Italy!".to_string(),
            log_level: default_log_level(),
            base_url: None,
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("templates"),
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("static"),
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            content_directory: PathBuf::from("content"),
            max_concurrent_reads: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/site.db"),
            images_directory: PathBuf::from("data/images"),
        }
    }
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            posts_per_page: default_posts_per_page(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            admin_email: "admin@yoursite.com".to_string(),
            submissions_per_minute: default_submissions_per_minute(),
        }
    }
}

impl Config {
    /// Apply `ADMIN_USERNAME`, `ADMIN_PASSWORD` and `ADMIN_EMAIL` from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(username) = lookup("ADMIN_USERNAME") {
            self.admin.username = username;
        }
        if let Some(password) = lookup("ADMIN_PASSWORD") {
            self.admin.password = password;
        }
        if let Some(admin_email) = lookup("ADMIN_EMAIL") {
            self.contact.admin_email = admin_email;
        }
        self
    }
}

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub template_engine: Arc<templating::TemplateEngine>,
    pub static_handler: static_files::StaticFileHandler,
    pub content_files: static_files::StaticFileHandler,
    pub blog_images: static_files::StaticFileHandler,
    pub gallery: gallery::SharedGallery,
    pub db: db::Database,
    pub mailer: email::Mailer,
    pub rate_limiter: Arc<contact::RateLimiter>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> Self {
        let template_engine = Arc::new(templating::TemplateEngine::new(
            config.templates.directory.clone(),
        ));

        let static_handler =
            static_files::StaticFileHandler::new(config.static_files.directory.clone());
        let content_files =
            static_files::StaticFileHandler::new(config.gallery.content_directory.clone());
        let blog_images =
            static_files::StaticFileHandler::new(config.database.images_directory.clone())
                .with_policy(static_files::CachePolicy::NoCache)
                .with_case_insensitive_fallback();

        let gallery = Arc::new(gallery::Gallery::new(&config.gallery, config.app.name.clone()));

        let db = db::Database::new(config.database.path.clone());
        let migrate_db = db.clone();
        match tokio::task::spawn_blocking(move || migrate_db.migrate()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to prepare database: {}", e),
            Err(e) => error!("Database migration task failed: {}", e),
        }

        let mailer = email::Mailer::from_config(config.email.as_ref()).await;
        let rate_limiter = Arc::new(contact::RateLimiter::new(
            config.contact.submissions_per_minute,
        ));

        Self {
            template_engine,
            static_handler,
            content_files,
            blog_images,
            gallery,
            db,
            mailer,
            rate_limiter,
            config,
        }
    }
}

async fn static_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    app_state.static_handler.serve(&path).await
}

pub async fn create_app(config: Config) -> Router {
    build_router(AppState::new(config).await)
}

pub fn build_router(app_state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin", get(admin::admin_index_handler))
        .route(
            "/admin/add",
            get(admin::add_post_form_handler).post(admin::add_post_handler),
        )
        .route(
            "/admin/edit/{id}",
            get(admin::edit_post_form_handler).post(admin::edit_post_handler),
        )
        .route("/admin/delete/{id}", post(admin::delete_post_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            admin::require_admin,
        ));

    Router::new()
        .route("/", get(gallery::home_handler))
        .route("/folder/{*path}", get(gallery::folder_handler))
        .route("/content/{*path}", get(gallery::content_handler))
        .route("/comments", post(comments::post_comment_handler))
        .route("/comments/add", post(comments::add_comment_handler))
        .route(
            "/comments/modal/{*image}",
            get(comments::comments_modal_handler),
        )
        .route("/comments/{*image}", get(comments::list_comments_handler))
        .route("/blog", get(blog::blog_index_handler))
        .route("/blog/filters", get(blog::blog_filters_handler))
        .route("/blog/post/{id}", get(blog::blog_post_detail_handler))
        .route("/blog/{segment}", get(blog::blog_segment_handler))
        .route("/data/images/{*path}", get(blog::blog_image_handler))
        .route("/about", get(pages::about_handler))
        .route("/about/{*from}", get(pages::about_handler))
        .route("/contact", get(pages::contact_page_handler))
        .route("/contact/status/{id}", get(contact::contact_status_handler))
        .route("/contact/{*from}", get(pages::contact_page_handler))
        .route("/contactpage", post(contact::submit_contact_handler))
        .route("/privacy", get(pages::privacy_handler))
        .route("/static/{*path}", get(static_file_handler))
        .merge(admin_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let method = request.method();
                    let uri = request.uri();
                    let headers = request.headers();
                    let user_agent = headers
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");
                    let referer = headers
                        .get("referer")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %method,
                        path = %uri.path(),
                        query = ?uri.query(),
                        user_agent = %user_agent,
                        referer = %referer,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status();
                        let size = response
                            .headers()
                            .get("content-length")
                            .and_then(|h| h.to_str().ok())
                            .unwrap_or("-");

                        tracing::info!(
                            target: "access_log",
                            status = %status,
                            size = %size,
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
