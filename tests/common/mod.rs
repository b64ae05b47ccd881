#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use base64::Engine;
use galleria::{AppState, Config, build_router};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ADMIN_USER: &str = "curator";
pub const ADMIN_PASSWORD: &str = "s3greto";

/// A site rooted in a temporary directory, rendering with the shipped templates.
pub struct TestSite {
    pub temp_dir: TempDir,
    pub config: Config,
}

impl TestSite {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let content = root.join("content");
        let static_dir = root.join("static");
        let images = root.join("data").join("images");
        fs::create_dir_all(&content).unwrap();
        fs::create_dir_all(&static_dir).unwrap();
        fs::create_dir_all(&images).unwrap();

        let mut config = Config::default();
        config.templates.directory = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates");
        config.static_files.directory = static_dir;
        config.gallery.content_directory = content;
        config.gallery.max_concurrent_reads = Some(2);
        config.database.path = root.join("data").join("site.db");
        config.database.images_directory = images;
        config.admin.username = ADMIN_USER.to_string();
        config.admin.password = ADMIN_PASSWORD.to_string();
        config.contact.admin_email = "owner@example.com".to_string();
        config.app.base_url = Some("https://visititaly.example".to_string());
        config.server.trust_forwarded_for = true;

        Self { temp_dir, config }
    }

    pub fn content(&self) -> &Path {
        &self.config.gallery.content_directory
    }

    pub fn write_content(&self, relative: &str, contents: impl AsRef<[u8]>) {
        let path = self.content().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub async fn state(&self) -> AppState {
        AppState::new(self.config.clone()).await
    }

    pub async fn server(&self) -> TestServer {
        TestServer::new(build_router(self.state().await)).unwrap()
    }
}

pub fn ajax() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    )
}

pub fn basic_auth(username: &str, password: &str) -> (HeaderName, HeaderValue) {
    let encoded = base64::engine::general_purpose::STANDARD
        .encode(format!("{}:{}", username, password));
    (
        axum::http::header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Basic {}", encoded)).unwrap(),
    )
}

pub fn admin_auth() -> (HeaderName, HeaderValue) {
    basic_auth(ADMIN_USER, ADMIN_PASSWORD)
}

/// Embedded XMP packet as cameras and editors write it into JPEG files.
pub fn xmp_packet(description: &str, title: &str) -> String {
    format!(
        r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about="" xmlns:dc="http://purl.org/dc/elements/1.1/">
   <dc:description><rdf:Alt><rdf:li xml:lang="x-default">{}</rdf:li></rdf:Alt></dc:description>
   <dc:title><rdf:Alt><rdf:li xml:lang="x-default">{}</rdf:li></rdf:Alt></dc:title>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>"#,
        description, title
    )
}
