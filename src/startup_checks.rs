use crate::{Config, DEFAULT_ADMIN_PASSWORD, db::Database};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Gallery content directory does not exist: {0}")]
    ContentDirectoryMissing(String),

    #[error("Gallery content directory is not readable: {0}")]
    ContentDirectoryUnreadable(String),

    #[error("Static files directory does not exist")]
    StaticDirectoryMissing,

    #[error("Database could not be prepared: {0}")]
    DatabaseUnavailable(String),
}

impl StartupCheckError {
    /// Errors that leave the site unable to serve its main pages.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::ContentDirectoryMissing(_)
                | Self::ContentDirectoryUnreadable(_)
                | Self::DatabaseUnavailable(_)
        )
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let content_dir = Path::new(&config.gallery.content_directory);
    if !content_dir.exists() {
        error!("Gallery content directory does not exist: {:?}", content_dir);
        errors.push(StartupCheckError::ContentDirectoryMissing(
            content_dir.display().to_string(),
        ));
    } else {
        match tokio::fs::read_dir(content_dir).await {
            Ok(_) => info!("Gallery content directory is accessible: {:?}", content_dir),
            Err(e) => {
                error!("Gallery content directory is not accessible: {}", e);
                errors.push(StartupCheckError::ContentDirectoryUnreadable(
                    content_dir.display().to_string(),
                ));
            }
        }
    }

    let static_dir = Path::new(&config.static_files.directory);
    if !static_dir.exists() {
        warn!("Static files directory does not exist: {:?}", static_dir);
        errors.push(StartupCheckError::StaticDirectoryMissing);
    } else {
        info!("Static files directory exists: {:?}", static_dir);
    }

    let templates_dir = Path::new(&config.templates.directory);
    if !templates_dir.exists() {
        warn!("Templates directory does not exist: {:?}", templates_dir);
        warn!("This may cause issues with page rendering");
    } else {
        info!("Templates directory exists: {:?}", templates_dir);
    }

    let db = Database::new(config.database.path.clone());
    match tokio::task::spawn_blocking(move || db.migrate()).await {
        Ok(Ok(())) => info!("Database is ready: {:?}", config.database.path),
        Ok(Err(e)) => {
            error!("Database check failed: {}", e);
            errors.push(StartupCheckError::DatabaseUnavailable(e.to_string()));
        }
        Err(e) => {
            error!("Database check task failed: {}", e);
            errors.push(StartupCheckError::DatabaseUnavailable(e.to_string()));
        }
    }

    if config.admin.password == DEFAULT_ADMIN_PASSWORD {
        warn!("Admin area is using the default password; set ADMIN_PASSWORD");
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
