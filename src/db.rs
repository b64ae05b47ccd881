use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS blogs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    slug TEXT,
    date TEXT NOT NULL,
    modified_date TEXT,
    author TEXT,
    category TEXT,
    province TEXT,
    city TEXT,
    image TEXT,
    excerpt TEXT,
    content TEXT,
    next_post_slug TEXT,
    prev_post_slug TEXT
);
CREATE INDEX IF NOT EXISTS idx_blogs_slug ON blogs(slug);
CREATE INDEX IF NOT EXISTS idx_blogs_date ON blogs(date);

CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    imageName TEXT NOT NULL,
    author TEXT NOT NULL,
    comment TEXT NOT NULL,
    created TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_comments_image ON comments(imageName, created);

CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    firstName TEXT NOT NULL,
    lastName TEXT NOT NULL,
    email TEXT NOT NULL,
    phone TEXT,
    subject TEXT NOT NULL,
    company TEXT,
    image TEXT,
    message TEXT NOT NULL,
    newsLetter BOOLEAN DEFAULT 0,
    ipAddress TEXT,
    userAgent TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database task failed: {0}")]
    Task(String),
}

/// Location of the site database. Connections are opened per unit of work
/// on a blocking thread and closed when that work returns.
#[derive(Debug, Clone)]
pub struct Database {
    path: Arc<PathBuf>,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> Result<Connection, DbError> {
        let conn = Connection::open(self.path.as_ref())?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    /// Create the parent directory and any missing tables. Safe to run on every start.
    pub fn migrate(&self) -> Result<(), DbError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = self.open()?;
        run_migrations(&conn)?;
        info!("Database schema ready at {:?}", self.path);
        Ok(())
    }

    /// Run `f` with a fresh connection on the blocking pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.open()?;
            f(&conn)
        })
        .await
        .map_err(|e| DbError::Task(e.to_string()))?
    }
}

pub fn run_migrations(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = test_connection();
        run_migrations(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tables, vec!["blogs", "comments", "contacts"]);
    }

    #[tokio::test]
    async fn test_run_uses_fresh_connection() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path().join("site.db"));
        db.migrate().unwrap();

        db.run(|conn| {
            conn.execute(
                "INSERT INTO comments (imageName, author, comment) VALUES ('a.jpg', 'Ada', 'Bella')",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let count: i64 = db
            .run(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
