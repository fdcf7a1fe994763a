//! Transport-agnostic application state.
//!
//! Constructed once in `main` and handed down to the HTTP layer — core
//! components receive the store through this handle instead of reaching
//! for module-level globals. Handlers open a short-lived SQLite
//! connection per operation; SQLite's locking plus the `busy_timeout`
//! pragma serialize concurrent writers.

use std::path::PathBuf;

use rusqlite::Connection;

use crate::config;
use crate::db::{self, DatabaseError};

pub struct AppState {
    /// SQLite database file backing all collections.
    pub db_path: PathBuf,
    /// Root directory for uploaded profile photos.
    pub media_dir: PathBuf,
}

impl AppState {
    /// State rooted at the configured data directory.
    pub fn new() -> Self {
        Self {
            db_path: config::database_path(),
            media_dir: config::media_dir(),
        }
    }

    /// State rooted at explicit paths — used by tests.
    pub fn with_paths(db_path: PathBuf, media_dir: PathBuf) -> Self {
        Self { db_path, media_dir }
    }

    /// Open a database connection. The most common operation in handlers.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_database(&self.db_path)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
