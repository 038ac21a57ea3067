//! SQLite store for images, tags and albums.
//!
//! A [`Database`] wraps one connection. The HTTP layer opens a fresh one per
//! request and relies on SQLite's statement-level snapshot isolation, so no
//! connection is ever shared between requests.

mod schema;
pub mod albums;
pub mod images;
pub mod tags;

use rusqlite::Connection;
use std::path::Path;

use crate::error::Result;

pub use albums::{Album, AlbumKind, SmartAlbumFilter};
pub use images::{ImageDetail, ImageSummary, ImageUpdate};
pub use schema::{MIGRATIONS, SCHEMA};
pub use tags::{Tag, TagCategory, TagWithCount};

pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        Self::configure(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self::configure(Connection::open_in_memory()?)?;
        db.initialize()?;
        Ok(db)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.run_migrations()?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        for migration in MIGRATIONS {
            let _ = self.conn.execute(migration, []);
        }
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Serialize an id set for a JSON TEXT column.
pub(crate) fn ids_to_json(ids: &[i64]) -> Result<String> {
    Ok(serde_json::to_string(ids)?)
}

/// Parse a JSON TEXT column back into an id set. Empty text means no ids.
pub(crate) fn ids_from_json(text: &str) -> Result<Vec<i64>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(text)?)
}
