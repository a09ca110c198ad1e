//! SQLite-backed list of known library collections and user settings.

use crate::config::StoreConfig;
use crate::{MnemosyError, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// A remembered library collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCollection {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    /// Display position in the collection list.
    pub position: i64,
    pub created_at: String,
    pub last_accessed: String,
}

impl StoredCollection {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(StoredCollection {
            id: row.get(0)?,
            name: row.get(1)?,
            path: PathBuf::from(row.get::<_, String>(2)?),
            position: row.get(3)?,
            created_at: row.get(4)?,
            last_accessed: row.get(5)?,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, path, position, created_at, last_accessed FROM libraries";

/// Known collections and settings, persisted across sessions.
///
/// Uses WAL mode so a second process reading the list does not block the
/// running application.
pub struct CollectionStore {
    conn: Mutex<Connection>,
}

impl CollectionStore {
    /// Open the store at the default per-user location.
    pub fn open() -> Result<Self> {
        let db_path = crate::platform::default_store_path()?;
        Self::open_at(&db_path)
    }

    /// Open the store at a specific path, creating parent directories.
    pub fn open_at(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    MnemosyError::io_context(
                        format!("Failed to create store directory: {}", parent.display()),
                        parent,
                        e,
                    )
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::configure_connection(&conn)?;
        Self::ensure_schema(&conn)?;
        debug!("Opened collection store at {}", db_path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a throwaway store that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA busy_timeout={};\n\
             PRAGMA synchronous=NORMAL;",
            StoreConfig::BUSY_TIMEOUT_MS,
        ))?;
        Ok(())
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS libraries (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                path TEXT NOT NULL UNIQUE,
                position INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                last_accessed TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| MnemosyError::Database {
            message: "Failed to acquire collection store lock".to_string(),
            source: None,
        })
    }

    fn path_key(path: &Path) -> String {
        path.canonicalize()
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .to_string()
    }

    // ========================================
    // Collections
    // ========================================

    /// Remember a collection under `id`.
    ///
    /// Re-registering a known path keeps its original id and position and
    /// only refreshes the name and access time.
    pub fn register(&self, id: &str, path: &Path, name: &str) -> Result<StoredCollection> {
        let path_str = Self::path_key(path);
        let now = Utc::now().to_rfc3339();

        {
            let conn = self.lock_conn()?;
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM libraries WHERE path = ?1",
                    params![path_str],
                    |row| row.get(0),
                )
                .optional()?;

            match existing {
                Some(existing_id) => {
                    conn.execute(
                        "UPDATE libraries SET last_accessed = ?1, name = ?2 WHERE id = ?3",
                        params![now, name, existing_id],
                    )?;
                    debug!("Updated existing collection registration: {}", path_str);
                }
                None => {
                    let position: i64 = conn.query_row(
                        "SELECT COALESCE(MAX(position), -1) + 1 FROM libraries",
                        [],
                        |row| row.get(0),
                    )?;
                    conn.execute(
                        "INSERT INTO libraries (id, name, path, position, created_at, last_accessed)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![id, name, path_str, position, now, now],
                    )?;
                    debug!("Registered collection '{}' at {}", name, path_str);
                }
            }
        }

        self.get_by_path(path)?.ok_or_else(|| MnemosyError::Database {
            message: "Collection disappeared after registration".to_string(),
            source: None,
        })
    }

    /// Forget a collection. Its files are untouched.
    pub fn unregister(&self, id: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let rows = conn.execute("DELETE FROM libraries WHERE id = ?1", params![id])?;
        conn.execute(
            "DELETE FROM settings WHERE key = ?1 AND value = ?2",
            params![StoreConfig::ACTIVE_LIBRARY_KEY, id],
        )?;
        if rows > 0 {
            debug!("Unregistered collection {}", id);
        }
        Ok(rows > 0)
    }

    pub fn rename(&self, id: &str, name: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let rows = conn.execute(
            "UPDATE libraries SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(rows > 0)
    }

    /// All known collections in list order.
    pub fn list(&self) -> Result<Vec<StoredCollection>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY position ASC", SELECT_COLUMNS))?;
        let rows = stmt.query_map([], StoredCollection::from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    pub fn get(&self, id: &str) -> Result<Option<StoredCollection>> {
        let conn = self.lock_conn()?;
        let result = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                StoredCollection::from_row,
            )
            .optional()?;
        Ok(result)
    }

    pub fn get_by_path(&self, path: &Path) -> Result<Option<StoredCollection>> {
        let conn = self.lock_conn()?;
        let result = conn
            .query_row(
                &format!("{} WHERE path = ?1", SELECT_COLUMNS),
                params![Self::path_key(path)],
                StoredCollection::from_row,
            )
            .optional()?;
        Ok(result)
    }

    /// Update the last_accessed timestamp of a collection.
    pub fn touch(&self, id: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let now = Utc::now().to_rfc3339();
        let rows = conn.execute(
            "UPDATE libraries SET last_accessed = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        Ok(rows > 0)
    }

    // ========================================
    // Settings
    // ========================================

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn clear_setting(&self, key: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Id of the collection that was active when the last session ended.
    pub fn active_collection(&self) -> Result<Option<String>> {
        self.get_setting(StoreConfig::ACTIVE_LIBRARY_KEY)
    }

    pub fn set_active_collection(&self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) => self.set_setting(StoreConfig::ACTIVE_LIBRARY_KEY, id),
            None => self.clear_setting(StoreConfig::ACTIVE_LIBRARY_KEY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (CollectionStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test-store.db");
        let store = CollectionStore::open_at(&db_path).unwrap();
        (store, temp_dir)
    }

    fn create_library_dir(parent: &Path, name: &str) -> PathBuf {
        let dir = parent.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_register_assigns_positions_in_order() {
        let (store, temp_dir) = create_test_store();
        let a = create_library_dir(temp_dir.path(), "a");
        let b = create_library_dir(temp_dir.path(), "b");

        store.register("id-a", &a, "Library A").unwrap();
        store.register("id-b", &b, "Library B").unwrap();

        let list = store.list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "id-a");
        assert_eq!(list[1].id, "id-b");
        assert!(list[0].position < list[1].position);
    }

    #[test]
    fn test_register_is_idempotent_per_path() {
        let (store, temp_dir) = create_test_store();
        let dir = create_library_dir(temp_dir.path(), "lib");

        let first = store.register("first", &dir, "First").unwrap();
        let second = store.register("second", &dir, "Renamed").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Renamed");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_unregister_clears_active_setting() {
        let (store, temp_dir) = create_test_store();
        let dir = create_library_dir(temp_dir.path(), "lib");
        store.register("lib", &dir, "Lib").unwrap();
        store.set_active_collection(Some("lib")).unwrap();

        assert!(store.unregister("lib").unwrap());
        assert!(!store.unregister("lib").unwrap());
        assert_eq!(store.active_collection().unwrap(), None);
        assert!(dir.exists());
    }

    #[test]
    fn test_rename_and_touch() {
        let (store, temp_dir) = create_test_store();
        let dir = create_library_dir(temp_dir.path(), "lib");
        let entry = store.register("lib", &dir, "Old").unwrap();

        assert!(store.rename("lib", "New").unwrap());
        assert!(store.touch("lib").unwrap());

        let updated = store.get("lib").unwrap().unwrap();
        assert_eq!(updated.name, "New");
        assert!(updated.last_accessed >= entry.last_accessed);
        assert!(!store.rename("missing", "X").unwrap());
    }

    #[test]
    fn test_settings_upsert() {
        let store = CollectionStore::open_in_memory().unwrap();
        assert_eq!(store.get_setting("k").unwrap(), None);
        store.set_setting("k", "1").unwrap();
        store.set_setting("k", "2").unwrap();
        assert_eq!(store.get_setting("k").unwrap().as_deref(), Some("2"));
        store.clear_setting("k").unwrap();
        assert_eq!(store.get_setting("k").unwrap(), None);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("store.db");
        let dir = create_library_dir(temp_dir.path(), "lib");
        {
            let store = CollectionStore::open_at(&db_path).unwrap();
            store.register("lib", &dir, "Lib").unwrap();
            store.set_active_collection(Some("lib")).unwrap();
        }
        let store = CollectionStore::open_at(&db_path).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.active_collection().unwrap().as_deref(), Some("lib"));
    }
}
