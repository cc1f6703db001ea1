//! SQLite-backed response store

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::http::{RequestKey, Response};
use crate::store::Store;

/// Persists captured responses across process restarts.
///
/// One database file holds every named store: a `stores` table for names and
/// an `entries` table for the captured responses, cascade-deleted with their
/// store. Response headers are kept as a JSON column, bodies as blobs.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(db_path: &Path) -> Result<Self, StoreError> {
        info!("Opening response store at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // WAL for better concurrency; cascades need foreign keys on
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        Ok(store)
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn current_timestamp_ms() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before UNIX epoch")
            .as_millis() as i64
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        debug!("Creating store schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS stores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                store_id INTEGER NOT NULL,
                method TEXT NOT NULL,
                url TEXT NOT NULL,
                status INTEGER NOT NULL,
                headers TEXT NOT NULL,
                body BLOB NOT NULL,
                stored_at INTEGER NOT NULL,
                FOREIGN KEY (store_id) REFERENCES stores(id) ON DELETE CASCADE,
                UNIQUE(store_id, method, url)
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_entries_store_id ON entries(store_id)",
            [],
        )?;

        debug!("Store schema created successfully");
        Ok(())
    }

    fn ensure_store(conn: &Connection, name: &str) -> Result<i64, StoreError> {
        conn.execute(
            r#"
            INSERT INTO stores (name, created_at)
            VALUES (?1, ?2)
            ON CONFLICT(name) DO NOTHING
            "#,
            (name, Self::current_timestamp_ms()),
        )?;

        let id = conn.query_row("SELECT id FROM stores WHERE name = ?1", [name], |row| {
            row.get(0)
        })?;
        Ok(id)
    }
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    async fn open(&self, name: &str) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        Self::ensure_store(&conn, name)?;
        Ok(())
    }

    async fn get(&self, name: &str, key: &RequestKey) -> Result<Option<Response>, StoreError> {
        let conn = self.lock_conn()?;

        let result = conn.query_row(
            r#"
            SELECT e.status, e.headers, e.body FROM entries e
            JOIN stores s ON e.store_id = s.id
            WHERE s.name = ?1 AND e.method = ?2 AND e.url = ?3
            "#,
            (name, key.method.as_str(), key.url.as_str()),
            |row| {
                Ok((
                    row.get::<_, u16>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            },
        );

        match result {
            Ok((status, headers, body)) => {
                let headers: Vec<(String, String)> = serde_json::from_str(&headers)?;
                Ok(Some(Response::new(status, body).with_headers(headers)))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(
        &self,
        name: &str,
        key: RequestKey,
        response: Response,
    ) -> Result<(), StoreError> {
        let headers = serde_json::to_string(response.headers())?;

        let conn = self.lock_conn()?;
        let store_id = Self::ensure_store(&conn, name)?;

        conn.execute(
            r#"
            INSERT INTO entries (store_id, method, url, status, headers, body, stored_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(store_id, method, url) DO UPDATE SET
                status = excluded.status,
                headers = excluded.headers,
                body = excluded.body,
                stored_at = excluded.stored_at
            "#,
            (
                store_id,
                key.method.as_str(),
                key.url.as_str(),
                response.status(),
                headers,
                response.body().as_ref(),
                Self::current_timestamp_ms(),
            ),
        )?;

        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let conn = self.lock_conn()?;
        let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", [name])?;

        debug!("Deleted store {name:?}: existed = {}", deleted > 0);
        Ok(deleted > 0)
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY id")?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }
}
