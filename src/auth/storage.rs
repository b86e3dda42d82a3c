//! Durable credential storage.
//!
//! One serialized record per account id. [`SqliteStore`] shares a
//! database with [`Config`](crate::config::Config) — pass the same
//! path to both. [`MemoryStore`] backs tests and `--db :memory:` runs.
//!
//! Nothing in this module logs record contents.

use std::collections::HashMap;
use std::sync::Mutex;

use rusqlite::Connection;

use super::AuthError;
use super::credential::Credential;

/// Capability interface for OS-secured credential storage.
///
/// `retrieve` returns `Ok(None)` for "no record"; an `Err` means a
/// genuine I/O, permission, or decode failure. `delete` treats an
/// already-absent record as success.
pub trait SecretStore: Send + Sync {
    fn store(&self, account_id: &str, credential: &Credential) -> Result<(), AuthError>;
    fn retrieve(&self, account_id: &str) -> Result<Option<Credential>, AuthError>;
    fn delete(&self, account_id: &str) -> Result<(), AuthError>;
}

/// Credential storage in the shared SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the credentials table in the given database path.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self, AuthError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS credentials (
                account TEXT PRIMARY KEY,
                data    TEXT NOT NULL
            )",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl SecretStore for SqliteStore {
    fn store(&self, account_id: &str, credential: &Credential) -> Result<(), AuthError> {
        let json =
            serde_json::to_string(credential).map_err(|e| AuthError::Store(e.to_string()))?;
        let conn = self.conn.lock().unwrap();
        // Single-statement upsert, so a failed write never leaves a
        // mixed old/new record behind.
        conn.execute(
            "INSERT INTO credentials (account, data) VALUES (?1, ?2)
             ON CONFLICT(account) DO UPDATE SET data = excluded.data",
            [account_id, &json],
        )?;
        Ok(())
    }

    fn retrieve(&self, account_id: &str) -> Result<Option<Credential>, AuthError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT data FROM credentials WHERE account = ?1")?;
        let mut rows = stmt.query([account_id])?;
        match rows.next()? {
            Some(row) => {
                let json: String = row.get(0)?;
                let credential = serde_json::from_str(&json)
                    .map_err(|e| AuthError::Store(format!("undecodable record: {e}")))?;
                Ok(Some(credential))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, account_id: &str) -> Result<(), AuthError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM credentials WHERE account = ?1", [account_id])?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Credential>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemoryStore {
    fn store(&self, account_id: &str, credential: &Credential) -> Result<(), AuthError> {
        self.records
            .lock()
            .unwrap()
            .insert(account_id.to_string(), credential.clone());
        Ok(())
    }

    fn retrieve(&self, account_id: &str) -> Result<Option<Credential>, AuthError> {
        Ok(self.records.lock().unwrap().get(account_id).cloned())
    }

    fn delete(&self, account_id: &str) -> Result<(), AuthError> {
        self.records.lock().unwrap().remove(account_id);
        Ok(())
    }
}
