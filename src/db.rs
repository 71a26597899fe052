use crate::error::RegistryError;
use crate::types::ArtifactRecord;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Mutex;

/// Records where each artifact of a document was written. Keyed by
/// (document_id, output_type); a later put with the same key replaces the path.
pub trait Registry {
    fn put(&self, record: &ArtifactRecord) -> Result<(), RegistryError>;
}

/// SQLite-backed artifact registry.
pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn new(db_path: PathBuf) -> Result<Self, RegistryError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&db_path)?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self, RegistryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, RegistryError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS artifacts (
                document_id TEXT NOT NULL,
                output_type TEXT NOT NULL,
                output_path TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                PRIMARY KEY (document_id, output_type)
            );
            CREATE INDEX IF NOT EXISTS idx_artifacts_document ON artifacts(document_id);
            ",
        )?;
        Ok(Db {
            conn: Mutex::new(conn),
        })
    }

    pub fn get(
        &self,
        document_id: &str,
        output_type: &str,
    ) -> Result<Option<ArtifactRecord>, RegistryError> {
        let conn = self.conn.lock().map_err(|_| RegistryError::LockPoisoned)?;
        let record = conn
            .query_row(
                "SELECT document_id, output_type, output_path FROM artifacts
                 WHERE document_id = ?1 AND output_type = ?2",
                params![document_id, output_type],
                |row| {
                    Ok(ArtifactRecord {
                        document_id: row.get(0)?,
                        output_type: row.get(1)?,
                        output_path: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// All records of a document, ordered by output type.
    pub fn list_for_document(&self, document_id: &str) -> Result<Vec<ArtifactRecord>, RegistryError> {
        let conn = self.conn.lock().map_err(|_| RegistryError::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT document_id, output_type, output_path FROM artifacts
             WHERE document_id = ?1 ORDER BY output_type",
        )?;
        let records = stmt
            .query_map(params![document_id], |row| {
                Ok(ArtifactRecord {
                    document_id: row.get(0)?,
                    output_type: row.get(1)?,
                    output_path: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl Registry for Db {
    fn put(&self, record: &ArtifactRecord) -> Result<(), RegistryError> {
        let conn = self.conn.lock().map_err(|_| RegistryError::LockPoisoned)?;
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO artifacts (document_id, output_type, output_path, recorded_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(document_id, output_type) DO UPDATE SET
               output_path = excluded.output_path,
               recorded_at = excluded.recorded_at",
            params![
                record.document_id,
                record.output_type,
                record.output_path,
                now
            ],
        )?;
        Ok(())
    }
}
