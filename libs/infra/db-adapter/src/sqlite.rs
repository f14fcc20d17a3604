// [libs/infra/db-adapter/src/sqlite.rs]
// =================================================================
// APARATO: SQLITE-BACKED DATABASE ADAPTER (ESTRATO L3)
// RESPONSABILIDAD: PERSISTENCIA DURADERA A TRAVÉS DE PROCESOS
// =================================================================
//!
//! `rusqlite` is synchronous, so every call is dispatched through
//! `spawn_blocking` onto a single shared connection guarded by a
//! `std::sync::Mutex`. Row payloads beyond the indexed key columns are
//! stored as JSON text — the tables here exist for durability and
//! simple lookups, not for ad-hoc SQL reporting.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use atlas_models::{Artifact, ChecksumFingerprint, CheckpointState, DlqEntry, Event, Head, Jurisdiction, Source};
use rusqlite::{params, Connection, OptionalExtension};

use crate::adapter::DatabaseAdapter;
use crate::errors::DbError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jurisdictions (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS sources (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS artifacts (
    id TEXT PRIMARY KEY,
    jurisdiction_id TEXT NOT NULL,
    body TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS heads (
    jurisdiction_id TEXT PRIMARY KEY,
    body TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS events (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL,
    body TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS dlq_entries (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS checkpoints (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS checksum_cache (
    source_id TEXT PRIMARY KEY,
    body TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_run_id ON events(run_id);
CREATE INDEX IF NOT EXISTS idx_artifacts_jurisdiction ON artifacts(jurisdiction_id);
"#;

pub struct SqliteAdapter {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAdapter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::WriteFailed(format!("opening sqlite file: {e}")))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| DbError::WriteFailed(format!("applying schema: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DbError::WriteFailed(format!("opening in-memory sqlite: {e}")))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| DbError::WriteFailed(format!("applying schema: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn blocking<F, T>(&self, op: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().expect("sqlite connection mutex poisoned");
            op(&guard)
        })
        .await
        .map_err(|e| DbError::WriteFailed(format!("blocking task panicked: {e}")))?
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(|e| DbError::WriteFailed(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, DbError> {
    serde_json::from_str(text).map_err(|e| DbError::WriteFailed(e.to_string()))
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    async fn upsert_jurisdiction(&self, jurisdiction: Jurisdiction) -> Result<(), DbError> {
        let body = to_json(&jurisdiction)?;
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO jurisdictions (id, body) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET body = excluded.body",
                params![jurisdiction.id, body],
            )
            .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn get_jurisdiction(&self, id: &str) -> Result<Option<Jurisdiction>, DbError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let body: Option<String> = conn
                .query_row("SELECT body FROM jurisdictions WHERE id = ?1", params![id], |r| r.get(0))
                .optional()
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            body.map(|b| from_json(&b)).transpose()
        })
        .await
    }

    async fn list_jurisdictions(&self) -> Result<Vec<Jurisdiction>, DbError> {
        self.blocking(|conn| {
            let mut stmt = conn
                .prepare("SELECT body FROM jurisdictions")
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            let rows = stmt
                .query_map([], |r| r.get::<_, String>(0))
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            let mut out = Vec::new();
            for row in rows {
                let body = row.map_err(|e| DbError::WriteFailed(e.to_string()))?;
                out.push(from_json(&body)?);
            }
            Ok(out)
        })
        .await
    }

    async fn upsert_source(&self, source: Source) -> Result<(), DbError> {
        let body = to_json(&source)?;
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO sources (id, body) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET body = excluded.body",
                params![source.id, body],
            )
            .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn get_source(&self, id: &str) -> Result<Option<Source>, DbError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let body: Option<String> = conn
                .query_row("SELECT body FROM sources WHERE id = ?1", params![id], |r| r.get(0))
                .optional()
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            body.map(|b| from_json(&b)).transpose()
        })
        .await
    }

    async fn list_sources(&self) -> Result<Vec<Source>, DbError> {
        self.blocking(|conn| {
            let mut stmt = conn
                .prepare("SELECT body FROM sources")
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            let rows = stmt
                .query_map([], |r| r.get::<_, String>(0))
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            let mut out = Vec::new();
            for row in rows {
                let body = row.map_err(|e| DbError::WriteFailed(e.to_string()))?;
                out.push(from_json(&body)?);
            }
            Ok(out)
        })
        .await
    }

    async fn insert_artifact(&self, artifact: Artifact) -> Result<(), DbError> {
        let body = to_json(&artifact)?;
        self.blocking(move |conn| {
            let affected = conn
                .execute(
                    "INSERT OR IGNORE INTO artifacts (id, jurisdiction_id, body) VALUES (?1, ?2, ?3)",
                    params![artifact.id, artifact.jurisdiction_id, body],
                )
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            if affected == 0 {
                return Err(DbError::Conflict(format!(
                    "artifact {} already exists (artifacts are append-only)",
                    artifact.id
                )));
            }
            Ok(())
        })
        .await
    }

    async fn get_artifact(&self, id: &str) -> Result<Option<Artifact>, DbError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let body: Option<String> = conn
                .query_row("SELECT body FROM artifacts WHERE id = ?1", params![id], |r| r.get(0))
                .optional()
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            body.map(|b| from_json(&b)).transpose()
        })
        .await
    }

    async fn get_head(&self, jurisdiction_id: &str) -> Result<Option<Head>, DbError> {
        let jurisdiction_id = jurisdiction_id.to_string();
        self.blocking(move |conn| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM heads WHERE jurisdiction_id = ?1",
                    params![jurisdiction_id],
                    |r| r.get(0),
                )
                .optional()
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            body.map(|b| from_json(&b)).transpose()
        })
        .await
    }

    async fn upsert_head(&self, head: Head) -> Result<(), DbError> {
        let body = to_json(&head)?;
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO heads (jurisdiction_id, body) VALUES (?1, ?2)
                 ON CONFLICT(jurisdiction_id) DO UPDATE SET body = excluded.body",
                params![head.jurisdiction_id, body],
            )
            .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn log_event(&self, event: Event) -> Result<(), DbError> {
        let body = to_json(&event)?;
        let run_id = event.run_id.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO events (run_id, body) VALUES (?1, ?2)",
                params![run_id, body],
            )
            .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn list_events_for_run(&self, run_id: &str) -> Result<Vec<Event>, DbError> {
        let run_id = run_id.to_string();
        self.blocking(move |conn| {
            let mut stmt = conn
                .prepare("SELECT body FROM events WHERE run_id = ?1 ORDER BY seq ASC")
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            let rows = stmt
                .query_map(params![run_id], |r| r.get::<_, String>(0))
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            let mut out = Vec::new();
            for row in rows {
                let body = row.map_err(|e| DbError::WriteFailed(e.to_string()))?;
                out.push(from_json(&body)?);
            }
            Ok(out)
        })
        .await
    }

    async fn upsert_dlq_entry(&self, entry: DlqEntry) -> Result<(), DbError> {
        let body = to_json(&entry)?;
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO dlq_entries (id, body) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET body = excluded.body",
                params![entry.id, body],
            )
            .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn get_dlq_entry(&self, id: &str) -> Result<Option<DlqEntry>, DbError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let body: Option<String> = conn
                .query_row("SELECT body FROM dlq_entries WHERE id = ?1", params![id], |r| r.get(0))
                .optional()
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            body.map(|b| from_json(&b)).transpose()
        })
        .await
    }

    async fn list_dlq_entries(&self) -> Result<Vec<DlqEntry>, DbError> {
        self.blocking(|conn| {
            let mut stmt = conn
                .prepare("SELECT body FROM dlq_entries")
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            let rows = stmt
                .query_map([], |r| r.get::<_, String>(0))
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            let mut out = Vec::new();
            for row in rows {
                let body = row.map_err(|e| DbError::WriteFailed(e.to_string()))?;
                out.push(from_json(&body)?);
            }
            Ok(out)
        })
        .await
    }

    async fn save_checkpoint(&self, checkpoint: CheckpointState) -> Result<(), DbError> {
        let body = to_json(&checkpoint)?;
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO checkpoints (id, body) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET body = excluded.body",
                params![checkpoint.id, body],
            )
            .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn load_checkpoint(&self, id: &str) -> Result<Option<CheckpointState>, DbError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let body: Option<String> = conn
                .query_row("SELECT body FROM checkpoints WHERE id = ?1", params![id], |r| r.get(0))
                .optional()
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            body.map(|b| from_json(&b)).transpose()
        })
        .await
    }

    async fn list_checkpoints(&self) -> Result<Vec<CheckpointState>, DbError> {
        self.blocking(|conn| {
            let mut stmt = conn
                .prepare("SELECT body FROM checkpoints")
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            let rows = stmt
                .query_map([], |r| r.get::<_, String>(0))
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            let mut out = Vec::new();
            for row in rows {
                let body = row.map_err(|e| DbError::WriteFailed(e.to_string()))?;
                out.push(from_json(&body)?);
            }
            Ok(out)
        })
        .await
    }

    async fn get_checksum_cache(&self, source_id: &str) -> Result<Option<ChecksumFingerprint>, DbError> {
        let source_id = source_id.to_string();
        self.blocking(move |conn| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM checksum_cache WHERE source_id = ?1",
                    params![source_id],
                    |r| r.get(0),
                )
                .optional()
                .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            body.map(|b| from_json(&b)).transpose()
        })
        .await
    }

    async fn upsert_checksum_cache(&self, source_id: &str, fingerprint: ChecksumFingerprint) -> Result<(), DbError> {
        let body = to_json(&fingerprint)?;
        let source_id = source_id.to_string();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO checksum_cache (source_id, body) VALUES (?1, ?2)
                 ON CONFLICT(source_id) DO UPDATE SET body = excluded.body",
                params![source_id, body],
            )
            .map_err(|e| DbError::WriteFailed(e.to_string()))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_models::JurisdictionType;

    #[tokio::test]
    async fn round_trips_a_jurisdiction_through_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteAdapter::open(dir.path().join("atlas.sqlite3")).unwrap();
        let j = Jurisdiction::new("06", "California", JurisdictionType::State);
        db.upsert_jurisdiction(j.clone()).await.unwrap();
        let got = db.get_jurisdiction("06").await.unwrap().unwrap();
        assert_eq!(got, j);
    }

    #[tokio::test]
    async fn duplicate_artifact_insert_conflicts() {
        let db = SqliteAdapter::open_in_memory().unwrap();
        let artifact = Artifact {
            id: "art_1".into(),
            jurisdiction_id: "06".into(),
            content_sha256: "abc".into(),
            record_count: 1,
            bbox: None,
            etag: None,
            last_modified: None,
            created_at: chrono::Utc::now(),
        };
        db.insert_artifact(artifact.clone()).await.unwrap();
        assert!(db.insert_artifact(artifact).await.is_err());
    }

    #[tokio::test]
    async fn checksum_cache_round_trips_through_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteAdapter::open(dir.path().join("atlas.sqlite3")).unwrap();
        let fp = ChecksumFingerprint {
            etag: Some("v1".into()),
            last_modified: None,
            checked_at: chrono::Utc::now(),
            next_check_at: None,
        };
        db.upsert_checksum_cache("src_1", fp.clone()).await.unwrap();
        let got = db.get_checksum_cache("src_1").await.unwrap().unwrap();
        assert_eq!(got, fp);
    }
}
