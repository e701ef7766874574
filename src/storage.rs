//! Durable client records.
//!
//! Each client is one JSON document; saving replaces the whole document
//! (last writer wins). In-progress sessions live in their own table until
//! they are finished or cancelled.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite};
use tracing::{debug, info};

use crate::db::DB;
use crate::error::StoreError;
use crate::models::ClientRecord;
use crate::tracker::SessionLog;

/// Port through which finished sessions reach durable storage.
#[allow(async_fn_in_trait)]
pub trait ClientRepository {
    async fn load(&self, id: &str) -> Result<ClientRecord, StoreError>;
    async fn save(&self, record: &ClientRecord) -> Result<(), StoreError>;
}

/// A client's workout that has been started but not finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub client_id: String,
    pub started_at: DateTime<Local>,
    /// Position in the split of the day being trained. Drafts saved before
    /// this field existed fall back to the client's rotation index.
    #[serde(default)]
    pub day_index: Option<usize>,
    pub session: SessionLog,
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DB,
}

async fn upsert<'e, E>(exec: E, record: &ClientRecord) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let doc = serde_json::to_string(record)?;
    sqlx::query(
        r#"
        INSERT INTO clients (id, name, created_at, updated_at, record)
        VALUES (?1, ?2, ?3, datetime('now'), ?4)
        ON CONFLICT(id) DO UPDATE SET
            name       = excluded.name,
            updated_at = excluded.updated_at,
            record     = excluded.record
        "#,
    )
    .bind(&record.id)
    .bind(&record.name)
    .bind(record.created_at.to_rfc3339())
    .bind(doc)
    .execute(exec)
    .await?;
    Ok(())
}

fn decode(doc: &str) -> Result<ClientRecord, StoreError> {
    Ok(serde_json::from_str(doc)?)
}

impl SqliteStore {
    pub fn new(pool: DB) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DB {
        &self.pool
    }

    /// All clients ordered by name.
    pub async fn list(&self) -> Result<Vec<ClientRecord>, StoreError> {
        let docs: Vec<(String,)> = sqlx::query_as("SELECT record FROM clients ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        docs.iter().map(|(d,)| decode(d)).collect()
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<ClientRecord>, StoreError> {
        let doc: Option<String> = sqlx::query_scalar("SELECT record FROM clients WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        doc.as_deref().map(decode).transpose()
    }

    /// Write every record in one transaction. Existing ids are overwritten.
    pub async fn import_all(&self, records: &[ClientRecord]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            upsert(&mut *tx, record).await?;
        }
        tx.commit().await?;
        info!(count = records.len(), "imported client records");
        Ok(records.len())
    }

    pub async fn load_active(&self, client_id: &str) -> Result<Option<ActiveSession>, StoreError> {
        let state: Option<String> =
            sqlx::query_scalar("SELECT state FROM active_sessions WHERE client_id = ?")
                .bind(client_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(state
            .as_deref()
            .map(serde_json::from_str::<ActiveSession>)
            .transpose()?)
    }

    pub async fn save_active(&self, active: &ActiveSession) -> Result<(), StoreError> {
        let state = serde_json::to_string(active)?;
        sqlx::query(
            r#"
            INSERT INTO active_sessions (client_id, started_at, state)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(client_id) DO UPDATE SET state = excluded.state
            "#,
        )
        .bind(&active.client_id)
        .bind(active.started_at.to_rfc3339())
        .bind(state)
        .execute(&self.pool)
        .await?;
        debug!(client = %active.client_id, "active session saved");
        Ok(())
    }

    /// Returns false when there was nothing to clear.
    pub async fn clear_active(&self, client_id: &str) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM active_sessions WHERE client_id = ?")
            .bind(client_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Persist the merged record and drop the active session atomically.
    pub async fn complete_session(&self, record: &ClientRecord) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        upsert(&mut *tx, record).await?;
        sqlx::query("DELETE FROM active_sessions WHERE client_id = ?")
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!(client = %record.id, "session completed");
        Ok(())
    }
}

impl ClientRepository for SqliteStore {
    async fn load(&self, id: &str) -> Result<ClientRecord, StoreError> {
        let doc: Option<String> = sqlx::query_scalar("SELECT record FROM clients WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match doc {
            Some(d) => decode(&d),
            None => Err(StoreError::ClientNotFound(id.to_string())),
        }
    }

    async fn save(&self, record: &ClientRecord) -> Result<(), StoreError> {
        upsert(&self.pool, record).await?;
        debug!(client = %record.id, "client record saved");
        Ok(())
    }
}
