use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnection, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use umbra_core::{
    ActionLogEntry, AffectRecord, DurableStore, LoggedAction, MemoryRecord, MoodSnapshot,
    PersistUnit, StoreError,
};
use uuid::Uuid;

use crate::embedding::cosine_distance;

fn db(e: sqlx::Error) -> StoreError {
    StoreError::database(e)
}

fn millis_to_utc(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| StoreError::codec(format!("timestamp out of range: {}", ms)))
}

/// Append-only SQLite store for the action log, the affect log and semantic memory.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    dimension: usize,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path`. `":memory:"` gives a private
    /// in-memory database held on a single connection.
    pub async fn open<P: AsRef<Path>>(db_path: P, dimension: usize) -> Result<Self, StoreError> {
        let path = db_path.as_ref();
        let pool = if path.as_os_str() == ":memory:" {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await
                .map_err(db)?
        } else {
            let db_url = format!("sqlite://{}?mode=rwc", path.display());
            SqlitePoolOptions::new()
                .after_connect(|conn, _meta| {
                    Box::pin(async move {
                        sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                        sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                        Ok(())
                    })
                })
                .connect(&db_url)
                .await
                .map_err(db)?
        };

        let store = Self { pool, dimension };
        store.migrate().await?;
        Ok(store)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS action_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                stimulus_id TEXT,
                action TEXT NOT NULL,
                input_context TEXT NOT NULL,
                produced_content TEXT NOT NULL,
                affect_json TEXT NOT NULL,
                reward_score REAL NOT NULL DEFAULT 0.0,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db)?;

        // Idempotency lookups by stimulus id
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_action_log_stimulus ON action_log(stimulus_id)")
            .execute(&self.pool)
            .await
            .map_err(db)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_action_log_action_created ON action_log(action, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(db)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS affect_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                valence REAL NOT NULL,
                arousal REAL NOT NULL,
                stimulus_tag TEXT NOT NULL,
                description TEXT NOT NULL,
                recorded_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memory_records (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                provenance TEXT NOT NULL,
                metadata_json TEXT NOT NULL DEFAULT '{}',
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db)?;

        Ok(())
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), StoreError> {
        if vector.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Row writers, shared by the single-record and unit paths
    // ------------------------------------------------------------------

    async fn insert_action(conn: &mut SqliteConnection, entry: &ActionLogEntry) -> Result<(), StoreError> {
        let affect_json = serde_json::to_string(&entry.affect_snapshot).map_err(StoreError::codec)?;
        sqlx::query(
            r#"
            INSERT INTO action_log (stimulus_id, action, input_context, produced_content, affect_json, reward_score, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.stimulus_id)
        .bind(entry.action.as_str())
        .bind(&entry.input_context)
        .bind(&entry.produced_content)
        .bind(affect_json)
        .bind(entry.reward_score as f64)
        .bind(entry.created_at.timestamp_millis())
        .execute(conn)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn insert_affect(conn: &mut SqliteConnection, record: &AffectRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO affect_log (valence, arousal, stimulus_tag, description, recorded_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.valence as f64)
        .bind(record.arousal as f64)
        .bind(&record.stimulus_tag)
        .bind(&record.description)
        .bind(record.recorded_at.timestamp_millis())
        .execute(conn)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn insert_memory(conn: &mut SqliteConnection, record: &MemoryRecord) -> Result<(), StoreError> {
        // Serialize embedding to efficient binary format
        let embedding_blob = bincode::serialize(&record.embedding).map_err(StoreError::codec)?;
        let metadata_json = serde_json::to_string(&record.metadata).map_err(StoreError::codec)?;
        sqlx::query(
            r#"
            INSERT INTO memory_records (id, content, embedding, provenance, metadata_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.content)
        .bind(embedding_blob)
        .bind(&record.provenance)
        .bind(metadata_json)
        .bind(record.created_at.timestamp_millis())
        .execute(conn)
        .await
        .map_err(db)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Row readers
    // ------------------------------------------------------------------

    fn action_from_row(row: &SqliteRow) -> Result<ActionLogEntry, StoreError> {
        let action: String = row.try_get("action").map_err(db)?;
        let affect_json: String = row.try_get("affect_json").map_err(db)?;
        let reward: f64 = row.try_get("reward_score").map_err(db)?;
        Ok(ActionLogEntry {
            stimulus_id: row.try_get("stimulus_id").map_err(db)?,
            action: LoggedAction::parse(&action)
                .ok_or_else(|| StoreError::codec(format!("unknown action kind: {}", action)))?,
            input_context: row.try_get("input_context").map_err(db)?,
            produced_content: row.try_get("produced_content").map_err(db)?,
            affect_snapshot: serde_json::from_str::<MoodSnapshot>(&affect_json)
                .map_err(StoreError::codec)?,
            reward_score: reward as f32,
            created_at: millis_to_utc(row.try_get("created_at").map_err(db)?)?,
        })
    }

    fn affect_from_row(row: &SqliteRow) -> Result<AffectRecord, StoreError> {
        let valence: f64 = row.try_get("valence").map_err(db)?;
        let arousal: f64 = row.try_get("arousal").map_err(db)?;
        Ok(AffectRecord {
            valence: valence as f32,
            arousal: arousal as f32,
            stimulus_tag: row.try_get("stimulus_tag").map_err(db)?,
            description: row.try_get("description").map_err(db)?,
            recorded_at: millis_to_utc(row.try_get("recorded_at").map_err(db)?)?,
        })
    }

    fn memory_from_row(row: &SqliteRow) -> Result<MemoryRecord, StoreError> {
        let id: String = row.try_get("id").map_err(db)?;
        let blob: Vec<u8> = row.try_get("embedding").map_err(db)?;
        let metadata_json: String = row.try_get("metadata_json").map_err(db)?;
        Ok(MemoryRecord {
            id: Uuid::parse_str(&id).map_err(StoreError::codec)?,
            content: row.try_get("content").map_err(db)?,
            embedding: bincode::deserialize::<Vec<f32>>(&blob).map_err(StoreError::codec)?,
            provenance: row.try_get("provenance").map_err(db)?,
            metadata: serde_json::from_str::<Map<String, Value>>(&metadata_json)
                .map_err(StoreError::codec)?,
            created_at: millis_to_utc(row.try_get("created_at").map_err(db)?)?,
        })
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Most recent action log entries, newest first.
    pub async fn recent_actions(&self, limit: usize) -> Result<Vec<ActionLogEntry>, StoreError> {
        let rows = sqlx::query("SELECT * FROM action_log ORDER BY id DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        rows.iter().map(Self::action_from_row).collect()
    }

    /// Row counts of (action_log, affect_log, memory_records).
    pub async fn counts(&self) -> Result<(i64, i64, i64), StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM action_log) AS actions,
                (SELECT COUNT(*) FROM affect_log) AS affects,
                (SELECT COUNT(*) FROM memory_records) AS memories
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db)?;
        Ok((
            row.try_get("actions").map_err(db)?,
            row.try_get("affects").map_err(db)?,
            row.try_get("memories").map_err(db)?,
        ))
    }

    /// Memory records of one provenance, newest first.
    pub async fn memories_by_provenance(&self, provenance: &str) -> Result<Vec<MemoryRecord>, StoreError> {
        let rows = sqlx::query("SELECT * FROM memory_records WHERE provenance = ? ORDER BY created_at DESC")
            .bind(provenance)
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        rows.iter().map(Self::memory_from_row).collect()
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn has_action_for(&self, stimulus_id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM action_log WHERE stimulus_id = ? LIMIT 1")
            .bind(stimulus_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        Ok(row.is_some())
    }

    async fn last_action_at(&self, action: LoggedAction) -> Result<Option<DateTime<Utc>>, StoreError> {
        let row = sqlx::query(
            "SELECT created_at FROM action_log WHERE action = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(action.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;
        match row {
            Some(row) => Ok(Some(millis_to_utc(row.try_get("created_at").map_err(db)?)?)),
            None => Ok(None),
        }
    }

    async fn latest_affect(&self) -> Result<Option<AffectRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM affect_log ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        row.as_ref().map(Self::affect_from_row).transpose()
    }

    async fn append_affect(&self, record: &AffectRecord) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(db)?;
        Self::insert_affect(&mut conn, record).await
    }

    async fn append_memory(&self, record: &MemoryRecord) -> Result<(), StoreError> {
        self.check_dimension(&record.embedding)?;
        let mut conn = self.pool.acquire().await.map_err(db)?;
        Self::insert_memory(&mut conn, record).await
    }

    async fn nearest_memories(&self, query: &[f32], limit: usize) -> Result<Vec<MemoryRecord>, StoreError> {
        self.check_dimension(query)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        // Exhaustive scan: every record is a candidate regardless of age.
        let rows = sqlx::query("SELECT * FROM memory_records ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;

        let mut scored: Vec<(f32, MemoryRecord)> = Vec::with_capacity(rows.len());
        for row in &rows {
            match Self::memory_from_row(row) {
                Ok(record) if record.embedding.len() == self.dimension => {
                    scored.push((cosine_distance(query, &record.embedding), record));
                }
                Ok(record) => {
                    tracing::warn!(id = %record.id, "Skipping memory with wrong embedding dimension");
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable memory row: {}", e);
                }
            }
        }

        // Stable sort: equal distances keep newest-first order
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(limit).map(|(_, record)| record).collect())
    }

    async fn commit_unit(&self, unit: &PersistUnit) -> Result<(), StoreError> {
        self.check_dimension(&unit.memory.embedding)?;

        // Dropping the transaction before commit rolls back all three rows.
        let mut tx = self.pool.begin().await.map_err(db)?;
        Self::insert_action(&mut tx, &unit.log).await?;
        Self::insert_affect(&mut tx, &unit.affect).await?;
        Self::insert_memory(&mut tx, &unit.memory).await?;
        tx.commit().await.map_err(db)?;

        tracing::debug!(
            stimulus_id = unit.log.stimulus_id.as_deref().unwrap_or("-"),
            action = %unit.log.action,
            "Committed persistence unit"
        );
        Ok(())
    }
}
