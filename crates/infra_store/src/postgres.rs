//! PostgreSQL store
//!
//! Each record is persisted as one row: structured key columns for lookups
//! plus the full document as JSONB, which carries the raw request/response
//! envelope audit trail. Every update is a single statement, so a crash
//! between "sent" and "outcome recorded" leaves the previous consistent
//! document in place.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use core_kernel::{BatchId, EnginePort, PortError, SubmissionId};
use domain_submission::{
    BatchRecord, InteractionKind, PendingInteraction, SubmissionRecord, SubmissionStore,
};

use crate::error::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS exchange_submissions (
    submission_id UUID PRIMARY KEY,
    focal_id      UUID NOT NULL,
    status        TEXT NOT NULL,
    document      JSONB NOT NULL,
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_exchange_submissions_focal
    ON exchange_submissions (focal_id);

CREATE TABLE IF NOT EXISTS exchange_batches (
    batch_id   UUID PRIMARY KEY,
    status     TEXT NOT NULL,
    document   JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS exchange_interactions (
    interaction_id UUID PRIMARY KEY,
    kind           TEXT NOT NULL,
    correlation_id UUID NOT NULL,
    status         TEXT NOT NULL,
    document       JSONB NOT NULL,
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_exchange_interactions_correlation
    ON exchange_interactions (kind, correlation_id);
"#;

/// PostgreSQL implementation of the store port
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the backing tables when they do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("exchange store schema ensured");
        Ok(())
    }

    fn document<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, PortError> {
        serde_json::to_value(value)
            .map_err(|e| PortError::serialization(format!("encode document: {e}")))
    }

    fn decode<T: serde::de::DeserializeOwned>(document: serde_json::Value) -> Result<T, PortError> {
        serde_json::from_value(document)
            .map_err(|e| PortError::serialization(format!("decode document: {e}")))
    }

    /// Serializes a coded enum to its wire word for the key column
    fn code<T: serde::Serialize>(value: &T) -> String {
        serde_json::to_value(value)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }
}

fn classify(error: sqlx::Error) -> PortError {
    let store_error = match &error {
        sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
        sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::DuplicateEntry(db.message().to_string())
        }
        _ => StoreError::Sql(error),
    };
    store_error.into()
}

impl EnginePort for PostgresStore {}

#[async_trait]
impl SubmissionStore for PostgresStore {
    async fn insert_submission(&self, record: &SubmissionRecord) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO exchange_submissions (submission_id, focal_id, status, document, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.focal_id)
        .bind(Self::code(&record.status))
        .bind(Self::document(record)?)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<SubmissionRecord, PortError> {
        let row = sqlx::query("SELECT document FROM exchange_submissions WHERE submission_id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| PortError::not_found("Submission", id))?;
        Self::decode(row.try_get::<serde_json::Value, _>("document").map_err(classify)?)
    }

    async fn find_submission_by_focal(
        &self,
        focal_id: Uuid,
    ) -> Result<Option<SubmissionRecord>, PortError> {
        // Cancel records share the focal identifier of the submission they
        // target; correlation must resolve to the adjudicable record.
        let row = sqlx::query(
            "SELECT document FROM exchange_submissions WHERE focal_id = $1 AND document->>'kind' <> 'cancel'",
        )
        .bind(focal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        match row {
            Some(row) => Ok(Some(Self::decode(
                row.try_get::<serde_json::Value, _>("document").map_err(classify)?,
            )?)),
            None => Ok(None),
        }
    }

    async fn update_submission(&self, record: &SubmissionRecord) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE exchange_submissions
            SET focal_id = $2, status = $3, document = $4, updated_at = $5
            WHERE submission_id = $1
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.focal_id)
        .bind(Self::code(&record.status))
        .bind(Self::document(record)?)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Submission", record.id));
        }
        Ok(())
    }

    async fn insert_batch(&self, batch: &BatchRecord) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO exchange_batches (batch_id, status, document, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(batch.id.as_uuid())
        .bind(Self::code(&batch.status))
        .bind(Self::document(batch)?)
        .bind(batch.updated_at)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn get_batch(&self, id: BatchId) -> Result<BatchRecord, PortError> {
        let row = sqlx::query("SELECT document FROM exchange_batches WHERE batch_id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| PortError::not_found("Batch", id))?;
        Self::decode(row.try_get::<serde_json::Value, _>("document").map_err(classify)?)
    }

    async fn update_batch(&self, batch: &BatchRecord) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE exchange_batches
            SET status = $2, document = $3, updated_at = $4
            WHERE batch_id = $1
            "#,
        )
        .bind(batch.id.as_uuid())
        .bind(Self::code(&batch.status))
        .bind(Self::document(batch)?)
        .bind(batch.updated_at)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Batch", batch.id));
        }
        Ok(())
    }

    async fn insert_interaction(&self, interaction: &PendingInteraction) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO exchange_interactions
                (interaction_id, kind, correlation_id, status, document, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(interaction.id.as_uuid())
        .bind(Self::code(&interaction.kind))
        .bind(interaction.correlation_id)
        .bind(Self::code(&interaction.status))
        .bind(Self::document(interaction)?)
        .bind(interaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn find_interaction(
        &self,
        kind: InteractionKind,
        correlation_id: Uuid,
    ) -> Result<Option<PendingInteraction>, PortError> {
        let row = sqlx::query(
            r#"
            SELECT document FROM exchange_interactions
            WHERE kind = $1 AND correlation_id = $2
            LIMIT 1
            "#,
        )
        .bind(Self::code(&kind))
        .bind(correlation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        match row {
            Some(row) => Ok(Some(Self::decode(
                row.try_get::<serde_json::Value, _>("document").map_err(classify)?,
            )?)),
            None => Ok(None),
        }
    }

    async fn update_interaction(&self, interaction: &PendingInteraction) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE exchange_interactions
            SET status = $2, document = $3, updated_at = now()
            WHERE interaction_id = $1
            "#,
        )
        .bind(interaction.id.as_uuid())
        .bind(Self::code(&interaction.status))
        .bind(Self::document(interaction)?)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Interaction", interaction.id));
        }
        Ok(())
    }

    async fn open_interactions(&self) -> Result<Vec<PendingInteraction>, PortError> {
        let rows = sqlx::query("SELECT document FROM exchange_interactions WHERE status = 'open'")
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;
        rows.into_iter()
            .map(|row| {
                Self::decode(row.try_get::<serde_json::Value, _>("document").map_err(classify)?)
            })
            .collect()
    }
}
