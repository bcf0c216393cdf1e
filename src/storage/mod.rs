//! SQLite storage layer for the enrichment pipeline.
//!
//! Provides database initialization, connection pooling, and the
//! `Repository` contract the pipeline calls to persist an Enrichment and
//! its audit trail. Uses SQLx with WAL mode for concurrent access.

pub mod affinities;
pub mod assertions;
pub mod context_queries;
pub mod enrichments;
pub mod extraction_runs;
pub mod mention_patterns;
pub mod mentions;
pub mod sentiments;
pub mod sqlite;
pub mod stage_results;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use crate::error::RepositoryError;
use crate::model::{
    Assertion, ContentSentiment, DecisionInfo, EntityProjectAffinity, Enrichment,
    EnrichmentStatus, ExtractionRun, Mention, MentionPattern, MeetingInfo, PersonInfo,
    ProjectInfo, Stage, StageResult, StageStatus, ThreadMessageInfo, TicketInfo,
};

/// Type alias for the SQLite connection pool.
pub type DbPool = sqlx::SqlitePool;

/// Initialize the SQLite database, running embedded migrations.
pub async fn init_db(db_path: &str) -> Result<DbPool, RepositoryError> {
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| RepositoryError::Connection {
                source: sqlx::Error::Configuration(
                    format!("failed to create directory {}: {e}", parent.display()).into(),
                ),
            })?;
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
        .map_err(|e| RepositoryError::Connection { source: e })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(300))
        .connect_with(connect_options)
        .await
        .map_err(|e| RepositoryError::Connection { source: e })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| RepositoryError::Migration { source: e })?;

    Ok(pool)
}

/// Initialize an in-memory SQLite database for testing.
#[cfg(any(test, feature = "test-helpers"))]
pub async fn init_test_db() -> Result<DbPool, RepositoryError> {
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| RepositoryError::Connection { source: e })?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .map_err(|e| RepositoryError::Connection { source: e })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| RepositoryError::Migration { source: e })?;

    Ok(pool)
}

/// Everything the pipeline needs from persistent storage (spec.md §6).
/// One concrete adapter, `sqlite::SqliteRepository`, ships as the
/// reference implementation; any backing store satisfying this contract
/// is acceptable.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn upsert_enrichment(&self, enrichment: &Enrichment) -> Result<(), RepositoryError>;
    async fn update_enrichment(&self, enrichment: &Enrichment) -> Result<(), RepositoryError>;
    async fn update_status(
        &self,
        enrichment_id: &str,
        status: EnrichmentStatus,
        stage: Option<Stage>,
    ) -> Result<(), RepositoryError>;
    async fn mark_failed(&self, enrichment_id: &str, message: &str) -> Result<(), RepositoryError>;
    async fn record_stage(&self, result: &StageResult) -> Result<(), RepositoryError>;

    async fn save_extraction_run(&self, run: &ExtractionRun) -> Result<(), RepositoryError>;
    async fn save_assertions(&self, assertions: &[Assertion]) -> Result<(), RepositoryError>;
    async fn save_sentiment(&self, sentiment: &ContentSentiment) -> Result<(), RepositoryError>;

    async fn save_mentions(&self, mentions: &[Mention]) -> Result<(), RepositoryError>;
    async fn get_mention_pattern(
        &self,
        tenant_id: &str,
        entity_type: crate::model::EntityType,
        text: &str,
        project_context_id: Option<&str>,
    ) -> Result<Option<MentionPattern>, RepositoryError>;
    async fn bump_pattern_links(&self, pattern_id: i64) -> Result<(), RepositoryError>;
    async fn bump_affinity(
        &self,
        entity_id: &str,
        project_id: &str,
    ) -> Result<EntityProjectAffinity, RepositoryError>;

    async fn get_person(&self, tenant_id: &str, email: &str) -> Result<Option<PersonInfo>, RepositoryError>;
    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectInfo>, RepositoryError>;
    async fn get_thread_messages(
        &self,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<ThreadMessageInfo>, RepositoryError>;
    async fn get_project_tickets(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<TicketInfo>, RepositoryError>;
    async fn get_project_decisions(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<DecisionInfo>, RepositoryError>;
    async fn get_recent_meetings(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<MeetingInfo>, RepositoryError>;
}

pub(crate) fn stage_status_is_error(status: StageStatus) -> bool {
    matches!(status, StageStatus::Failed)
}
