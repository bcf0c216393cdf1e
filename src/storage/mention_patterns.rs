//! CRUD operations for `mention_patterns` (tier-2 mention resolution cache).

use super::mentions::{entity_type_as_str, entity_type_from_str};
use super::DbPool;
use crate::error::RepositoryError;
use crate::model::{EntityType, MentionPattern};

#[derive(sqlx::FromRow)]
struct MentionPatternRow {
    id: i64,
    tenant_id: String,
    entity_type: String,
    text: String,
    project_context_id: Option<String>,
    entity_id: String,
    times_linked: i64,
    confidence: f64,
}

impl From<MentionPatternRow> for MentionPattern {
    fn from(r: MentionPatternRow) -> Self {
        MentionPattern {
            id: r.id,
            tenant_id: r.tenant_id,
            entity_type: entity_type_from_str(&r.entity_type),
            text: r.text,
            project_context_id: r.project_context_id,
            entity_id: r.entity_id,
            times_linked: r.times_linked,
            confidence: r.confidence,
        }
    }
}

/// Look up a learned pattern by tenant/type/text/project. `project_context_id`
/// is matched exactly, including the `NULL` (no project) case.
pub async fn find(
    pool: &DbPool,
    tenant_id: &str,
    entity_type: EntityType,
    text: &str,
    project_context_id: Option<&str>,
) -> Result<Option<MentionPattern>, RepositoryError> {
    let row = sqlx::query_as::<_, MentionPatternRow>(
        "SELECT * FROM mention_patterns \
         WHERE tenant_id = ? AND entity_type = ? AND text = ? \
           AND project_context_id IS ?",
    )
    .bind(tenant_id)
    .bind(entity_type_as_str(entity_type))
    .bind(text)
    .bind(project_context_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(row.map(MentionPattern::from))
}

/// Record a new learned pattern, or bump `times_linked` on an existing one.
pub async fn upsert(
    pool: &DbPool,
    tenant_id: &str,
    entity_type: EntityType,
    text: &str,
    project_context_id: Option<&str>,
    entity_id: &str,
    confidence: f64,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO mention_patterns \
         (tenant_id, entity_type, text, project_context_id, entity_id, times_linked, confidence) \
         VALUES (?, ?, ?, ?, ?, 1, ?) \
         ON CONFLICT(tenant_id, entity_type, text, project_context_id) DO UPDATE SET \
            times_linked = times_linked + 1, entity_id = excluded.entity_id, \
            confidence = excluded.confidence",
    )
    .bind(tenant_id)
    .bind(entity_type_as_str(entity_type))
    .bind(text)
    .bind(project_context_id)
    .bind(entity_id)
    .bind(confidence)
    .execute(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(())
}

pub async fn bump_links(pool: &DbPool, pattern_id: i64) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE mention_patterns SET times_linked = times_linked + 1 WHERE id = ?")
        .bind(pattern_id)
        .execute(pool)
        .await
        .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(())
}
