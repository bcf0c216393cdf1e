//! CRUD operations for the `mentions` table (stage-6 resolved mentions).

use super::DbPool;
use crate::error::RepositoryError;
use crate::model::{EntityType, Mention, MentionStatus, MentionTier};

#[derive(sqlx::FromRow)]
struct MentionRow {
    id: String,
    content_id: String,
    entity_type: String,
    mentioned_text: String,
    context_snippet: String,
    project_context_id: Option<String>,
    entity_id: Option<String>,
    status: String,
    confidence: f64,
    tier: String,
}

pub(crate) fn entity_type_from_str(s: &str) -> EntityType {
    match s {
        "person" => EntityType::Person,
        "term" => EntityType::Term,
        "product" => EntityType::Product,
        "company" => EntityType::Company,
        "project" => EntityType::Project,
        _ => EntityType::Ticket,
    }
}

fn status_from_str(s: &str) -> MentionStatus {
    match s {
        "auto_linked" => MentionStatus::AutoLinked,
        "pattern_linked" => MentionStatus::PatternLinked,
        "ambiguous" => MentionStatus::Ambiguous,
        "dismissed" => MentionStatus::Dismissed,
        _ => MentionStatus::QueuedForReview,
    }
}

fn tier_from_str(s: &str) -> MentionTier {
    match s {
        "exact_identity" => MentionTier::ExactIdentity,
        "pattern_cache" => MentionTier::PatternCache,
        _ => MentionTier::Affinity,
    }
}

impl From<MentionRow> for Mention {
    fn from(r: MentionRow) -> Self {
        Mention {
            id: r.id,
            content_id: r.content_id,
            entity_type: entity_type_from_str(&r.entity_type),
            mentioned_text: r.mentioned_text,
            context_snippet: r.context_snippet,
            project_context_id: r.project_context_id,
            entity_id: r.entity_id,
            status: status_from_str(&r.status),
            confidence: r.confidence,
            tier: tier_from_str(&r.tier),
        }
    }
}

fn tier_as_str(tier: MentionTier) -> &'static str {
    match tier {
        MentionTier::ExactIdentity => "exact_identity",
        MentionTier::PatternCache => "pattern_cache",
        MentionTier::Affinity => "affinity",
    }
}

pub(crate) fn entity_type_as_str(entity_type: EntityType) -> &'static str {
    entity_type.as_str()
}

pub async fn insert_all(pool: &DbPool, mentions: &[Mention]) -> Result<(), RepositoryError> {
    for m in mentions {
        sqlx::query(
            "INSERT INTO mentions \
             (id, content_id, entity_type, mentioned_text, context_snippet, \
              project_context_id, entity_id, status, confidence, tier) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&m.id)
        .bind(&m.content_id)
        .bind(entity_type_as_str(m.entity_type))
        .bind(&m.mentioned_text)
        .bind(&m.context_snippet)
        .bind(&m.project_context_id)
        .bind(&m.entity_id)
        .bind(m.status.as_str())
        .bind(m.confidence)
        .bind(tier_as_str(m.tier))
        .execute(pool)
        .await
        .map_err(|e| RepositoryError::Query { source: e })?;
    }

    Ok(())
}

pub async fn get_for_content(pool: &DbPool, content_id: &str) -> Result<Vec<Mention>, RepositoryError> {
    let rows = sqlx::query_as::<_, MentionRow>("SELECT * FROM mentions WHERE content_id = ?")
        .bind(content_id)
        .fetch_all(pool)
        .await
        .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(rows.into_iter().map(Mention::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    fn sample_mention(id: &str) -> Mention {
        Mention {
            id: id.to_string(),
            content_id: "src_1".to_string(),
            entity_type: EntityType::Person,
            mentioned_text: "jane".to_string(),
            context_snippet: "...jane will own this...".to_string(),
            project_context_id: Some("proj_1".to_string()),
            entity_id: Some("person_42".to_string()),
            status: MentionStatus::AutoLinked,
            confidence: 0.95,
            tier: MentionTier::ExactIdentity,
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_for_content() {
        let pool = init_test_db().await.expect("init db");
        insert_all(&pool, &[sample_mention("m1")]).await.expect("insert");

        let fetched = get_for_content(&pool, "src_1").await.expect("get");
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].entity_id.as_deref(), Some("person_42"));
        assert_eq!(fetched[0].tier, MentionTier::ExactIdentity);
    }
}
