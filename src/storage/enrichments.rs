//! CRUD operations for the `enrichments` table.
//!
//! `Enrichment` embeds several nested structs (`Classification`,
//! `ExtractedData`, ...) that don't map cleanly onto `sqlx::FromRow`
//! columns, so rows are read into a flat intermediate and assembled by
//! hand rather than deriving `FromRow` on the domain type directly.

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::error::RepositoryError;
use crate::model::{
    Classification, ContentType, Enrichment, EnrichmentStatus, ExtractedData, ProcessingProfile,
    ResolvedParticipant, Stage, SourceSystem,
};

#[derive(sqlx::FromRow)]
struct EnrichmentRow {
    id: String,
    source_id: String,
    tenant_id: String,

    content_type: Option<String>,
    subtype: Option<String>,
    profile: Option<String>,
    source_system: Option<String>,
    rule_name: Option<String>,
    classification_reason: Option<String>,
    rule_priority: Option<i64>,
    confidence: Option<f64>,

    status: String,
    current_stage: Option<String>,
    error_message: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    ai_processed: bool,
    ai_processed_at: Option<DateTime<Utc>>,
    ai_skip_reason: Option<String>,

    thread_id: Option<String>,
    project_id: Option<String>,
    resolved_participants: String,

    extracted_links: String,
    extracted_data: String,
}

fn content_type_from_str(s: &str) -> Option<ContentType> {
    match s {
        "email" => Some(ContentType::Email),
        "calendar" => Some(ContentType::Calendar),
        "document" => Some(ContentType::Document),
        "other" => Some(ContentType::Other),
        _ => None,
    }
}

fn content_type_as_str(c: ContentType) -> &'static str {
    match c {
        ContentType::Email => "email",
        ContentType::Calendar => "calendar",
        ContentType::Document => "document",
        ContentType::Other => "other",
    }
}

fn profile_from_str(s: &str) -> Option<ProcessingProfile> {
    match s {
        "full_ai" => Some(ProcessingProfile::FullAi),
        "full_ai_chunked" => Some(ProcessingProfile::FullAiChunked),
        "metadata_only" => Some(ProcessingProfile::MetadataOnly),
        "state_tracking" => Some(ProcessingProfile::StateTracking),
        "structure_only" => Some(ProcessingProfile::StructureOnly),
        "ocr_if_text" => Some(ProcessingProfile::OcrIfText),
        _ => None,
    }
}

fn source_system_from_str(s: &str) -> Option<SourceSystem> {
    match s {
        "jira" => Some(SourceSystem::Jira),
        "aha" => Some(SourceSystem::Aha),
        "google_docs" => Some(SourceSystem::GoogleDocs),
        "webex" => Some(SourceSystem::Webex),
        "smartsheet" => Some(SourceSystem::Smartsheet),
        "auto_reply" => Some(SourceSystem::AutoReply),
        "outlook_calendar" => Some(SourceSystem::OutlookCalendar),
        "human_email" => Some(SourceSystem::HumanEmail),
        _ => None,
    }
}

fn stage_from_str(s: &str) -> Option<Stage> {
    match s {
        "classification" => Some(Stage::Classification),
        "common_enrichment" => Some(Stage::CommonEnrichment),
        "type_extraction" => Some(Stage::TypeExtraction),
        "ai_routing" => Some(Stage::AiRouting),
        "ai_processing" => Some(Stage::AiExtraction),
        "post_processing" => Some(Stage::PostProcessing),
        _ => None,
    }
}

fn status_from_str(s: &str) -> EnrichmentStatus {
    match s {
        "pending" => EnrichmentStatus::Pending,
        "classifying" => EnrichmentStatus::Classifying,
        "enriching" => EnrichmentStatus::Enriching,
        "extracting" => EnrichmentStatus::Extracting,
        "ai_processing" => EnrichmentStatus::AiProcessing,
        "completed" => EnrichmentStatus::Completed,
        "failed" => EnrichmentStatus::Failed,
        _ => EnrichmentStatus::Skipped,
    }
}

impl EnrichmentRow {
    fn into_domain(self) -> Result<Enrichment, RepositoryError> {
        let classification = match (
            self.content_type.as_deref(),
            self.profile.as_deref(),
            self.source_system.as_deref(),
        ) {
            (Some(ct), Some(profile), Some(ss)) => Some(Classification {
                content_type: content_type_from_str(ct).ok_or_else(|| RepositoryError::Decode {
                    what: "enrichments.content_type".into(),
                    message: ct.to_string(),
                })?,
                subtype: self.subtype.unwrap_or_default(),
                profile: profile_from_str(profile).ok_or_else(|| RepositoryError::Decode {
                    what: "enrichments.profile".into(),
                    message: profile.to_string(),
                })?,
                source_system: source_system_from_str(ss).ok_or_else(|| RepositoryError::Decode {
                    what: "enrichments.source_system".into(),
                    message: ss.to_string(),
                })?,
                rule_name: self.rule_name.unwrap_or_default(),
                reason: self.classification_reason.unwrap_or_default(),
                rule_priority: self.rule_priority.unwrap_or(0) as u32,
                confidence: self.confidence.unwrap_or(0.0),
            }),
            _ => None,
        };

        let current_stage = self
            .current_stage
            .as_deref()
            .and_then(stage_from_str);

        let resolved_participants: Vec<ResolvedParticipant> =
            serde_json::from_str(&self.resolved_participants).map_err(|e| RepositoryError::Decode {
                what: "enrichments.resolved_participants".into(),
                message: e.to_string(),
            })?;

        let extracted_links = serde_json::from_str(&self.extracted_links).map_err(|e| {
            RepositoryError::Decode {
                what: "enrichments.extracted_links".into(),
                message: e.to_string(),
            }
        })?;

        let extracted_data: ExtractedData =
            serde_json::from_str(&self.extracted_data).map_err(|e| RepositoryError::Decode {
                what: "enrichments.extracted_data".into(),
                message: e.to_string(),
            })?;

        Ok(Enrichment {
            id: self.id,
            source_id: self.source_id,
            tenant_id: self.tenant_id,
            classification,
            status: status_from_str(&self.status),
            current_stage,
            error_message: self.error_message,
            completed_at: self.completed_at,
            ai_processed: self.ai_processed,
            ai_processed_at: self.ai_processed_at,
            ai_skip_reason: self.ai_skip_reason,
            thread_id: self.thread_id,
            project_id: self.project_id,
            resolved_participants,
            extracted_links,
            extracted_data,
        })
    }
}

pub async fn upsert(pool: &DbPool, e: &Enrichment) -> Result<(), RepositoryError> {
    let participants_json = serde_json::to_string(&e.resolved_participants).unwrap_or_default();
    let links_json = serde_json::to_string(&e.extracted_links).unwrap_or_default();
    let data_json = serde_json::to_string(&e.extracted_data).unwrap_or_default();

    sqlx::query(
        "INSERT INTO enrichments \
         (id, source_id, tenant_id, content_type, subtype, profile, source_system, \
          rule_name, classification_reason, rule_priority, confidence, status, \
          current_stage, error_message, completed_at, ai_processed, ai_processed_at, \
          ai_skip_reason, thread_id, project_id, resolved_participants, extracted_links, \
          extracted_data, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now')) \
         ON CONFLICT(id) DO UPDATE SET \
            content_type = excluded.content_type, subtype = excluded.subtype, \
            profile = excluded.profile, source_system = excluded.source_system, \
            rule_name = excluded.rule_name, classification_reason = excluded.classification_reason, \
            rule_priority = excluded.rule_priority, confidence = excluded.confidence, \
            status = excluded.status, current_stage = excluded.current_stage, \
            error_message = excluded.error_message, completed_at = excluded.completed_at, \
            ai_processed = excluded.ai_processed, ai_processed_at = excluded.ai_processed_at, \
            ai_skip_reason = excluded.ai_skip_reason, thread_id = excluded.thread_id, \
            project_id = excluded.project_id, resolved_participants = excluded.resolved_participants, \
            extracted_links = excluded.extracted_links, extracted_data = excluded.extracted_data, \
            updated_at = excluded.updated_at",
    )
    .bind(&e.id)
    .bind(&e.source_id)
    .bind(&e.tenant_id)
    .bind(e.classification.as_ref().map(|c| content_type_as_str(c.content_type)))
    .bind(e.classification.as_ref().map(|c| c.subtype.clone()))
    .bind(e.classification.as_ref().map(|c| c.profile.as_str()))
    .bind(e.classification.as_ref().map(|c| c.source_system.as_str()))
    .bind(e.classification.as_ref().map(|c| c.rule_name.clone()))
    .bind(e.classification.as_ref().map(|c| c.reason.clone()))
    .bind(e.classification.as_ref().map(|c| c.rule_priority as i64))
    .bind(e.classification.as_ref().map(|c| c.confidence))
    .bind(e.status.as_str())
    .bind(e.current_stage.map(|s| s.name()))
    .bind(&e.error_message)
    .bind(e.completed_at)
    .bind(e.ai_processed)
    .bind(e.ai_processed_at)
    .bind(&e.ai_skip_reason)
    .bind(&e.thread_id)
    .bind(&e.project_id)
    .bind(participants_json)
    .bind(links_json)
    .bind(data_json)
    .execute(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(())
}

pub async fn get_by_id(pool: &DbPool, id: &str) -> Result<Option<Enrichment>, RepositoryError> {
    let row = sqlx::query_as::<_, EnrichmentRow>("SELECT * FROM enrichments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| RepositoryError::Query { source: e })?;

    row.map(EnrichmentRow::into_domain).transpose()
}

pub async fn update_status(
    pool: &DbPool,
    enrichment_id: &str,
    status: EnrichmentStatus,
    stage: Option<Stage>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE enrichments SET status = ?, current_stage = ?, \
         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(stage.map(|s| s.name()))
    .bind(enrichment_id)
    .execute(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(())
}

pub async fn mark_failed(
    pool: &DbPool,
    enrichment_id: &str,
    message: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE enrichments SET status = 'failed', error_message = ?, \
         completed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'), \
         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(message)
    .bind(enrichment_id)
    .execute(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use crate::storage::init_test_db;
    use std::collections::HashMap;

    fn sample_source() -> Source {
        Source {
            id: "src_1".to_string(),
            tenant_id: "tenant_a".to_string(),
            source_system: "email".to_string(),
            external_id: None,
            content_hash: "abc".to_string(),
            raw_content: "hello".to_string(),
            content_type: "message/rfc822".to_string(),
            metadata: HashMap::new(),
        }
    }

    fn sample_classification() -> Classification {
        Classification {
            content_type: ContentType::Email,
            subtype: "email/standalone".to_string(),
            profile: ProcessingProfile::FullAi,
            source_system: SourceSystem::HumanEmail,
            rule_name: "default_email".to_string(),
            reason: "fallback".to_string(),
            rule_priority: 100,
            confidence: 0.5,
        }
    }

    #[tokio::test]
    async fn upsert_and_fetch_round_trip() {
        let pool = init_test_db().await.expect("init db");
        let enrichment = Enrichment::new_pending(&sample_source(), sample_classification());

        upsert(&pool, &enrichment).await.expect("upsert");
        let fetched = get_by_id(&pool, &enrichment.id)
            .await
            .expect("get")
            .expect("should exist");

        assert_eq!(fetched.id, enrichment.id);
        assert_eq!(fetched.status, EnrichmentStatus::Pending);
        assert_eq!(
            fetched.classification.unwrap().subtype,
            "email/standalone"
        );
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_conflict() {
        let pool = init_test_db().await.expect("init db");
        let mut enrichment = Enrichment::new_pending(&sample_source(), sample_classification());

        upsert(&pool, &enrichment).await.expect("first upsert");
        enrichment.status = EnrichmentStatus::Completed;
        upsert(&pool, &enrichment).await.expect("second upsert");

        let fetched = get_by_id(&pool, &enrichment.id)
            .await
            .expect("get")
            .expect("should exist");
        assert_eq!(fetched.status, EnrichmentStatus::Completed);
    }

    #[tokio::test]
    async fn mark_failed_sets_status_and_message() {
        let pool = init_test_db().await.expect("init db");
        let enrichment = Enrichment::new_pending(&sample_source(), sample_classification());
        upsert(&pool, &enrichment).await.expect("upsert");

        mark_failed(&pool, &enrichment.id, "boom")
            .await
            .expect("mark failed");

        let fetched = get_by_id(&pool, &enrichment.id)
            .await
            .expect("get")
            .expect("should exist");
        assert_eq!(fetched.status, EnrichmentStatus::Failed);
        assert_eq!(fetched.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let pool = init_test_db().await.expect("init db");
        assert!(get_by_id(&pool, "missing").await.expect("get").is_none());
    }
}
