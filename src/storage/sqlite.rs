//! Reference `Repository` implementation backed by the SQLite pool.

use async_trait::async_trait;

use super::{
    affinities, assertions, context_queries, enrichments, extraction_runs, mention_patterns,
    mentions, sentiments, stage_results, DbPool, Repository,
};
use crate::error::RepositoryError;
use crate::model::{
    Assertion, ContentSentiment, DecisionInfo, EntityProjectAffinity, EntityType, Enrichment,
    EnrichmentStatus, ExtractionRun, Mention, MentionPattern, MeetingInfo, PersonInfo,
    ProjectInfo, Stage, StageResult, ThreadMessageInfo, TicketInfo,
};

pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn upsert_enrichment(&self, enrichment: &Enrichment) -> Result<(), RepositoryError> {
        enrichments::upsert(&self.pool, enrichment).await
    }

    async fn update_enrichment(&self, enrichment: &Enrichment) -> Result<(), RepositoryError> {
        enrichments::upsert(&self.pool, enrichment).await
    }

    async fn update_status(
        &self,
        enrichment_id: &str,
        status: EnrichmentStatus,
        stage: Option<Stage>,
    ) -> Result<(), RepositoryError> {
        enrichments::update_status(&self.pool, enrichment_id, status, stage).await
    }

    async fn mark_failed(&self, enrichment_id: &str, message: &str) -> Result<(), RepositoryError> {
        enrichments::mark_failed(&self.pool, enrichment_id, message).await
    }

    async fn record_stage(&self, result: &StageResult) -> Result<(), RepositoryError> {
        stage_results::insert(&self.pool, result).await
    }

    async fn save_extraction_run(&self, run: &ExtractionRun) -> Result<(), RepositoryError> {
        extraction_runs::insert(&self.pool, run).await
    }

    async fn save_assertions(&self, list: &[Assertion]) -> Result<(), RepositoryError> {
        assertions::insert_all(&self.pool, list).await
    }

    async fn save_sentiment(&self, sentiment: &ContentSentiment) -> Result<(), RepositoryError> {
        sentiments::upsert(&self.pool, sentiment).await
    }

    async fn save_mentions(&self, list: &[Mention]) -> Result<(), RepositoryError> {
        mentions::insert_all(&self.pool, list).await
    }

    async fn get_mention_pattern(
        &self,
        tenant_id: &str,
        entity_type: EntityType,
        text: &str,
        project_context_id: Option<&str>,
    ) -> Result<Option<MentionPattern>, RepositoryError> {
        mention_patterns::find(&self.pool, tenant_id, entity_type, text, project_context_id).await
    }

    async fn bump_pattern_links(&self, pattern_id: i64) -> Result<(), RepositoryError> {
        mention_patterns::bump_links(&self.pool, pattern_id).await
    }

    async fn bump_affinity(
        &self,
        entity_id: &str,
        project_id: &str,
    ) -> Result<EntityProjectAffinity, RepositoryError> {
        affinities::bump(&self.pool, entity_id, project_id).await
    }

    async fn get_person(&self, tenant_id: &str, email: &str) -> Result<Option<PersonInfo>, RepositoryError> {
        context_queries::get_person(&self.pool, tenant_id, email).await
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectInfo>, RepositoryError> {
        context_queries::get_project(&self.pool, project_id).await
    }

    async fn get_thread_messages(
        &self,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<ThreadMessageInfo>, RepositoryError> {
        context_queries::get_thread_messages(&self.pool, thread_id, limit).await
    }

    async fn get_project_tickets(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<TicketInfo>, RepositoryError> {
        context_queries::get_project_tickets(&self.pool, project_id, limit).await
    }

    async fn get_project_decisions(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<DecisionInfo>, RepositoryError> {
        context_queries::get_project_decisions(&self.pool, project_id, limit).await
    }

    async fn get_recent_meetings(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<MeetingInfo>, RepositoryError> {
        context_queries::get_recent_meetings(&self.pool, project_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classification, ContentType, ProcessingProfile, Source, SourceSystem};
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
    async fn repository_round_trips_through_trait_object() {
        let pool = init_test_db().await.expect("init db");
        let repo: Box<dyn Repository> = Box::new(SqliteRepository::new(pool));

        let enrichment = Enrichment::new_pending(&sample_source(), sample_classification());
        repo.upsert_enrichment(&enrichment).await.expect("upsert");
        repo.mark_failed(&enrichment.id, "boom").await.expect("mark failed");

        assert!(repo.get_project("missing").await.expect("query").is_none());
    }
}
