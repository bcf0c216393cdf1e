//! LLM Extractor (Stage 5): template resolution, context assembly, prompt
//! render, LLM call, parse, and persistence (spec.md §4.5 steps 1-7).
//!
//! Invoked only when `ai::router::route` returns `Call`. A returned `Err`
//! is fatal for the item — the orchestrator marks the enrichment `failed`.

use std::sync::Arc;

use chrono::Utc;

use crate::context::{self, budget::ContextTier};
use crate::error::PipelineError;
use crate::llm::{CompletionRequest, LlmClient};
use crate::model::{
    Assertion, AssertionType, ContentSentiment, Enrichment, ExtractionRun, Source, uuid_like,
};
use crate::storage::Repository;
use crate::templates::{Template, TemplateRepository, TemplateResolver};

use super::parse::{self, ExtractionItem, ExtractionOutput};

#[derive(Debug, Clone)]
pub struct LlmExtractorConfig {
    pub model_id: String,
    pub model_version: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
}

pub struct AiExtractor<R: TemplateRepository> {
    templates: TemplateResolver<R>,
    llm: Arc<dyn LlmClient>,
    config: LlmExtractorConfig,
}

impl<R: TemplateRepository> AiExtractor<R> {
    pub fn new(templates: TemplateResolver<R>, llm: Arc<dyn LlmClient>, config: LlmExtractorConfig) -> Self {
        Self { templates, llm, config }
    }

    /// Runs steps 1-7 against `enrichment` in place, persisting the
    /// extraction run, its assertions, and any sentiment row.
    pub async fn extract(
        &self,
        repo: &dyn Repository,
        enrichment: &mut Enrichment,
        source: &Source,
    ) -> Result<(), PipelineError> {
        let profile = enrichment
            .classification
            .as_ref()
            .ok_or_else(|| PipelineError::Classification("enrichment has no classification".to_string()))?
            .profile;

        let template = self
            .templates
            .resolve(&enrichment.tenant_id, enrichment.project_id.as_deref())
            .await?;

        let tier = ContextTier::for_profile(profile);
        let assembled = context::build(repo, enrichment, tier).await?;

        let body = source
            .metadata_str("body_text")
            .or_else(|| source.metadata_str("body"))
            .unwrap_or(&source.raw_content);

        let prompt = template.render(&assembled.render(), body);

        tracing::info!(
            enrichment_id = %enrichment.id,
            template_id = %template.id,
            tier = ?tier,
            "calling LLM extractor",
        );

        let request = CompletionRequest {
            model: self.config.model_id.clone(),
            prompt: prompt.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            timeout_ms: self.config.timeout_ms,
            metadata: None,
        };

        let response = self.llm.complete(request).await?;
        let outcome = parse::parse(&response.content);

        let run_id = uuid_like(&format!("{}:{}", enrichment.id, response.content), "run");
        let run = ExtractionRun {
            id: run_id.clone(),
            tenant_id: enrichment.tenant_id.clone(),
            source_id: enrichment.source_id.clone(),
            thread_id: enrichment.thread_id.clone(),
            project_id: enrichment.project_id.clone(),
            template_id: template.id.clone(),
            template_version: template.version,
            model_id: response.model.clone(),
            model_version: self.config.model_version.clone(),
            rendered_prompt: prompt,
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
            latency_ms: response.latency_ms,
            raw_response: response.content.clone(),
            parsed: outcome
                .output
                .as_ref()
                .map(|o| serde_json::to_value(o).unwrap_or(serde_json::Value::Null)),
            parse_errors: outcome.errors.clone(),
            status: outcome.status,
        };
        repo.save_extraction_run(&run).await?;

        if let Some(output) = &outcome.output {
            let assertions = into_assertions(&run, output);
            if !assertions.is_empty() {
                repo.save_assertions(&assertions).await?;
            }

            if let Some(sentiment) = &output.sentiment {
                if !sentiment.overall.is_empty() {
                    repo.save_sentiment(&ContentSentiment {
                        source_id: enrichment.source_id.clone(),
                        extraction_run_id: run_id,
                        overall: sentiment.overall.clone(),
                        detail: Some(serde_json::Value::Object(sentiment.detail.clone())),
                    })
                    .await?;
                }
            }

            enrichment.extracted_data.extraction =
                Some(serde_json::to_value(output).unwrap_or(serde_json::Value::Null));
        }

        enrichment.ai_processed = true;
        enrichment.ai_processed_at = Some(Utc::now());

        Ok(())
    }
}

/// Object-safe facade over `AiExtractor<R>` so the pipeline orchestrator can
/// hold one without naming the concrete `TemplateRepository` type.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    async fn run(
        &self,
        repo: &dyn Repository,
        enrichment: &mut Enrichment,
        source: &Source,
    ) -> Result<(), PipelineError>;
}

#[async_trait::async_trait]
impl<R: TemplateRepository> Extractor for AiExtractor<R> {
    async fn run(
        &self,
        repo: &dyn Repository,
        enrichment: &mut Enrichment,
        source: &Source,
    ) -> Result<(), PipelineError> {
        self.extract(repo, enrichment, source).await
    }
}

fn role_slot_for(assertion_type: AssertionType) -> &'static str {
    match assertion_type {
        AssertionType::Risk => "owner",
        AssertionType::Action => "assignee",
        AssertionType::Decision => "decision_maker",
        AssertionType::Commitment => "committer",
        AssertionType::Issue => "owner",
        AssertionType::Question => "asked_by",
    }
}

fn into_assertions(run: &ExtractionRun, output: &ExtractionOutput) -> Vec<Assertion> {
    let groups: [(AssertionType, &[ExtractionItem]); 6] = [
        (AssertionType::Risk, &output.risks),
        (AssertionType::Action, &output.actions),
        (AssertionType::Issue, &output.issues),
        (AssertionType::Decision, &output.decisions),
        (AssertionType::Commitment, &output.commitments),
        (AssertionType::Question, &output.questions),
    ];

    let mut assertions = Vec::new();
    for (assertion_type, items) in groups {
        for (i, item) in items.iter().enumerate() {
            assertions.push(Assertion {
                id: uuid_like(&format!("{}:{}:{}:{i}", run.id, assertion_type.as_str(), item.description), "ast"),
                tenant_id: run.tenant_id.clone(),
                source_id: run.source_id.clone(),
                extraction_run_id: run.id.clone(),
                assertion_type,
                description: item.description.clone(),
                source_quote: item.source_quote.clone(),
                confidence: item.confidence,
                role: item.role.clone(),
                role_slot: item.role.as_ref().map(|_| role_slot_for(assertion_type).to_string()),
                project_id: run.project_id.clone(),
                due_date: item.due_date,
                severity: item.severity.clone(),
                status: item.status.clone(),
                answered: item.answered,
            });
        }
    }
    assertions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::CompletionResponse;
    use crate::model::{Classification, ContentType, ProcessingProfile, SourceSystem};
    use crate::storage::{init_test_db, sqlite::SqliteRepository};
    use crate::templates::TemplateError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StubLlm {
        response: String,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: self.response.clone(),
                model: "stub-model".to_string(),
                input_tokens: 42,
                output_tokens: 7,
                finish_reason: "stop".to_string(),
                latency_ms: 12,
            })
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }

    struct FixedTemplateRepo;

    #[async_trait]
    impl TemplateRepository for FixedTemplateRepo {
        async fn get_by_project_id(&self, _: &str, _: &str) -> Result<Option<Template>, TemplateError> {
            Ok(None)
        }
        async fn get_tenant_default(&self, _: &str) -> Result<Option<Template>, TemplateError> {
            Ok(None)
        }
        async fn get_system_default(&self) -> Result<Template, TemplateError> {
            Ok(Template {
                id: "system_default".to_string(),
                version: 1,
                body: "{context}\n{content}".to_string(),
                extraction_schema: serde_json::json!({}),
                project_id: None,
                tenant_id: None,
                active: true,
            })
        }
        async fn get_by_id(&self, _: &str) -> Result<Option<Template>, TemplateError> {
            Ok(None)
        }
    }

    fn sample_source() -> Source {
        Source {
            id: "src_1".to_string(),
            tenant_id: "tenant_a".to_string(),
            source_system: "email".to_string(),
            external_id: None,
            content_hash: "abc".to_string(),
            raw_content: "please review the attached proposal".to_string(),
            content_type: "message/rfc822".to_string(),
            metadata: HashMap::new(),
        }
    }

    fn sample_enrichment(source: &Source) -> Enrichment {
        Enrichment::new_pending(
            source,
            Classification {
                content_type: ContentType::Email,
                subtype: "email/standalone".to_string(),
                profile: ProcessingProfile::FullAi,
                source_system: SourceSystem::HumanEmail,
                rule_name: "default_email".to_string(),
                reason: "fallback".to_string(),
                rule_priority: 100,
                confidence: 0.5,
            },
        )
    }

    fn config() -> LlmExtractorConfig {
        LlmExtractorConfig {
            model_id: "claude-sonnet".to_string(),
            model_version: "2025-01".to_string(),
            max_tokens: 512,
            temperature: 0.2,
            timeout_ms: 5_000,
        }
    }

    #[tokio::test]
    async fn successful_extraction_persists_run_and_assertions() {
        let pool = init_test_db().await.expect("init db");
        let repo = SqliteRepository::new(pool);
        let source = sample_source();
        let mut enrichment = sample_enrichment(&source);

        let response = serde_json::json!({
            "risks": [{"description": "timeline slip", "confidence": 0.8}],
            "actions": [{"description": "schedule review", "role": "Jane Doe", "confidence": 0.7}],
            "sentiment": {"overall": "neutral"}
        })
        .to_string();

        let extractor = AiExtractor::new(
            TemplateResolver::new(FixedTemplateRepo),
            Arc::new(StubLlm { response }),
            config(),
        );

        extractor
            .extract(&repo, &mut enrichment, &source)
            .await
            .expect("extract");

        assert!(enrichment.ai_processed);
        assert!(enrichment.ai_processed_at.is_some());
        assert!(enrichment.extracted_data.extraction.is_some());
    }

    #[tokio::test]
    async fn parse_error_marks_run_partial_but_does_not_fail_pipeline() {
        let pool = init_test_db().await.expect("init db");
        let repo = SqliteRepository::new(pool.clone());
        let source = sample_source();
        let mut enrichment = sample_enrichment(&source);
        let enrichment_id = enrichment.id.clone();
        let response = "not valid json".to_string();

        let extractor = AiExtractor::new(
            TemplateResolver::new(FixedTemplateRepo),
            Arc::new(StubLlm {
                response: response.clone(),
            }),
            config(),
        );

        let result = extractor.extract(&repo, &mut enrichment, &source).await;
        assert!(result.is_ok());
        assert!(enrichment.ai_processed);

        let run_id = uuid_like(&format!("{enrichment_id}:{response}"), "run");
        let run = crate::storage::extraction_runs::get_by_id(&pool, &run_id)
            .await
            .expect("get run")
            .expect("run should be persisted");
        assert_eq!(run.status, crate::model::ExtractionStatus::Partial);
        assert!(!run.parse_errors.is_empty());
        assert_eq!(run.parsed, Some(serde_json::to_value(ExtractionOutput::default()).unwrap()));
    }

    #[tokio::test]
    async fn llm_error_is_fatal_for_the_item() {
        let pool = init_test_db().await.expect("init db");
        let repo = SqliteRepository::new(pool);
        let source = sample_source();
        let mut enrichment = sample_enrichment(&source);

        let extractor = AiExtractor::new(
            TemplateResolver::new(FixedTemplateRepo),
            Arc::new(FailingLlm),
            config(),
        );

        let result = extractor.extract(&repo, &mut enrichment, &source).await;
        assert!(matches!(result, Err(PipelineError::AiExtraction(_))));
        assert!(!enrichment.ai_processed);
    }
}
