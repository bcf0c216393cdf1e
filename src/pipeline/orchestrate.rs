//! Drives stages 1-6 for a single `Source` (spec.md §4.7, C9).
//!
//! Stages 2, 3, and 6 are best-effort: a failing processor is recorded in
//! a `StageResult` row and the item keeps moving. Stage 1 and stage 5 are
//! fatal: an error there aborts the item with `status=failed`.

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::ai::router::{self, RouteDecision};
use crate::error::PipelineError;
use crate::model::{Enrichment, Source, Stage, StageResult, StageStatus};
use crate::postprocess;
use crate::registry::{ProcessorContext, ProcessorOutcome};

use super::context::PipelineContext;

pub async fn process(
    ctx: &PipelineContext,
    source: Source,
    cancel: &CancellationToken,
) -> Result<Enrichment, PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled { stage: "classification" });
    }

    let classifier = ctx
        .registry
        .classifier()
        .ok_or_else(|| PipelineError::Classification("no classifier registered".to_string()))?;
    let classification = classifier.classify(&source);

    let mut enrichment = Enrichment::new_pending(&source, classification);
    ctx.repo.upsert_enrichment(&enrichment).await?;

    if cancel.is_cancelled() {
        enrichment.mark_failed(Stage::CommonEnrichment, "cancelled before common enrichment began");
        ctx.repo.update_enrichment(&enrichment).await?;
        return Err(PipelineError::Cancelled { stage: "common_enrichment" });
    }

    let body = body_of(&source);

    for processor in ctx.registry.by_stage(Stage::CommonEnrichment).to_vec() {
        let mut pctx = ProcessorContext {
            source: &source,
            enrichment: &mut enrichment,
            body: &body,
        };
        let result = run_processor(&mut pctx, processor.as_ref());
        ctx.repo.record_stage(&result).await?;
    }

    if cancel.is_cancelled() {
        enrichment.mark_failed(Stage::TypeExtraction, "cancelled before type extraction began");
        ctx.repo.update_enrichment(&enrichment).await?;
        return Err(PipelineError::Cancelled { stage: "type_extraction" });
    }

    let subtype = enrichment
        .classification
        .as_ref()
        .map(|c| c.subtype.clone())
        .unwrap_or_default();
    if let Some(owner) = ctx.registry.typed_for(&subtype) {
        let mut pctx = ProcessorContext {
            source: &source,
            enrichment: &mut enrichment,
            body: &body,
        };
        let result = run_processor(&mut pctx, owner.as_ref());
        ctx.repo.record_stage(&result).await?;
    }

    ctx.repo.update_enrichment(&enrichment).await?;

    if cancel.is_cancelled() {
        enrichment.mark_failed(Stage::AiRouting, "cancelled before AI routing began");
        ctx.repo.update_enrichment(&enrichment).await?;
        return Err(PipelineError::Cancelled { stage: "ai_routing" });
    }

    let profile = enrichment
        .classification
        .as_ref()
        .map(|c| c.profile)
        .ok_or_else(|| PipelineError::Classification("enrichment has no classification".to_string()))?;

    let decision = router::route(profile);
    ctx.repo
        .record_stage(&routing_stage_result(&enrichment.id, &decision))
        .await?;

    match decision {
        RouteDecision::Skip { reason } => {
            enrichment.ai_processed = false;
            enrichment.ai_skip_reason = Some(reason);
        }
        RouteDecision::Call => {
            if cancel.is_cancelled() {
                enrichment.mark_failed(Stage::AiExtraction, "cancelled before AI extraction began");
                ctx.repo.update_enrichment(&enrichment).await?;
                return Err(PipelineError::Cancelled { stage: "ai_processing" });
            }

            let started = Utc::now();
            let outcome = ctx.extractor.run(ctx.repo.as_ref(), &mut enrichment, &source).await;
            let duration_ms = (Utc::now() - started).num_milliseconds().max(0);

            match outcome {
                Ok(()) => {
                    ctx.repo
                        .record_stage(&completed_stage_result(
                            &enrichment.id,
                            Stage::AiExtraction,
                            "llm_extractor",
                            started,
                            duration_ms,
                        ))
                        .await?;
                }
                Err(err) => {
                    ctx.repo
                        .record_stage(&failed_stage_result(
                            &enrichment.id,
                            Stage::AiExtraction,
                            "llm_extractor",
                            started,
                            duration_ms,
                            &err.to_string(),
                        ))
                        .await?;
                    enrichment.mark_failed(Stage::AiExtraction, err.to_string());
                    ctx.repo.update_enrichment(&enrichment).await?;
                    return Err(err);
                }
            }
        }
    }

    ctx.repo.update_enrichment(&enrichment).await?;

    if !cancel.is_cancelled() {
        let started = Utc::now();
        let post_result = postprocess::run(
            ctx.repo.as_ref(),
            ctx.entity_lookup.as_ref(),
            &enrichment.tenant_id,
            &enrichment.source_id,
            &enrichment,
        )
        .await;
        let duration_ms = (Utc::now() - started).num_milliseconds().max(0);

        match post_result {
            Ok(()) => {
                ctx.repo
                    .record_stage(&completed_stage_result(
                        &enrichment.id,
                        Stage::PostProcessing,
                        "mention_resolver",
                        started,
                        duration_ms,
                    ))
                    .await?;
            }
            Err(err) => {
                ctx.repo
                    .record_stage(&failed_stage_result(
                        &enrichment.id,
                        Stage::PostProcessing,
                        "mention_resolver",
                        started,
                        duration_ms,
                        &err.to_string(),
                    ))
                    .await?;
                tracing::warn!(enrichment_id = %enrichment.id, error = %err, "post-processing failed, continuing");
            }
        }
    }

    enrichment.mark_completed();
    ctx.repo.update_enrichment(&enrichment).await?;

    Ok(enrichment)
}

fn body_of(source: &Source) -> String {
    source
        .metadata_str("body_text")
        .or_else(|| source.metadata_str("body"))
        .unwrap_or(&source.raw_content)
        .to_string()
}

fn run_processor(
    pctx: &mut ProcessorContext<'_>,
    processor: &(dyn crate::registry::Processor),
) -> StageResult {
    let started = Utc::now();
    let outcome = processor.process(pctx);
    let duration_ms = (Utc::now() - started).num_milliseconds().max(0);

    let (status, output_data, error_message) = match outcome {
        Ok(ProcessorOutcome::Applied(value)) => (StageStatus::Completed, Some(value), None),
        Ok(ProcessorOutcome::NotApplicable) => (StageStatus::Skipped, None, None),
        Err(err) => (StageStatus::Failed, None, Some(err.to_string())),
    };

    StageResult {
        id: 0,
        enrichment_id: pctx.enrichment.id.clone(),
        stage_name: processor.stage().name().to_string(),
        processor_name: processor.name().to_string(),
        status,
        input_data: None,
        output_data,
        error_message,
        started_at: started,
        completed_at: Utc::now(),
        duration_ms,
    }
}

fn routing_stage_result(enrichment_id: &str, decision: &RouteDecision) -> StageResult {
    let now = Utc::now();
    let output = match decision {
        RouteDecision::Skip { reason } => serde_json::json!({ "decision": "skip", "reason": reason }),
        RouteDecision::Call => serde_json::json!({ "decision": "call" }),
    };

    StageResult {
        id: 0,
        enrichment_id: enrichment_id.to_string(),
        stage_name: Stage::AiRouting.name().to_string(),
        processor_name: "ai_router".to_string(),
        status: StageStatus::Completed,
        input_data: None,
        output_data: Some(output),
        error_message: None,
        started_at: now,
        completed_at: now,
        duration_ms: 0,
    }
}

fn completed_stage_result(
    enrichment_id: &str,
    stage: Stage,
    processor_name: &str,
    started_at: chrono::DateTime<Utc>,
    duration_ms: i64,
) -> StageResult {
    StageResult {
        id: 0,
        enrichment_id: enrichment_id.to_string(),
        stage_name: stage.name().to_string(),
        processor_name: processor_name.to_string(),
        status: StageStatus::Completed,
        input_data: None,
        output_data: None,
        error_message: None,
        started_at,
        completed_at: Utc::now(),
        duration_ms,
    }
}

fn failed_stage_result(
    enrichment_id: &str,
    stage: Stage,
    processor_name: &str,
    started_at: chrono::DateTime<Utc>,
    duration_ms: i64,
    message: &str,
) -> StageResult {
    StageResult {
        id: 0,
        enrichment_id: enrichment_id.to_string(),
        stage_name: stage.name().to_string(),
        processor_name: processor_name.to_string(),
        status: StageStatus::Failed,
        input_data: None,
        output_data: None,
        error_message: Some(message.to_string()),
        started_at,
        completed_at: Utc::now(),
        duration_ms,
    }
}
