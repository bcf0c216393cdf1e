//! CRUD operations for the `extraction_runs` LLM audit table.

use super::DbPool;
use crate::error::RepositoryError;
use crate::model::{ExtractionRun, ExtractionStatus};

#[derive(sqlx::FromRow)]
struct ExtractionRunRow {
    id: String,
    tenant_id: String,
    source_id: String,
    thread_id: Option<String>,
    project_id: Option<String>,
    template_id: String,
    template_version: i64,
    model_id: String,
    model_version: String,
    rendered_prompt: String,
    input_tokens: i64,
    output_tokens: i64,
    latency_ms: i64,
    raw_response: String,
    parsed: Option<String>,
    parse_errors: String,
    status: String,
}

fn status_from_str(s: &str) -> ExtractionStatus {
    match s {
        "completed" => ExtractionStatus::Completed,
        "partial" => ExtractionStatus::Partial,
        _ => ExtractionStatus::Failed,
    }
}

impl ExtractionRunRow {
    fn into_domain(self) -> Result<ExtractionRun, RepositoryError> {
        let parsed = self
            .parsed
            .map(|p| serde_json::from_str(&p))
            .transpose()
            .map_err(|e: serde_json::Error| RepositoryError::Decode {
                what: "extraction_runs.parsed".into(),
                message: e.to_string(),
            })?;
        let parse_errors = serde_json::from_str(&self.parse_errors).map_err(|e| {
            RepositoryError::Decode {
                what: "extraction_runs.parse_errors".into(),
                message: e.to_string(),
            }
        })?;

        Ok(ExtractionRun {
            id: self.id,
            tenant_id: self.tenant_id,
            source_id: self.source_id,
            thread_id: self.thread_id,
            project_id: self.project_id,
            template_id: self.template_id,
            template_version: self.template_version,
            model_id: self.model_id,
            model_version: self.model_version,
            rendered_prompt: self.rendered_prompt,
            input_tokens: self.input_tokens as u32,
            output_tokens: self.output_tokens as u32,
            latency_ms: self.latency_ms as u64,
            raw_response: self.raw_response,
            parsed,
            parse_errors,
            status: status_from_str(&self.status),
        })
    }
}

pub async fn insert(pool: &DbPool, run: &ExtractionRun) -> Result<(), RepositoryError> {
    let parsed_json = run.parsed.as_ref().map(|v| v.to_string());
    let parse_errors_json = serde_json::to_string(&run.parse_errors).unwrap_or_default();

    sqlx::query(
        "INSERT INTO extraction_runs \
         (id, tenant_id, source_id, thread_id, project_id, template_id, template_version, \
          model_id, model_version, rendered_prompt, input_tokens, output_tokens, latency_ms, \
          raw_response, parsed, parse_errors, status) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&run.id)
    .bind(&run.tenant_id)
    .bind(&run.source_id)
    .bind(&run.thread_id)
    .bind(&run.project_id)
    .bind(&run.template_id)
    .bind(run.template_version)
    .bind(&run.model_id)
    .bind(&run.model_version)
    .bind(&run.rendered_prompt)
    .bind(run.input_tokens as i64)
    .bind(run.output_tokens as i64)
    .bind(run.latency_ms as i64)
    .bind(&run.raw_response)
    .bind(parsed_json)
    .bind(parse_errors_json)
    .bind(run.status.as_str())
    .execute(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(())
}

pub async fn get_by_id(pool: &DbPool, id: &str) -> Result<Option<ExtractionRun>, RepositoryError> {
    let row = sqlx::query_as::<_, ExtractionRunRow>("SELECT * FROM extraction_runs WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| RepositoryError::Query { source: e })?;

    row.map(ExtractionRunRow::into_domain).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    fn sample_run(id: &str) -> ExtractionRun {
        ExtractionRun {
            id: id.to_string(),
            tenant_id: "tenant_a".to_string(),
            source_id: "src_1".to_string(),
            thread_id: None,
            project_id: Some("proj_1".to_string()),
            template_id: "tpl_default".to_string(),
            template_version: 3,
            model_id: "claude-3".to_string(),
            model_version: "2026-01-01".to_string(),
            rendered_prompt: "extract risks from ...".to_string(),
            input_tokens: 120,
            output_tokens: 60,
            latency_ms: 850,
            raw_response: "{}".to_string(),
            parsed: Some(serde_json::json!({ "risks": [] })),
            parse_errors: vec![],
            status: ExtractionStatus::Completed,
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_round_trip() {
        let pool = init_test_db().await.expect("init db");
        let run = sample_run("run_1");
        insert(&pool, &run).await.expect("insert");

        let fetched = get_by_id(&pool, "run_1")
            .await
            .expect("get")
            .expect("should exist");
        assert_eq!(fetched.model_id, "claude-3");
        assert_eq!(fetched.status, ExtractionStatus::Completed);
        assert_eq!(fetched.parsed.unwrap()["risks"], serde_json::json!([]));
    }
}
