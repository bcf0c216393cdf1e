//! CRUD operations for the `stage_results` audit table.

use super::DbPool;
use crate::error::RepositoryError;
use crate::model::{StageResult, StageStatus};

pub async fn insert(pool: &DbPool, result: &StageResult) -> Result<(), RepositoryError> {
    let input_json = result.input_data.as_ref().map(|v| v.to_string());
    let output_json = result.output_data.as_ref().map(|v| v.to_string());

    sqlx::query(
        "INSERT INTO stage_results \
         (enrichment_id, stage_name, processor_name, status, input_data, output_data, \
          error_message, started_at, completed_at, duration_ms) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&result.enrichment_id)
    .bind(&result.stage_name)
    .bind(&result.processor_name)
    .bind(result.status.as_str())
    .bind(input_json)
    .bind(output_json)
    .bind(&result.error_message)
    .bind(result.started_at)
    .bind(result.completed_at)
    .bind(result.duration_ms)
    .execute(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(())
}

#[derive(sqlx::FromRow)]
struct CountRow {
    n: i64,
}

pub async fn count_for_enrichment(
    pool: &DbPool,
    enrichment_id: &str,
    status: StageStatus,
) -> Result<i64, RepositoryError> {
    let row = sqlx::query_as::<_, CountRow>(
        "SELECT COUNT(*) as n FROM stage_results WHERE enrichment_id = ? AND status = ?",
    )
    .bind(enrichment_id)
    .bind(status.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(row.n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;
    use chrono::Utc;

    fn sample_result(enrichment_id: &str, status: StageStatus) -> StageResult {
        let now = Utc::now();
        StageResult {
            id: 0,
            enrichment_id: enrichment_id.to_string(),
            stage_name: "common_enrichment".to_string(),
            processor_name: "participant_extractor".to_string(),
            status,
            input_data: None,
            output_data: Some(serde_json::json!({ "count": 2 })),
            error_message: None,
            started_at: now,
            completed_at: now,
            duration_ms: 5,
        }
    }

    #[tokio::test]
    async fn insert_and_count_by_status() {
        let pool = init_test_db().await.expect("init db");
        insert(&pool, &sample_result("enr_1", StageStatus::Completed))
            .await
            .expect("insert completed");
        insert(&pool, &sample_result("enr_1", StageStatus::Failed))
            .await
            .expect("insert failed");

        assert_eq!(
            count_for_enrichment(&pool, "enr_1", StageStatus::Completed)
                .await
                .expect("count"),
            1
        );
        assert_eq!(
            count_for_enrichment(&pool, "enr_1", StageStatus::Failed)
                .await
                .expect("count"),
            1
        );
    }
}
