//! CRUD operations for the `content_sentiments` table.

use super::DbPool;
use crate::error::RepositoryError;
use crate::model::ContentSentiment;

#[derive(sqlx::FromRow)]
struct SentimentRow {
    source_id: String,
    extraction_run_id: String,
    overall: String,
    detail: Option<String>,
}

impl SentimentRow {
    fn into_domain(self) -> Result<ContentSentiment, RepositoryError> {
        let detail = self
            .detail
            .map(|d| serde_json::from_str(&d))
            .transpose()
            .map_err(|e: serde_json::Error| RepositoryError::Decode {
                what: "content_sentiments.detail".into(),
                message: e.to_string(),
            })?;

        Ok(ContentSentiment {
            source_id: self.source_id,
            extraction_run_id: self.extraction_run_id,
            overall: self.overall,
            detail,
        })
    }
}

pub async fn upsert(pool: &DbPool, sentiment: &ContentSentiment) -> Result<(), RepositoryError> {
    let detail_json = sentiment.detail.as_ref().map(|v| v.to_string());

    sqlx::query(
        "INSERT INTO content_sentiments (source_id, extraction_run_id, overall, detail) \
         VALUES (?, ?, ?, ?) \
         ON CONFLICT(extraction_run_id) DO UPDATE SET overall = excluded.overall, detail = excluded.detail",
    )
    .bind(&sentiment.source_id)
    .bind(&sentiment.extraction_run_id)
    .bind(&sentiment.overall)
    .bind(detail_json)
    .execute(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(())
}

pub async fn get_for_source(
    pool: &DbPool,
    source_id: &str,
) -> Result<Option<ContentSentiment>, RepositoryError> {
    let row = sqlx::query_as::<_, SentimentRow>(
        "SELECT * FROM content_sentiments WHERE source_id = ? ORDER BY rowid DESC LIMIT 1",
    )
    .bind(source_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    row.map(SentimentRow::into_domain).transpose()
}
