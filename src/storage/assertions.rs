//! CRUD operations for the `assertions` table (risk/action/decision/...).

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::error::RepositoryError;
use crate::model::{Assertion, AssertionType};

#[derive(sqlx::FromRow)]
struct AssertionRow {
    id: String,
    tenant_id: String,
    source_id: String,
    extraction_run_id: String,
    assertion_type: String,
    description: String,
    source_quote: Option<String>,
    confidence: f64,
    role: Option<String>,
    role_slot: Option<String>,
    project_id: Option<String>,
    due_date: Option<DateTime<Utc>>,
    severity: Option<String>,
    status: Option<String>,
    answered: Option<bool>,
}

fn assertion_type_from_str(s: &str) -> AssertionType {
    match s {
        "risk" => AssertionType::Risk,
        "action" => AssertionType::Action,
        "decision" => AssertionType::Decision,
        "commitment" => AssertionType::Commitment,
        "issue" => AssertionType::Issue,
        _ => AssertionType::Question,
    }
}

impl From<AssertionRow> for Assertion {
    fn from(r: AssertionRow) -> Self {
        Assertion {
            id: r.id,
            tenant_id: r.tenant_id,
            source_id: r.source_id,
            extraction_run_id: r.extraction_run_id,
            assertion_type: assertion_type_from_str(&r.assertion_type),
            description: r.description,
            source_quote: r.source_quote,
            confidence: r.confidence,
            role: r.role,
            role_slot: r.role_slot,
            project_id: r.project_id,
            due_date: r.due_date,
            severity: r.severity,
            status: r.status,
            answered: r.answered,
        }
    }
}

pub async fn insert_all(pool: &DbPool, assertions: &[Assertion]) -> Result<(), RepositoryError> {
    for a in assertions {
        sqlx::query(
            "INSERT INTO assertions \
             (id, tenant_id, source_id, extraction_run_id, assertion_type, description, \
              source_quote, confidence, role, role_slot, project_id, due_date, severity, \
              status, answered) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&a.id)
        .bind(&a.tenant_id)
        .bind(&a.source_id)
        .bind(&a.extraction_run_id)
        .bind(a.assertion_type.as_str())
        .bind(&a.description)
        .bind(&a.source_quote)
        .bind(a.confidence)
        .bind(&a.role)
        .bind(&a.role_slot)
        .bind(&a.project_id)
        .bind(a.due_date)
        .bind(&a.severity)
        .bind(&a.status)
        .bind(a.answered)
        .execute(pool)
        .await
        .map_err(|e| RepositoryError::Query { source: e })?;
    }

    Ok(())
}

pub async fn get_for_source(pool: &DbPool, source_id: &str) -> Result<Vec<Assertion>, RepositoryError> {
    let rows = sqlx::query_as::<_, AssertionRow>(
        "SELECT * FROM assertions WHERE source_id = ? ORDER BY rowid",
    )
    .bind(source_id)
    .fetch_all(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(rows.into_iter().map(Assertion::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    fn sample_assertion(id: &str, assertion_type: AssertionType) -> Assertion {
        Assertion {
            id: id.to_string(),
            tenant_id: "tenant_a".to_string(),
            source_id: "src_1".to_string(),
            extraction_run_id: "run_1".to_string(),
            assertion_type,
            description: "ship by Friday".to_string(),
            source_quote: Some("we need to ship by Friday".to_string()),
            confidence: 0.8,
            role: Some("owner".to_string()),
            role_slot: Some("owner".to_string()),
            project_id: Some("proj_1".to_string()),
            due_date: None,
            severity: None,
            status: None,
            answered: None,
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_for_source() {
        let pool = init_test_db().await.expect("init db");
        let assertions = vec![
            sample_assertion("a1", AssertionType::Risk),
            sample_assertion("a2", AssertionType::Action),
        ];
        insert_all(&pool, &assertions).await.expect("insert");

        let fetched = get_for_source(&pool, "src_1").await.expect("get");
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].assertion_type, AssertionType::Risk);
        assert_eq!(fetched[1].assertion_type, AssertionType::Action);
    }
}
