//! Read-side queries backing the Context Builder (spec.md §6):
//! GetPerson, GetProject, GetThreadMessages, GetProjectTickets,
//! GetProjectDecisions, GetRecentMeetings.
//!
//! Person/Project are mirrors of upstream systems; thread messages,
//! tickets, decisions and meetings are derived from rows this pipeline
//! already owns (`enrichments`, `assertions`).

use super::DbPool;
use crate::error::RepositoryError;
use crate::model::{DecisionInfo, MeetingInfo, PersonInfo, ProjectInfo, ThreadMessageInfo, TicketInfo};

pub async fn get_person(
    pool: &DbPool,
    tenant_id: &str,
    email: &str,
) -> Result<Option<PersonInfo>, RepositoryError> {
    let row: Option<(String, String, String)> =
        sqlx::query_as("SELECT id, name, email FROM persons WHERE tenant_id = ? AND email = ?")
            .bind(tenant_id)
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(row.map(|(id, name, email)| PersonInfo { id, name, email }))
}

pub async fn get_project(pool: &DbPool, project_id: &str) -> Result<Option<ProjectInfo>, RepositoryError> {
    let row: Option<(String, String)> = sqlx::query_as("SELECT id, name FROM projects WHERE id = ?")
        .bind(project_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(row.map(|(id, name)| ProjectInfo { id, name }))
}

/// Prior messages in the same thread, newest first, bounded by `limit`.
pub async fn get_thread_messages(
    pool: &DbPool,
    thread_id: &str,
    limit: usize,
) -> Result<Vec<ThreadMessageInfo>, RepositoryError> {
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT e.id, \
                COALESCE(json_extract(e.resolved_participants, '$[0].name'), 'unknown'), \
                e.updated_at \
         FROM enrichments e \
         WHERE e.thread_id = ? \
         ORDER BY e.updated_at DESC \
         LIMIT ?",
    )
    .bind(thread_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    rows.into_iter()
        .map(|(message_id, from_name, sent_at)| {
            let sent_at = sent_at.parse().map_err(|_| RepositoryError::Decode {
                what: "enrichments.updated_at".into(),
                message: sent_at.clone(),
            })?;
            Ok(ThreadMessageInfo {
                message_id,
                from_name,
                preview: String::new(),
                sent_at,
            })
        })
        .collect()
}

/// Jira tickets linked to a project, derived from extracted Jira data on
/// enrichments whose `project_id` matches.
pub async fn get_project_tickets(
    pool: &DbPool,
    project_id: &str,
    limit: usize,
) -> Result<Vec<TicketInfo>, RepositoryError> {
    let rows: Vec<(Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT json_extract(extracted_data, '$.jira.ticket_key'), \
                json_extract(extracted_data, '$.jira.summary') \
         FROM enrichments \
         WHERE project_id = ? AND json_extract(extracted_data, '$.jira.ticket_key') IS NOT NULL \
         ORDER BY updated_at DESC \
         LIMIT ?",
    )
    .bind(project_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(rows
        .into_iter()
        .filter_map(|(key, summary)| {
            key.map(|ticket_key| TicketInfo {
                ticket_key,
                summary: summary.unwrap_or_default(),
                status: String::new(),
            })
        })
        .collect())
}

/// Decision-type assertions recorded against a project, newest first.
pub async fn get_project_decisions(
    pool: &DbPool,
    project_id: &str,
    limit: usize,
) -> Result<Vec<DecisionInfo>, RepositoryError> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT description, created_at FROM assertions \
         WHERE project_id = ? AND assertion_type = 'decision' \
         ORDER BY created_at DESC LIMIT ?",
    )
    .bind(project_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    rows.into_iter()
        .map(|(description, created_at)| {
            let decided_at = created_at.parse().map_err(|_| RepositoryError::Decode {
                what: "assertions.created_at".into(),
                message: created_at.clone(),
            })?;
            Ok(DecisionInfo {
                description,
                decided_at,
            })
        })
        .collect()
}

/// Calendar meetings linked to a project, derived from extracted meeting
/// data on completed enrichments.
pub async fn get_recent_meetings(
    pool: &DbPool,
    project_id: &str,
    limit: usize,
) -> Result<Vec<MeetingInfo>, RepositoryError> {
    let rows: Vec<(Option<String>, String)> = sqlx::query_as(
        "SELECT json_extract(extracted_data, '$.meeting.title'), updated_at \
         FROM enrichments \
         WHERE project_id = ? AND json_extract(extracted_data, '$.meeting') IS NOT NULL \
         ORDER BY updated_at DESC LIMIT ?",
    )
    .bind(project_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    rows.into_iter()
        .map(|(title, updated_at)| {
            let occurred_at = updated_at.parse().map_err(|_| RepositoryError::Decode {
                what: "enrichments.updated_at".into(),
                message: updated_at.clone(),
            })?;
            Ok(MeetingInfo {
                title: title.unwrap_or_default(),
                occurred_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    #[tokio::test]
    async fn get_person_returns_seeded_row() {
        let pool = init_test_db().await.expect("init db");
        sqlx::query("INSERT INTO persons (id, tenant_id, name, email) VALUES ('p1', 't1', 'Jane Doe', 'jane@acme.com')")
            .execute(&pool)
            .await
            .expect("seed");

        let person = get_person(&pool, "t1", "jane@acme.com")
            .await
            .expect("query")
            .expect("should exist");
        assert_eq!(person.name, "Jane Doe");
    }

    #[tokio::test]
    async fn get_person_missing_returns_none() {
        let pool = init_test_db().await.expect("init db");
        assert!(get_person(&pool, "t1", "nobody@acme.com")
            .await
            .expect("query")
            .is_none());
    }

    #[tokio::test]
    async fn get_project_decisions_filters_by_type() {
        let pool = init_test_db().await.expect("init db");
        sqlx::query(
            "INSERT INTO extraction_runs (id, tenant_id, source_id, template_id, template_version, model_id, model_version, rendered_prompt, input_tokens, output_tokens, latency_ms, raw_response, status) \
             VALUES ('run_1', 't1', 'src_1', 'tpl', 1, 'm', 'v', 'p', 0, 0, 0, '{}', 'completed')",
        )
        .execute(&pool)
        .await
        .expect("seed run");

        sqlx::query(
            "INSERT INTO assertions (id, tenant_id, source_id, extraction_run_id, assertion_type, description, confidence, project_id) \
             VALUES ('a1', 't1', 'src_1', 'run_1', 'decision', 'go with option B', 0.9, 'proj_1')",
        )
        .execute(&pool)
        .await
        .expect("seed decision");
        sqlx::query(
            "INSERT INTO assertions (id, tenant_id, source_id, extraction_run_id, assertion_type, description, confidence, project_id) \
             VALUES ('a2', 't1', 'src_1', 'run_1', 'risk', 'schedule slip', 0.9, 'proj_1')",
        )
        .execute(&pool)
        .await
        .expect("seed risk");

        let decisions = get_project_decisions(&pool, "proj_1", 10).await.expect("query");
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].description, "go with option B");
    }
}
