//! Reference `TemplateRepository` implementation backed by SQLite.

use async_trait::async_trait;

use super::{Template, TemplateRepository};
use crate::error::{RepositoryError, TemplateError};
use crate::storage::DbPool;

pub struct SqliteTemplateRepository {
    pool: DbPool,
}

impl SqliteTemplateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: String,
    version: i64,
    body: String,
    extraction_schema: String,
    project_id: Option<String>,
    tenant_id: Option<String>,
    active: bool,
}

impl TemplateRow {
    fn into_domain(self) -> Result<Template, TemplateError> {
        let extraction_schema = serde_json::from_str(&self.extraction_schema).map_err(|e| {
            TemplateError::Repository(RepositoryError::Decode {
                what: "templates.extraction_schema".into(),
                message: e.to_string(),
            })
        })?;

        Ok(Template {
            id: self.id,
            version: self.version,
            body: self.body,
            extraction_schema,
            project_id: self.project_id,
            tenant_id: self.tenant_id,
            active: self.active,
        })
    }
}

#[async_trait]
impl TemplateRepository for SqliteTemplateRepository {
    async fn get_by_project_id(
        &self,
        tenant_id: &str,
        project_id: &str,
    ) -> Result<Option<Template>, TemplateError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            "SELECT * FROM templates WHERE tenant_id = ? AND project_id = ? LIMIT 1",
        )
        .bind(tenant_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TemplateError::Repository(RepositoryError::Query { source: e }))?;

        row.map(TemplateRow::into_domain).transpose()
    }

    async fn get_tenant_default(&self, tenant_id: &str) -> Result<Option<Template>, TemplateError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            "SELECT * FROM templates WHERE tenant_id = ? AND project_id IS NULL AND is_system_default = 0 LIMIT 1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TemplateError::Repository(RepositoryError::Query { source: e }))?;

        row.map(TemplateRow::into_domain).transpose()
    }

    async fn get_system_default(&self) -> Result<Template, TemplateError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            "SELECT * FROM templates WHERE is_system_default = 1 LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TemplateError::Repository(RepositoryError::Query { source: e }))?;

        match row {
            Some(row) => row.into_domain(),
            None => Err(TemplateError::NotFound {
                what: "system default template".to_string(),
            }),
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Template>, TemplateError> {
        let row = sqlx::query_as::<_, TemplateRow>("SELECT * FROM templates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| TemplateError::Repository(RepositoryError::Query { source: e }))?;

        row.map(TemplateRow::into_domain).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    #[tokio::test]
    async fn system_default_is_seeded_by_migration() {
        let pool = init_test_db().await.expect("init db");
        let repo = SqliteTemplateRepository::new(pool);

        let template = repo.get_system_default().await.expect("system default");
        assert_eq!(template.id, "system_default");
        assert!(template.active);
    }

    #[tokio::test]
    async fn project_template_takes_precedence_when_present() {
        let pool = init_test_db().await.expect("init db");
        sqlx::query(
            "INSERT INTO templates (id, version, body, extraction_schema, project_id, tenant_id, active) \
             VALUES ('tpl_proj', 1, 'body {context} {content}', '{}', 'proj_1', 'tenant_a', 1)",
        )
        .execute(&pool)
        .await
        .expect("seed");

        let repo = SqliteTemplateRepository::new(pool);
        let found = repo
            .get_by_project_id("tenant_a", "proj_1")
            .await
            .expect("query")
            .expect("should exist");
        assert_eq!(found.id, "tpl_proj");
    }

    #[tokio::test]
    async fn get_by_project_id_missing_returns_none() {
        let pool = init_test_db().await.expect("init db");
        let repo = SqliteTemplateRepository::new(pool);
        assert!(repo
            .get_by_project_id("tenant_a", "missing")
            .await
            .expect("query")
            .is_none());
    }
}
