//! Template Resolver (C6): selects a project → tenant → system-default
//! prompt template and renders it against an assembled context.

pub mod sqlite;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::TemplateError;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Template {
    pub id: String,
    pub version: i64,
    pub body: String,
    pub extraction_schema: serde_json::Value,
    pub project_id: Option<String>,
    pub tenant_id: Option<String>,
    pub active: bool,
}

impl Template {
    /// Substitutes `{context}` and `{content}` placeholders. Any other
    /// braces in the body are left untouched.
    pub fn render(&self, context: &str, content: &str) -> String {
        self.body
            .replace("{context}", context)
            .replace("{content}", content)
    }
}

/// Everything the LLM extractor needs from template storage (spec.md §6).
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn get_by_project_id(
        &self,
        tenant_id: &str,
        project_id: &str,
    ) -> Result<Option<Template>, TemplateError>;
    async fn get_tenant_default(&self, tenant_id: &str) -> Result<Option<Template>, TemplateError>;
    async fn get_system_default(&self) -> Result<Template, TemplateError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<Template>, TemplateError>;
}

/// Resolves the template for a call, caching the system default in memory
/// since it is read on almost every AI-routed item (spec.md §4.5 step 1,
/// §5 shared-resource policy).
pub struct TemplateResolver<R: TemplateRepository> {
    repo: R,
    system_default_cache: RwLock<Option<Template>>,
}

impl<R: TemplateRepository> TemplateResolver<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            system_default_cache: RwLock::new(None),
        }
    }

    /// Resolution order: project-specific (active) → tenant default (active)
    /// → system default (built-in, cached).
    pub async fn resolve(
        &self,
        tenant_id: &str,
        project_id: Option<&str>,
    ) -> Result<Template, TemplateError> {
        if let Some(project_id) = project_id {
            if let Some(template) = self.repo.get_by_project_id(tenant_id, project_id).await? {
                if template.active {
                    return Ok(template);
                }
            }
        }

        if let Some(template) = self.repo.get_tenant_default(tenant_id).await? {
            if template.active {
                return Ok(template);
            }
        }

        self.system_default().await
    }

    async fn system_default(&self) -> Result<Template, TemplateError> {
        if let Some(cached) = self.system_default_cache.read().await.clone() {
            return Ok(cached);
        }

        let mut cache = self.system_default_cache.write().await;
        if let Some(cached) = cache.clone() {
            return Ok(cached);
        }

        let template = self.repo.get_system_default().await?;
        *cache = Some(template.clone());
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeRepo {
        project: Option<Template>,
        tenant_default: Option<Template>,
        system_default_calls: Arc<AtomicUsize>,
    }

    fn template(id: &str, active: bool) -> Template {
        Template {
            id: id.to_string(),
            version: 1,
            body: "Context: {context}\nContent: {content}".to_string(),
            extraction_schema: serde_json::json!({}),
            project_id: None,
            tenant_id: None,
            active,
        }
    }

    #[async_trait]
    impl TemplateRepository for FakeRepo {
        async fn get_by_project_id(
            &self,
            _tenant_id: &str,
            _project_id: &str,
        ) -> Result<Option<Template>, TemplateError> {
            Ok(self.project.clone())
        }

        async fn get_tenant_default(&self, _tenant_id: &str) -> Result<Option<Template>, TemplateError> {
            Ok(self.tenant_default.clone())
        }

        async fn get_system_default(&self) -> Result<Template, TemplateError> {
            self.system_default_calls.fetch_add(1, Ordering::SeqCst);
            Ok(template("system_default", true))
        }

        async fn get_by_id(&self, id: &str) -> Result<Option<Template>, TemplateError> {
            Ok(Some(template(id, true)))
        }
    }

    #[tokio::test]
    async fn prefers_active_project_template() {
        let repo = FakeRepo {
            project: Some(template("proj_tpl", true)),
            tenant_default: Some(template("tenant_tpl", true)),
            system_default_calls: Arc::new(AtomicUsize::new(0)),
        };
        let resolver = TemplateResolver::new(repo);

        let resolved = resolver.resolve("tenant_a", Some("proj_1")).await.expect("resolve");
        assert_eq!(resolved.id, "proj_tpl");
    }

    #[tokio::test]
    async fn falls_back_to_tenant_default_when_project_inactive() {
        let repo = FakeRepo {
            project: Some(template("proj_tpl", false)),
            tenant_default: Some(template("tenant_tpl", true)),
            system_default_calls: Arc::new(AtomicUsize::new(0)),
        };
        let resolver = TemplateResolver::new(repo);

        let resolved = resolver.resolve("tenant_a", Some("proj_1")).await.expect("resolve");
        assert_eq!(resolved.id, "tenant_tpl");
    }

    #[tokio::test]
    async fn falls_back_to_system_default_when_nothing_else_matches() {
        let repo = FakeRepo {
            project: None,
            tenant_default: None,
            system_default_calls: Arc::new(AtomicUsize::new(0)),
        };
        let resolver = TemplateResolver::new(repo);

        let resolved = resolver.resolve("tenant_a", None).await.expect("resolve");
        assert_eq!(resolved.id, "system_default");
    }

    #[tokio::test]
    async fn system_default_is_cached_after_first_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let repo = FakeRepo {
            project: None,
            tenant_default: None,
            system_default_calls: calls.clone(),
        };
        let resolver = TemplateResolver::new(repo);

        resolver.resolve("tenant_a", None).await.expect("first");
        resolver.resolve("tenant_a", None).await.expect("second");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn render_substitutes_context_and_content() {
        let tpl = template("t1", true);
        let rendered = tpl.render("Participants: Jane", "please review");
        assert_eq!(rendered, "Context: Participants: Jane\nContent: please review");
    }
}
