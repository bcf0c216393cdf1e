//! `EntityLookup` contract for the affinity/candidate resolution tier
//! (spec.md §4.6 tier 3), plus a reference adapter over the directory
//! mirror tables used by the context builder.

use async_trait::async_trait;

use crate::error::{RepositoryError, ResolverError};
use crate::model::EntityType;
use crate::storage::DbPool;

#[derive(Debug, Clone)]
pub struct EntityCandidate {
    pub entity_id: String,
    pub confidence: f64,
}

/// Supplies fuzzy by-text candidates for a mention. Exact-identity and
/// pattern-cache tiers are served directly by the `Repository` contract;
/// this is only consulted once those have missed.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn candidates(
        &self,
        tenant_id: &str,
        entity_type: EntityType,
        text: &str,
    ) -> Result<Vec<EntityCandidate>, ResolverError>;
}

pub struct SqliteEntityLookup {
    pool: DbPool,
}

impl SqliteEntityLookup {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityLookup for SqliteEntityLookup {
    async fn candidates(
        &self,
        tenant_id: &str,
        entity_type: EntityType,
        text: &str,
    ) -> Result<Vec<EntityCandidate>, ResolverError> {
        let rows: Vec<(String, String)> = match entity_type {
            EntityType::Person => {
                sqlx::query_as("SELECT id, name FROM persons WHERE tenant_id = ? AND name LIKE ?")
                    .bind(tenant_id)
                    .bind(format!("%{text}%"))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(RepositoryError::from)?
            }
            EntityType::Project => sqlx::query_as("SELECT id, name FROM projects WHERE name LIKE ?")
                .bind(format!("%{text}%"))
                .fetch_all(&self.pool)
                .await
                .map_err(RepositoryError::from)?,
            // Term/Product/Company/Ticket have no dedicated entity store;
            // they resolve only via the exact-identity and pattern-cache
            // tiers upstream of this lookup.
            EntityType::Term | EntityType::Product | EntityType::Company | EntityType::Ticket => {
                Vec::new()
            }
        };

        Ok(rows
            .into_iter()
            .map(|(entity_id, name)| {
                let confidence = if name.eq_ignore_ascii_case(text) { 0.95 } else { 0.6 };
                EntityCandidate { entity_id, confidence }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    #[tokio::test]
    async fn exact_name_match_scores_higher_than_substring() {
        let pool = init_test_db().await.expect("init db");
        sqlx::query("INSERT INTO persons (id, tenant_id, name, email) VALUES ('p1', 'tenant_a', 'Jane Doe', 'jane@acme.com')")
            .execute(&pool)
            .await
            .expect("seed");
        sqlx::query("INSERT INTO persons (id, tenant_id, name, email) VALUES ('p2', 'tenant_a', 'Jane Doe-Smith', 'jane2@acme.com')")
            .execute(&pool)
            .await
            .expect("seed");

        let lookup = SqliteEntityLookup::new(pool);
        let candidates = lookup
            .candidates("tenant_a", EntityType::Person, "Jane Doe")
            .await
            .expect("candidates");

        assert_eq!(candidates.len(), 2);
        let exact = candidates.iter().find(|c| c.entity_id == "p1").unwrap();
        assert_eq!(exact.confidence, 0.95);
    }

    #[tokio::test]
    async fn ticket_entity_type_returns_no_candidates() {
        let pool = init_test_db().await.expect("init db");
        let lookup = SqliteEntityLookup::new(pool);
        let candidates = lookup
            .candidates("tenant_a", EntityType::Ticket, "PROJ-1")
            .await
            .expect("candidates");
        assert!(candidates.is_empty());
    }
}
