//! CRUD operations for `entity_project_affinities` (tier-3 mention resolution).

use super::DbPool;
use crate::error::RepositoryError;
use crate::model::EntityProjectAffinity;

pub async fn bump(
    pool: &DbPool,
    entity_id: &str,
    project_id: &str,
) -> Result<EntityProjectAffinity, RepositoryError> {
    sqlx::query(
        "INSERT INTO entity_project_affinities (entity_id, project_id, sightings) \
         VALUES (?, ?, 1) \
         ON CONFLICT(entity_id, project_id) DO UPDATE SET sightings = sightings + 1",
    )
    .bind(entity_id)
    .bind(project_id)
    .execute(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    let row: (i64,) = sqlx::query_as(
        "SELECT sightings FROM entity_project_affinities WHERE entity_id = ? AND project_id = ?",
    )
    .bind(entity_id)
    .bind(project_id)
    .fetch_one(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(EntityProjectAffinity {
        entity_id: entity_id.to_string(),
        project_id: project_id.to_string(),
        sightings: row.0,
    })
}

pub async fn top_for_entity(
    pool: &DbPool,
    entity_id: &str,
    limit: i64,
) -> Result<Vec<EntityProjectAffinity>, RepositoryError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT project_id, sightings FROM entity_project_affinities \
         WHERE entity_id = ? ORDER BY sightings DESC LIMIT ?",
    )
    .bind(entity_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| RepositoryError::Query { source: e })?;

    Ok(rows
        .into_iter()
        .map(|(project_id, sightings)| EntityProjectAffinity {
            entity_id: entity_id.to_string(),
            project_id,
            sightings,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    #[tokio::test]
    async fn bump_increments_sightings() {
        let pool = init_test_db().await.expect("init db");
        bump(&pool, "person_42", "proj_1").await.expect("first bump");
        let affinity = bump(&pool, "person_42", "proj_1").await.expect("second bump");
        assert_eq!(affinity.sightings, 2);
    }

    #[tokio::test]
    async fn top_for_entity_orders_by_sightings() {
        let pool = init_test_db().await.expect("init db");
        bump(&pool, "person_42", "proj_1").await.expect("bump a");
        bump(&pool, "person_42", "proj_2").await.expect("bump b");
        bump(&pool, "person_42", "proj_2").await.expect("bump b again");

        let top = top_for_entity(&pool, "person_42", 10).await.expect("top");
        assert_eq!(top[0].project_id, "proj_2");
        assert_eq!(top[0].sightings, 2);
    }
}
