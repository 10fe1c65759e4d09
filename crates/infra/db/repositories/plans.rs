use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    RunQueryDsl, delete, dsl::exists, insert_into, prelude::*, select, sql_query,
    sql_types::Text, update,
};

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{plan_metadata, plans, region_plans},
};
use domain::{
    entities::plans::{
        InsertPlanEntity, InsertPlanMetadataEntity, InsertRegionPlanEntity, PlanEntity, PlanRow,
    },
    repositories::plans::PlanRepository,
};

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn list_plans(&self) -> Result<Vec<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = plans::table
            .order(plans::id.asc())
            .select(PlanRow::as_select())
            .load::<PlanRow>(&mut conn)?;

        Ok(rows.into_iter().map(PlanEntity::from).collect())
    }

    async fn list_plans_for_region(&self, region: &str) -> Result<Vec<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = plans::table
            .left_join(
                region_plans::table.on(region_plans::plan_id
                    .eq(plans::id)
                    .and(region_plans::region.eq(region))),
            )
            .filter(plans::enabled.eq(true))
            .filter(
                plans::global
                    .eq(true)
                    .or(region_plans::identification.is_not_null()),
            )
            .order(plans::id.asc())
            .select((
                PlanRow::as_select(),
                region_plans::identification.nullable(),
            ))
            .load::<(PlanRow, Option<String>)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(row, identification)| PlanEntity::from_row(row, identification))
            .collect())
    }

    async fn find_by_id(&self, plan_id: i32) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = plans::table
            .filter(plans::id.eq(plan_id))
            .select(PlanRow::as_select())
            .first::<PlanRow>(&mut conn)
            .optional()?;

        Ok(row.map(PlanEntity::from))
    }

    async fn find_for_region(&self, region: &str, plan_id: i32) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = plans::table
            .left_join(
                region_plans::table.on(region_plans::plan_id
                    .eq(plans::id)
                    .and(region_plans::region.eq(region))),
            )
            .filter(plans::id.eq(plan_id))
            .filter(plans::enabled.eq(true))
            .filter(
                plans::global
                    .eq(true)
                    .or(region_plans::identification.is_not_null()),
            )
            .select((
                PlanRow::as_select(),
                region_plans::identification.nullable(),
            ))
            .first::<(PlanRow, Option<String>)>(&mut conn)
            .optional()?;

        Ok(row.map(|(row, identification)| PlanEntity::from_row(row, identification)))
    }

    async fn create_plan(&self, plan: InsertPlanEntity) -> Result<i32> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let plan_id = insert_into(plans::table)
            .values(&plan)
            .returning(plans::id)
            .get_result::<i32>(&mut conn)?;

        Ok(plan_id)
    }

    async fn create_plan_in_region(
        &self,
        plan: InsertPlanEntity,
        region: &str,
        identification: &str,
    ) -> Result<Option<i32>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let plan_id = conn.transaction::<Option<i32>, anyhow::Error, _>(|conn| {
            // Held until commit, so concurrent callers for one region queue up here.
            sql_query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind::<Text, _>(region)
                .execute(conn)?;

            let taken = select(exists(
                region_plans::table
                    .filter(region_plans::region.eq(region))
                    .filter(region_plans::identification.eq(identification)),
            ))
            .get_result::<bool>(conn)?;
            if taken {
                return Ok(None);
            }

            let plan_id = insert_into(plans::table)
                .values(&plan)
                .returning(plans::id)
                .get_result::<i32>(conn)?;

            insert_into(region_plans::table)
                .values(&InsertRegionPlanEntity {
                    plan_id,
                    region: region.to_string(),
                    identification: identification.to_string(),
                })
                .execute(conn)?;

            Ok(Some(plan_id))
        })?;

        Ok(plan_id)
    }

    async fn delete_plan(&self, plan_id: i32) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        conn.transaction::<(), anyhow::Error, _>(|conn| {
            delete(region_plans::table.filter(region_plans::plan_id.eq(plan_id))).execute(conn)?;
            delete(plan_metadata::table.filter(plan_metadata::plan_id.eq(plan_id)))
                .execute(conn)?;
            delete(plans::table.filter(plans::id.eq(plan_id))).execute(conn)?;
            Ok(())
        })?;

        Ok(())
    }

    async fn set_enabled(&self, plan_id: i32, enabled: bool) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(plans::table)
            .filter(plans::id.eq(plan_id))
            .set(plans::enabled.eq(enabled))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn upsert_region_plan(
        &self,
        plan_id: i32,
        region: &str,
        identification: &str,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(region_plans::table)
            .values(&InsertRegionPlanEntity {
                plan_id,
                region: region.to_string(),
                identification: identification.to_string(),
            })
            .on_conflict((region_plans::plan_id, region_plans::region))
            .do_update()
            .set(region_plans::identification.eq(identification))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn delete_region_plan(&self, plan_id: i32, region: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(
            region_plans::table
                .filter(region_plans::plan_id.eq(plan_id))
                .filter(region_plans::region.eq(region)),
        )
        .execute(&mut conn)?;

        Ok(())
    }

    async fn list_region_plans(&self, plan_id: i32) -> Result<BTreeMap<String, String>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = region_plans::table
            .filter(region_plans::plan_id.eq(plan_id))
            .select((region_plans::region, region_plans::identification))
            .load::<(String, String)>(&mut conn)?;

        Ok(rows.into_iter().collect())
    }

    async fn list_metadata(&self, plan_id: i32) -> Result<BTreeMap<String, String>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = plan_metadata::table
            .filter(plan_metadata::plan_id.eq(plan_id))
            .select((plan_metadata::k, plan_metadata::v))
            .load::<(String, String)>(&mut conn)?;

        Ok(rows.into_iter().collect())
    }

    async fn upsert_metadata(&self, plan_id: i32, key: &str, value: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(plan_metadata::table)
            .values(&InsertPlanMetadataEntity {
                plan_id,
                k: key.to_string(),
                v: value.to_string(),
            })
            .on_conflict((plan_metadata::plan_id, plan_metadata::k))
            .do_update()
            .set(plan_metadata::v.eq(value))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn delete_metadata(&self, plan_id: i32, key: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(
            plan_metadata::table
                .filter(plan_metadata::plan_id.eq(plan_id))
                .filter(plan_metadata::k.eq(key)),
        )
        .execute(&mut conn)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::db::postgres::test_pool::test_pool;

    fn plan(name: &str, global: bool, enabled: bool) -> InsertPlanEntity {
        InsertPlanEntity {
            name: name.to_string(),
            price: 500,
            ram: 512,
            cpu: 1,
            storage: 10,
            bandwidth: 100,
            global,
            enabled,
        }
    }

    #[tokio::test]
    async fn region_listing_shows_enabled_plans_that_are_global_or_bound() {
        let Some(pool) = test_pool() else {
            return;
        };
        let repo = PlanPostgres::new(pool);

        let global = repo.create_plan(plan("Global", true, true)).await.unwrap();
        let retired = repo.create_plan(plan("Retired", true, false)).await.unwrap();
        let bound = repo
            .create_plan_in_region(plan("Bound", false, true), "test-east", "ext-b")
            .await
            .unwrap()
            .unwrap();
        let disabled = repo
            .create_plan_in_region(plan("Disabled", false, false), "test-east", "ext-d")
            .await
            .unwrap()
            .unwrap();
        let foreign = repo
            .create_plan_in_region(plan("Foreign", false, true), "test-west", "ext-f")
            .await
            .unwrap()
            .unwrap();
        let ours = [global, retired, bound, disabled, foreign];

        let visible: Vec<(i32, String)> = repo
            .list_plans_for_region("test-east")
            .await
            .unwrap()
            .into_iter()
            .filter(|p| ours.contains(&p.id))
            .map(|p| (p.id, p.identification))
            .collect();
        assert_eq!(
            visible,
            vec![(global, String::new()), (bound, "ext-b".to_string())]
        );

        assert!(repo.find_for_region("test-east", disabled).await.unwrap().is_none());
        assert!(repo.find_for_region("test-east", foreign).await.unwrap().is_none());
        assert!(repo.find_for_region("test-east", retired).await.unwrap().is_none());
        let west = repo.find_for_region("test-west", foreign).await.unwrap().unwrap();
        assert_eq!(west.identification, "ext-f");
    }

    #[tokio::test]
    async fn associating_twice_keeps_a_single_binding() {
        let Some(pool) = test_pool() else {
            return;
        };
        let repo = PlanPostgres::new(pool);
        let plan_id = repo.create_plan(plan("Starter", false, true)).await.unwrap();

        repo.upsert_region_plan(plan_id, "test-east", "ext-123").await.unwrap();
        repo.upsert_region_plan(plan_id, "test-east", "ext-123").await.unwrap();
        assert_eq!(
            repo.list_region_plans(plan_id).await.unwrap(),
            BTreeMap::from([("test-east".to_string(), "ext-123".to_string())])
        );

        repo.upsert_region_plan(plan_id, "test-east", "ext-456").await.unwrap();
        let listed: Vec<_> = repo
            .list_plans_for_region("test-east")
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.id == plan_id)
            .collect();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].identification, "ext-456");

        repo.delete_region_plan(plan_id, "test-east").await.unwrap();
        assert!(repo.list_region_plans(plan_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_plan_is_created_once_per_region_and_identification() {
        let Some(pool) = test_pool() else {
            return;
        };
        let repo = PlanPostgres::new(pool);

        let first = repo
            .create_plan_in_region(plan("Tiny", false, true), "test-east", "t1")
            .await
            .unwrap();
        assert!(first.is_some());

        let again = repo
            .create_plan_in_region(plan("Tiny", false, true), "test-east", "t1")
            .await
            .unwrap();
        assert_eq!(again, None);

        let elsewhere = repo
            .create_plan_in_region(plan("Tiny", false, true), "test-west", "t1")
            .await
            .unwrap();
        assert!(elsewhere.is_some());
        assert_ne!(elsewhere, first);
    }

    #[tokio::test]
    async fn metadata_upserts_and_plan_delete_removes_dependents() {
        let Some(pool) = test_pool() else {
            return;
        };
        let repo = PlanPostgres::new(pool);
        let plan_id = repo.create_plan(plan("Starter", false, true)).await.unwrap();

        repo.upsert_metadata(plan_id, "os", "linux").await.unwrap();
        repo.upsert_metadata(plan_id, "os", "bsd").await.unwrap();
        repo.upsert_metadata(plan_id, "tier", "gold").await.unwrap();
        repo.delete_metadata(plan_id, "tier").await.unwrap();
        assert_eq!(
            repo.list_metadata(plan_id).await.unwrap(),
            BTreeMap::from([("os".to_string(), "bsd".to_string())])
        );

        repo.set_enabled(plan_id, false).await.unwrap();
        assert!(!repo.find_by_id(plan_id).await.unwrap().unwrap().enabled);

        repo.upsert_region_plan(plan_id, "test-east", "ext-1").await.unwrap();
        repo.delete_plan(plan_id).await.unwrap();
        assert!(repo.find_by_id(plan_id).await.unwrap().is_none());
        assert!(repo.list_metadata(plan_id).await.unwrap().is_empty());
        assert!(repo.list_region_plans(plan_id).await.unwrap().is_empty());
    }
}
