use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::plans::{InsertPlanEntity, PlanEntity};

#[automock]
#[async_trait]
pub trait PlanRepository {
    async fn list_plans(&self) -> Result<Vec<PlanEntity>>;

    /// Enabled plans that are global or bound to `region`, ordered by id.
    async fn list_plans_for_region(&self, region: &str) -> Result<Vec<PlanEntity>>;

    async fn find_by_id(&self, plan_id: i32) -> Result<Option<PlanEntity>>;

    async fn find_for_region(&self, region: &str, plan_id: i32) -> Result<Option<PlanEntity>>;

    async fn create_plan(&self, plan: InsertPlanEntity) -> Result<i32>;

    /// Inserts a plan bound to `region` unless some plan is already bound there
    /// under `identification`. Check and insert run in one transaction that is
    /// serialized per region. Returns `None` when the identification was taken.
    async fn create_plan_in_region(
        &self,
        plan: InsertPlanEntity,
        region: &str,
        identification: &str,
    ) -> Result<Option<i32>>;

    /// Removes the plan together with its region bindings and metadata.
    async fn delete_plan(&self, plan_id: i32) -> Result<()>;

    async fn set_enabled(&self, plan_id: i32, enabled: bool) -> Result<()>;

    async fn upsert_region_plan(
        &self,
        plan_id: i32,
        region: &str,
        identification: &str,
    ) -> Result<()>;

    async fn delete_region_plan(&self, plan_id: i32, region: &str) -> Result<()>;

    async fn list_region_plans(&self, plan_id: i32) -> Result<BTreeMap<String, String>>;

    async fn list_metadata(&self, plan_id: i32) -> Result<BTreeMap<String, String>>;

    async fn upsert_metadata(&self, plan_id: i32, key: &str, value: &str) -> Result<()>;

    async fn delete_metadata(&self, plan_id: i32, key: &str) -> Result<()>;
}
