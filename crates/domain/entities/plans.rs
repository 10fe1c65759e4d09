use std::collections::BTreeMap;

use diesel::prelude::*;
use serde::Serialize;

use crate::infra::db::postgres::schema::{plan_metadata, plans, region_plans};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntity {
    pub id: i32,
    pub name: String,
    pub price: i64,
    pub ram: i32,
    pub cpu: i32,
    pub storage: i32,
    pub bandwidth: i32,
    pub global: bool,
    pub enabled: bool,
    /// Provider-side identification for the region the plan was loaded for.
    /// Empty when the plan was not loaded through a region, or is global and unbound.
    pub identification: String,
    /// Region name to identification. Loaded on demand, always empty for global plans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_plans: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Raw row used for Diesel queries. The region identification comes from a join
/// and is attached through `PlanEntity::from_row`.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanRow {
    pub id: i32,
    pub name: String,
    pub price: i64,
    pub ram: i32,
    pub cpu: i32,
    pub storage: i32,
    pub bandwidth: i32,
    pub global: bool,
    pub enabled: bool,
}

impl PlanEntity {
    pub fn from_row(row: PlanRow, identification: Option<String>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            ram: row.ram,
            cpu: row.cpu,
            storage: row.storage,
            bandwidth: row.bandwidth,
            global: row.global,
            enabled: row.enabled,
            identification: identification.unwrap_or_default(),
            region_plans: None,
            metadata: None,
        }
    }
}

impl From<PlanRow> for PlanEntity {
    fn from(value: PlanRow) -> Self {
        Self::from_row(value, None)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = plans)]
pub struct InsertPlanEntity {
    pub name: String,
    pub price: i64,
    pub ram: i32,
    pub cpu: i32,
    pub storage: i32,
    pub bandwidth: i32,
    pub global: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = region_plans)]
pub struct InsertRegionPlanEntity {
    pub plan_id: i32,
    pub region: String,
    pub identification: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = plan_metadata)]
pub struct InsertPlanMetadataEntity {
    pub plan_id: i32,
    pub k: String,
    pub v: String,
}
