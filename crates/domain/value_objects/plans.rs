use serde::{Deserialize, Serialize};

use crate::domain::entities::plans::InsertPlanEntity;

/// Attributes accepted when a plan is created by hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatePlanModel {
    pub name: String,
    pub price: i64,
    pub ram: i32,
    pub cpu: i32,
    pub storage: i32,
    pub bandwidth: i32,
    #[serde(default)]
    pub global: bool,
}

impl CreatePlanModel {
    /// Checks the attributes and turns them into an enabled plan row.
    /// The error names the offending attribute.
    pub fn into_insert_entity(self) -> Result<InsertPlanEntity, &'static str> {
        if self.name.trim().is_empty() {
            return Err("name");
        }
        if self.price < 0 {
            return Err("price");
        }
        if self.ram < 0 {
            return Err("ram");
        }
        if self.cpu < 0 {
            return Err("cpu");
        }
        if self.storage < 0 {
            return Err("storage");
        }
        if self.bandwidth < 0 {
            return Err("bandwidth");
        }

        Ok(InsertPlanEntity {
            name: self.name.trim().to_string(),
            price: self.price,
            ram: self.ram,
            cpu: self.cpu,
            storage: self.storage,
            bandwidth: self.bandwidth,
            global: self.global,
            enabled: true,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociateRegionModel {
    pub identification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetMetadataModel {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutopopulateResultDto {
    pub region: String,
    pub created_plan_ids: Vec<i32>,
}
