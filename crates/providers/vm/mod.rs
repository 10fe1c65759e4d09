pub mod fake;
pub mod lndynamic;
pub mod openstack;
pub mod solusvm;

use std::fmt::Display;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Parameters for provisioning a virtual machine.
#[derive(Debug, Clone, PartialEq)]
pub struct VmCreateRequest {
    pub hostname: String,
    /// Account name the VM is filed under on the provider side.
    pub owner: String,
    /// Region-specific plan identification, from the region binding.
    pub plan_identification: String,
    pub image_identification: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VmStatus {
    Online,
    Offline,
    Unknown,
}

impl Display for VmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            VmStatus::Online => "online",
            VmStatus::Offline => "offline",
            VmStatus::Unknown => "unknown",
        };
        write!(f, "{}", status)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VmInfo {
    pub status: VmStatus,
    pub ip: Option<String>,
    pub hostname: Option<String>,
}

/// A plan as the provider describes it, used to populate the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderPlan {
    pub name: String,
    pub identification: String,
    #[serde(default)]
    pub price: i64,
    pub ram: i32,
    pub cpu: i32,
    pub storage: i32,
    #[serde(default)]
    pub bandwidth: i32,
}

/// Provisioning capability every VM backend implements.
/// `vm_id` is the provider-side identifier returned by `create`.
#[async_trait]
pub trait VmInterface: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn create(&self, request: &VmCreateRequest) -> Result<String>;
    async fn delete(&self, vm_id: &str) -> Result<()>;
    async fn info(&self, vm_id: &str) -> Result<VmInfo>;
    async fn start(&self, vm_id: &str) -> Result<()>;
    async fn stop(&self, vm_id: &str) -> Result<()>;
    async fn reboot(&self, vm_id: &str) -> Result<()>;

    /// Plan enumeration, for backends that can list their plans.
    fn as_plan_lister(&self) -> Option<&dyn VmPlanLister> {
        None
    }
}

#[async_trait]
pub trait VmPlanLister: Send + Sync {
    async fn plan_list(&self) -> Result<Vec<ProviderPlan>>;
}
