use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::info;

use super::{ProviderPlan, VmCreateRequest, VmInfo, VmInterface, VmPlanLister, VmStatus};
use crate::providers::config::FakeVmConfig;

#[derive(Debug, Clone)]
struct FakeMachine {
    hostname: String,
    running: bool,
}

/// In-memory backend for development and tests. Machines vanish on restart.
pub struct FakeVm {
    plans: Vec<ProviderPlan>,
    machines: Mutex<BTreeMap<String, FakeMachine>>,
    next_id: AtomicU64,
}

impl FakeVm {
    pub fn new(config: FakeVmConfig) -> Self {
        Self::with_plans(config.plans)
    }

    pub fn with_plans(plans: Vec<ProviderPlan>) -> Self {
        Self {
            plans,
            machines: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn with_machine<T>(&self, vm_id: &str, f: impl FnOnce(&mut FakeMachine) -> T) -> Result<T> {
        let mut machines = self.machines.lock().unwrap_or_else(PoisonError::into_inner);
        let machine = machines
            .get_mut(vm_id)
            .ok_or_else(|| anyhow!("fake vm {vm_id} does not exist"))?;
        Ok(f(machine))
    }
}

impl Default for FakeVm {
    fn default() -> Self {
        Self::with_plans(Vec::new())
    }
}

#[async_trait]
impl VmInterface for FakeVm {
    fn kind(&self) -> &'static str {
        "fake"
    }

    async fn create(&self, request: &VmCreateRequest) -> Result<String> {
        let vm_id = format!("fake-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.machines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                vm_id.clone(),
                FakeMachine {
                    hostname: request.hostname.clone(),
                    running: true,
                },
            );
        info!(%vm_id, hostname = %request.hostname, "fake vm: created");
        Ok(vm_id)
    }

    async fn delete(&self, vm_id: &str) -> Result<()> {
        self.machines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(vm_id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("fake vm {vm_id} does not exist"))
    }

    async fn info(&self, vm_id: &str) -> Result<VmInfo> {
        self.with_machine(vm_id, |machine| VmInfo {
            status: if machine.running {
                VmStatus::Online
            } else {
                VmStatus::Offline
            },
            ip: Some("127.0.0.1".to_string()),
            hostname: Some(machine.hostname.clone()),
        })
    }

    async fn start(&self, vm_id: &str) -> Result<()> {
        self.with_machine(vm_id, |machine| machine.running = true)
    }

    async fn stop(&self, vm_id: &str) -> Result<()> {
        self.with_machine(vm_id, |machine| machine.running = false)
    }

    async fn reboot(&self, vm_id: &str) -> Result<()> {
        self.with_machine(vm_id, |machine| machine.running = true)
    }

    fn as_plan_lister(&self) -> Option<&dyn VmPlanLister> {
        Some(self)
    }
}

#[async_trait]
impl VmPlanLister for FakeVm {
    async fn plan_list(&self) -> Result<Vec<ProviderPlan>> {
        Ok(self.plans.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> VmCreateRequest {
        VmCreateRequest {
            hostname: "web-1".to_string(),
            owner: "user7".to_string(),
            plan_identification: "t1".to_string(),
            image_identification: "debian-12".to_string(),
        }
    }

    #[tokio::test]
    async fn machine_lifecycle_is_tracked_in_memory() {
        let vm = FakeVm::default();

        let vm_id = vm.create(&request()).await.unwrap();
        assert_eq!(vm.info(&vm_id).await.unwrap().status, VmStatus::Online);

        vm.stop(&vm_id).await.unwrap();
        assert_eq!(vm.info(&vm_id).await.unwrap().status, VmStatus::Offline);

        vm.reboot(&vm_id).await.unwrap();
        let info = vm.info(&vm_id).await.unwrap();
        assert_eq!(info.status, VmStatus::Online);
        assert_eq!(info.hostname.as_deref(), Some("web-1"));

        vm.delete(&vm_id).await.unwrap();
        assert!(vm.info(&vm_id).await.is_err());
        assert!(vm.delete(&vm_id).await.is_err());
    }

    #[tokio::test]
    async fn lists_configured_plans() {
        let plan = ProviderPlan {
            name: "Tiny".to_string(),
            identification: "t1".to_string(),
            price: 100,
            ram: 256,
            cpu: 1,
            storage: 5,
            bandwidth: 50,
        };
        let vm = FakeVm::with_plans(vec![plan.clone()]);

        let lister = vm.as_plan_lister().expect("fake vm lists plans");
        assert_eq!(lister.plan_list().await.unwrap(), vec![plan]);
    }
}
