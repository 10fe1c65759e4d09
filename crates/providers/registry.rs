use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use super::config::{InterfaceConfig, PaymentProviderConfig, ProviderConfigError, VmProviderConfig};
use super::payment::{PaymentInterface, coinbase::Coinbase, fake::FakePayment, paypal::Paypal};
use super::vm::{
    VmInterface, fake::FakeVm, lndynamic::LnDynamic, openstack::OpenStack, solusvm::SolusVm,
};

/// Name-indexed VM and payment backends. Built once at startup and shared read-only.
#[derive(Default)]
pub struct ProviderRegistry {
    vm_interfaces: BTreeMap<String, Arc<dyn VmInterface>>,
    payment_interfaces: BTreeMap<String, Arc<dyn PaymentInterface>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: InterfaceConfig) -> Result<Self, ProviderConfigError> {
        let mut registry = Self::new();

        for entry in config.vm {
            let invalid = |err: anyhow::Error| ProviderConfigError::Invalid {
                kind: "vm",
                name: entry.name.clone(),
                reason: format!("{err:#}"),
            };

            let vm: Arc<dyn VmInterface> = match &entry.provider {
                VmProviderConfig::Solusvm(cfg) => Arc::new(SolusVm::new(cfg).map_err(invalid)?),
                VmProviderConfig::Openstack(cfg) => {
                    Arc::new(OpenStack::new(cfg).map_err(invalid)?)
                }
                VmProviderConfig::Lndynamic(cfg) => {
                    Arc::new(LnDynamic::new(cfg).map_err(invalid)?)
                }
                VmProviderConfig::Fake(cfg) => Arc::new(FakeVm::new(cfg.clone())),
            };
            registry.register_vm_interface(&entry.name, vm)?;
        }

        for entry in config.payment {
            let invalid = |err: anyhow::Error| ProviderConfigError::Invalid {
                kind: "payment",
                name: entry.name.clone(),
                reason: format!("{err:#}"),
            };

            let payment: Arc<dyn PaymentInterface> = match &entry.provider {
                PaymentProviderConfig::Paypal(cfg) => Arc::new(Paypal::new(cfg).map_err(invalid)?),
                PaymentProviderConfig::Coinbase(cfg) => {
                    Arc::new(Coinbase::new(cfg).map_err(invalid)?)
                }
                PaymentProviderConfig::Fake(_) => Arc::new(FakePayment),
            };
            registry.register_payment_interface(&entry.name, payment)?;
        }

        Ok(registry)
    }

    pub fn register_vm_interface(
        &mut self,
        name: &str,
        vm: Arc<dyn VmInterface>,
    ) -> Result<(), ProviderConfigError> {
        if name.trim().is_empty() {
            return Err(ProviderConfigError::Invalid {
                kind: "vm",
                name: name.to_string(),
                reason: "name must not be empty".to_string(),
            });
        }
        if self.vm_interfaces.contains_key(name) {
            return Err(ProviderConfigError::DuplicateName {
                kind: "vm",
                name: name.to_string(),
            });
        }

        info!(region = %name, kind = vm.kind(), "providers: registered vm interface");
        self.vm_interfaces.insert(name.to_string(), vm);
        Ok(())
    }

    pub fn register_payment_interface(
        &mut self,
        name: &str,
        payment: Arc<dyn PaymentInterface>,
    ) -> Result<(), ProviderConfigError> {
        if name.trim().is_empty() {
            return Err(ProviderConfigError::Invalid {
                kind: "payment",
                name: name.to_string(),
                reason: "name must not be empty".to_string(),
            });
        }
        if self.payment_interfaces.contains_key(name) {
            return Err(ProviderConfigError::DuplicateName {
                kind: "payment",
                name: name.to_string(),
            });
        }

        info!(method = %name, kind = payment.kind(), "providers: registered payment interface");
        self.payment_interfaces.insert(name.to_string(), payment);
        Ok(())
    }

    /// The VM backend serving `region`.
    pub fn region(&self, region: &str) -> Option<Arc<dyn VmInterface>> {
        self.vm_interfaces.get(region).cloned()
    }

    /// Region names in sorted order.
    pub fn regions(&self) -> Vec<String> {
        self.vm_interfaces.keys().cloned().collect()
    }

    pub fn payment(&self, method: &str) -> Option<Arc<dyn PaymentInterface>> {
        self.payment_interfaces.get(method).cloned()
    }

    pub fn payment_methods(&self) -> Vec<String> {
        self.payment_interfaces.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_backends_from_config() {
        let config = InterfaceConfig::parse(
            r#"{
                "vm": [
                    {"name": "lab", "type": "fake"},
                    {"name": "east", "type": "solusvm", "url": "https://solus.example.com",
                     "api_id": "id", "api_key": "key", "virt_type": "kvm", "node_group": "1"}
                ],
                "payment": [
                    {"name": "paypal", "type": "paypal", "business": "b@example.com",
                     "return_url": "https://panel.example.com/billing"},
                    {"name": "test", "type": "fake"}
                ]
            }"#,
        )
        .unwrap();

        let registry = ProviderRegistry::from_config(config).unwrap();
        assert_eq!(registry.regions(), vec!["east".to_string(), "lab".to_string()]);
        assert_eq!(registry.region("east").unwrap().kind(), "solusvm");
        assert!(registry.region("lab").unwrap().as_plan_lister().is_some());
        assert!(registry.region("west").is_none());

        assert_eq!(
            registry.payment_methods(),
            vec!["paypal".to_string(), "test".to_string()]
        );
        assert_eq!(registry.payment("test").unwrap().kind(), "fake");
        assert!(registry.payment("stripe").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let config = InterfaceConfig::parse(
            r#"{"vm": [{"name": "lab", "type": "fake"}, {"name": "lab", "type": "fake"}]}"#,
        )
        .unwrap();

        let err = ProviderRegistry::from_config(config).err().unwrap();
        assert!(matches!(
            err,
            ProviderConfigError::DuplicateName { kind: "vm", ref name } if name == "lab"
        ));
    }

    #[test]
    fn invalid_backend_parameters_are_configuration_errors() {
        let config = InterfaceConfig::parse(
            r#"{"payment": [{"name": "cb", "type": "coinbase",
                "callback_secret": "", "api_key": "", "api_secret": ""}]}"#,
        )
        .unwrap();

        let err = ProviderRegistry::from_config(config).err().unwrap();
        assert!(matches!(
            err,
            ProviderConfigError::Invalid { kind: "payment", ref name, .. } if name == "cb"
        ));
    }

    #[test]
    fn manual_registration_shares_the_same_checks() {
        let mut registry = ProviderRegistry::new();
        registry
            .register_vm_interface("lab", Arc::new(FakeVm::default()))
            .unwrap();
        assert!(
            registry
                .register_vm_interface("lab", Arc::new(FakeVm::default()))
                .is_err()
        );
        assert!(
            registry
                .register_payment_interface(" ", Arc::new(FakePayment))
                .is_err()
        );
    }
}
