use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::providers::vm::ProviderPlan;

#[derive(Debug, Error)]
pub enum ProviderConfigError {
    #[error("failed to read interface configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse interface configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate {kind} interface name {name}")]
    DuplicateName { kind: &'static str, name: String },
    #[error("invalid configuration for {kind} interface {name}: {reason}")]
    Invalid {
        kind: &'static str,
        name: String,
        reason: String,
    },
}

/// Contents of `<primary config>.json`.
#[derive(Debug, Default, Deserialize)]
pub struct InterfaceConfig {
    #[serde(default)]
    pub vm: Vec<VmEntry>,
    #[serde(default)]
    pub payment: Vec<PaymentEntry>,
}

impl InterfaceConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProviderConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ProviderConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&raw).map_err(|source| ProviderConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Path of the interface file that belongs to a primary config file.
    pub fn path_for(primary: impl AsRef<Path>) -> PathBuf {
        let mut path = primary.as_ref().as_os_str().to_owned();
        path.push(".json");
        PathBuf::from(path)
    }
}

#[derive(Debug, Deserialize)]
pub struct VmEntry {
    pub name: String,
    #[serde(flatten)]
    pub provider: VmProviderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VmProviderConfig {
    Solusvm(SolusVmConfig),
    Openstack(OpenStackConfig),
    Lndynamic(LnDynamicConfig),
    Fake(FakeVmConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolusVmConfig {
    pub url: String,
    pub api_id: String,
    pub api_key: String,
    pub virt_type: String,
    pub node_group: String,
    #[serde(default)]
    pub insecure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenStackConfig {
    /// Identity (Keystone v2.0) endpoint.
    pub url: String,
    pub username: String,
    pub password: String,
    pub tenant: String,
    pub network_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LnDynamicConfig {
    pub region: String,
    pub api_id: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FakeVmConfig {
    #[serde(default)]
    pub plans: Vec<ProviderPlan>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntry {
    pub name: String,
    #[serde(flatten)]
    pub provider: PaymentProviderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaymentProviderConfig {
    Paypal(PaypalConfig),
    Coinbase(CoinbaseConfig),
    Fake(FakePaymentConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaypalConfig {
    pub business: String,
    pub return_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinbaseConfig {
    pub callback_secret: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FakePaymentConfig {}

fn default_currency() -> String {
    "USD".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "vm": [
            {"name": "us-east", "type": "solusvm", "url": "https://solus.example.com",
             "api_id": "id", "api_key": "key", "virt_type": "kvm", "node_group": "1"},
            {"name": "eu-west", "type": "lndynamic", "region": "toronto",
             "api_id": "abc", "api_key": "secret"},
            {"name": "lab", "type": "fake",
             "plans": [{"name": "Tiny", "identification": "t1", "price": 100,
                        "ram": 256, "cpu": 1, "storage": 5, "bandwidth": 50}]}
        ],
        "payment": [
            {"name": "paypal", "type": "paypal", "business": "billing@example.com",
             "return_url": "https://panel.example.com/billing"},
            {"name": "test", "type": "fake"}
        ]
    }"#;

    #[test]
    fn parses_every_entry_by_type_tag() {
        let config = InterfaceConfig::parse(SAMPLE).unwrap();

        assert_eq!(config.vm.len(), 3);
        assert!(matches!(
            &config.vm[0].provider,
            VmProviderConfig::Solusvm(cfg) if cfg.virt_type == "kvm" && !cfg.insecure
        ));
        assert!(matches!(
            &config.vm[1].provider,
            VmProviderConfig::Lndynamic(cfg) if cfg.region == "toronto"
        ));
        match &config.vm[2].provider {
            VmProviderConfig::Fake(cfg) => assert_eq!(cfg.plans[0].identification, "t1"),
            other => panic!("unexpected provider {other:?}"),
        }

        assert_eq!(config.payment.len(), 2);
        assert!(matches!(
            &config.payment[0].provider,
            PaymentProviderConfig::Paypal(cfg) if cfg.currency == "USD"
        ));
        assert!(matches!(
            config.payment[1].provider,
            PaymentProviderConfig::Fake(_)
        ));
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let raw = r#"{"vm": [{"name": "x", "type": "xen"}]}"#;
        let err = InterfaceConfig::parse(raw).unwrap_err();
        assert!(err.to_string().contains("unknown variant"));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let config = InterfaceConfig::parse("{}").unwrap();
        assert!(config.vm.is_empty());
        assert!(config.payment.is_empty());
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("absent.cfg.json");
        assert!(matches!(
            InterfaceConfig::load(&missing),
            Err(ProviderConfigError::Read { .. })
        ));

        let malformed = dir.path().join("broken.cfg.json");
        let mut file = std::fs::File::create(&malformed).unwrap();
        file.write_all(b"{\"vm\": [").unwrap();
        assert!(matches!(
            InterfaceConfig::load(&malformed),
            Err(ProviderConfigError::Parse { .. })
        ));
    }

    #[test]
    fn interface_path_appends_json_suffix() {
        assert_eq!(
            InterfaceConfig::path_for("conf/panel.cfg"),
            PathBuf::from("conf/panel.cfg.json")
        );
    }
}
