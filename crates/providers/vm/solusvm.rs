use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rand::{Rng, distributions::Alphanumeric};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::{VmCreateRequest, VmInfo, VmInterface, VmStatus};
use crate::providers::config::SolusVmConfig;
use crate::providers::http::{build_client, ensure_success, loose_string};

/// Client for the SolusVM admin API (`/api/admin/command.php`).
pub struct SolusVmApi {
    http: reqwest::Client,
    endpoint: Url,
    api_id: String,
    api_key: String,
}

impl SolusVmApi {
    pub fn new(url: &str, api_id: &str, api_key: &str, insecure: bool) -> Result<Self> {
        if api_id.trim().is_empty() || api_key.trim().is_empty() {
            anyhow::bail!("api_id and api_key are required");
        }

        let base = Url::parse(url).with_context(|| format!("invalid url {url}"))?;
        let endpoint = base
            .join("/api/admin/command.php")
            .context("failed to build command endpoint")?;

        Ok(Self {
            http: build_client(insecure)?,
            endpoint,
            api_id: api_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub async fn request(&self, action: &str, params: &[(&str, &str)]) -> Result<HashMap<String, Value>> {
        let mut form: Vec<(&str, &str)> = vec![
            ("id", self.api_id.as_str()),
            ("key", self.api_key.as_str()),
            ("action", action),
            ("rdtype", "json"),
        ];
        form.extend_from_slice(params);

        debug!(action, "solusvm: api request");
        let resp = self
            .http
            .post(self.endpoint.clone())
            .form(&form)
            .send()
            .await?;
        let resp = ensure_success(resp, "solusvm", action).await?;

        let body: HashMap<String, Value> = resp.json().await?;
        parse_command_response(body)
    }
}

/// SolusVM answers HTTP 200 even for failed commands; the outcome is in `status`.
pub(crate) fn parse_command_response(body: HashMap<String, Value>) -> Result<HashMap<String, Value>> {
    let status = body.get("status").and_then(loose_string).unwrap_or_default();
    if status != "success" {
        let message = body
            .get("statusmsg")
            .and_then(loose_string)
            .unwrap_or_else(|| "no status message".to_string());
        return Err(anyhow!("solusvm command failed: {message}"));
    }
    Ok(body)
}

pub struct SolusVm {
    api: SolusVmApi,
    virt_type: String,
    node_group: String,
}

impl SolusVm {
    pub fn new(config: &SolusVmConfig) -> Result<Self> {
        if config.virt_type.trim().is_empty() {
            anyhow::bail!("virt_type is required");
        }

        Ok(Self {
            api: SolusVmApi::new(
                &config.url,
                &config.api_id,
                &config.api_key,
                config.insecure,
            )?,
            virt_type: config.virt_type.clone(),
            node_group: config.node_group.clone(),
        })
    }
}

fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

fn vm_status(state: &str) -> VmStatus {
    match state {
        "online" => VmStatus::Online,
        "offline" => VmStatus::Offline,
        _ => VmStatus::Unknown,
    }
}

#[async_trait]
impl VmInterface for SolusVm {
    fn kind(&self) -> &'static str {
        "solusvm"
    }

    async fn create(&self, request: &VmCreateRequest) -> Result<String> {
        let password = random_password();
        let body = self
            .api
            .request(
                "vserver-create",
                &[
                    ("type", self.virt_type.as_str()),
                    ("nodegroup", self.node_group.as_str()),
                    ("hostname", request.hostname.as_str()),
                    ("password", password.as_str()),
                    ("username", request.owner.as_str()),
                    ("plan", request.plan_identification.as_str()),
                    ("template", request.image_identification.as_str()),
                    ("ips", "1"),
                ],
            )
            .await?;

        let vm_id = body
            .get("vserverid")
            .and_then(loose_string)
            .ok_or_else(|| anyhow!("solusvm create response missing vserverid"))?;
        info!(%vm_id, hostname = %request.hostname, "solusvm: virtual server created");
        Ok(vm_id)
    }

    async fn delete(&self, vm_id: &str) -> Result<()> {
        self.api
            .request(
                "vserver-terminate",
                &[("vserverid", vm_id), ("deleteclient", "false")],
            )
            .await?;
        Ok(())
    }

    async fn info(&self, vm_id: &str) -> Result<VmInfo> {
        let body = self
            .api
            .request("vserver-infoall", &[("vserverid", vm_id)])
            .await?;

        let state = body.get("state").and_then(loose_string).unwrap_or_default();
        Ok(VmInfo {
            status: vm_status(&state),
            ip: body.get("mainipaddress").and_then(loose_string),
            hostname: body.get("hostname").and_then(loose_string),
        })
    }

    async fn start(&self, vm_id: &str) -> Result<()> {
        self.api
            .request("vserver-boot", &[("vserverid", vm_id)])
            .await?;
        Ok(())
    }

    async fn stop(&self, vm_id: &str) -> Result<()> {
        self.api
            .request("vserver-shutdown", &[("vserverid", vm_id)])
            .await?;
        Ok(())
    }

    async fn reboot(&self, vm_id: &str) -> Result<()> {
        self.api
            .request("vserver-reboot", &[("vserverid", vm_id)])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> SolusVmConfig {
        SolusVmConfig {
            url: "https://solus.example.com:5656".to_string(),
            api_id: "id".to_string(),
            api_key: "key".to_string(),
            virt_type: "kvm".to_string(),
            node_group: "1".to_string(),
            insecure: true,
        }
    }

    #[test]
    fn builds_command_endpoint_from_base_url() {
        let vm = SolusVm::new(&config()).unwrap();
        assert_eq!(
            vm.api.endpoint.as_str(),
            "https://solus.example.com:5656/api/admin/command.php"
        );
        assert!(vm.as_plan_lister().is_none());
    }

    #[test]
    fn rejects_missing_credentials_and_bad_urls() {
        let mut cfg = config();
        cfg.api_key = String::new();
        assert!(SolusVm::new(&cfg).is_err());

        let mut cfg = config();
        cfg.url = "not a url".to_string();
        assert!(SolusVm::new(&cfg).is_err());
    }

    #[test]
    fn command_status_decides_success() {
        let ok: HashMap<String, Value> = serde_json::from_value(json!({
            "status": "success",
            "vserverid": 42
        }))
        .unwrap();
        let body = parse_command_response(ok).unwrap();
        assert_eq!(body.get("vserverid").and_then(loose_string).as_deref(), Some("42"));

        let failed: HashMap<String, Value> = serde_json::from_value(json!({
            "status": "error",
            "statusmsg": "Invalid plan"
        }))
        .unwrap();
        let err = parse_command_response(failed).unwrap_err();
        assert!(err.to_string().contains("Invalid plan"));
    }

    #[test]
    fn maps_server_state() {
        assert_eq!(vm_status("online"), VmStatus::Online);
        assert_eq!(vm_status("offline"), VmStatus::Offline);
        assert_eq!(vm_status("disabled"), VmStatus::Unknown);
        assert_eq!(random_password().len(), 16);
    }
}
