use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value, json};
use sha2::Sha512;
use tracing::{debug, info};

use super::{ProviderPlan, VmCreateRequest, VmInfo, VmInterface, VmPlanLister, VmStatus};
use crate::providers::config::LnDynamicConfig;
use crate::providers::http::{build_client, ensure_success, loose_i64, loose_string};

type HmacSha512 = Hmac<Sha512>;

const API_BASE: &str = "https://dynamic.lunanode.com/api";
const PARTIAL_KEY_LEN: usize = 64;

/// Luna Node Dynamic backend. Requests carry an HMAC-SHA512 signature over handler, body and nonce.
pub struct LnDynamic {
    http: reqwest::Client,
    region: String,
    api_id: String,
    api_key: String,
}

impl LnDynamic {
    pub fn new(config: &LnDynamicConfig) -> Result<Self> {
        if config.api_id.is_empty()
            || config.api_key.len() < PARTIAL_KEY_LEN
            || !config.api_key.is_char_boundary(PARTIAL_KEY_LEN)
        {
            anyhow::bail!("api_id is required and api_key must be at least {PARTIAL_KEY_LEN} characters");
        }
        if config.region.is_empty() {
            anyhow::bail!("region is required");
        }

        Ok(Self {
            http: build_client(false)?,
            region: config.region.clone(),
            api_id: config.api_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn partial_key(&self) -> &str {
        &self.api_key[..PARTIAL_KEY_LEN]
    }

    fn request_body(&self, params: &[(&str, &str)]) -> String {
        let mut req = Map::new();
        req.insert("api_id".to_string(), json!(self.api_id));
        req.insert("api_partialkey".to_string(), json!(self.partial_key()));
        for (key, value) in params {
            req.insert((*key).to_string(), json!(value));
        }
        Value::Object(req).to_string()
    }

    async fn request(&self, category: &str, action: &str, params: &[(&str, &str)]) -> Result<Value> {
        let handler = format!("{category}/{action}/");
        let req = self.request_body(params);
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
            .to_string();
        let signature = sign(&self.api_key, &handler, &req, &nonce)?;

        debug!(%handler, "lndynamic: api request");
        let resp = self
            .http
            .post(format!("{API_BASE}/{handler}"))
            .form(&[
                ("req", req.as_str()),
                ("signature", signature.as_str()),
                ("nonce", nonce.as_str()),
            ])
            .send()
            .await?;
        let resp = ensure_success(resp, "lndynamic", &handler).await?;

        let body: Value = resp.json().await?;
        check_success(body)
    }
}

pub(crate) fn sign(api_key: &str, handler: &str, req: &str, nonce: &str) -> Result<String> {
    let mut mac = HmacSha512::new_from_slice(api_key.as_bytes())?;
    mac.update(format!("{handler}|{req}|{nonce}").as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn check_success(body: Value) -> Result<Value> {
    if body.get("success").and_then(Value::as_str) == Some("yes") {
        return Ok(body);
    }
    let message = body
        .get("error")
        .and_then(loose_string)
        .unwrap_or_else(|| "unknown error".to_string());
    Err(anyhow!("lndynamic request failed: {message}"))
}

fn vm_status(status: &str) -> VmStatus {
    match status.to_ascii_lowercase().as_str() {
        "online" | "active" => VmStatus::Online,
        "offline" | "stopped" | "shutoff" => VmStatus::Offline,
        _ => VmStatus::Unknown,
    }
}

fn parse_info(body: &Value) -> VmInfo {
    let info = body.get("info").unwrap_or(&Value::Null);
    VmInfo {
        status: info
            .get("status")
            .and_then(Value::as_str)
            .map(vm_status)
            .unwrap_or(VmStatus::Unknown),
        ip: info.get("ip").and_then(loose_string),
        hostname: info.get("hostname").and_then(loose_string),
    }
}

/// Luna Node lists prices in dollars; the catalog stores minor units.
fn parse_plans(body: &Value) -> Vec<ProviderPlan> {
    body.get("plans")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|plan| {
            let price = plan
                .get("price")
                .and_then(loose_string)
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .map(|dollars| (dollars * 100.0).round() as i64)
                .unwrap_or_default();

            Some(ProviderPlan {
                name: plan.get("name").and_then(loose_string)?,
                identification: plan.get("plan_id").and_then(loose_string)?,
                price,
                ram: plan.get("ram").and_then(loose_i64)? as i32,
                cpu: plan.get("vcpu").and_then(loose_i64)? as i32,
                storage: plan.get("storage").and_then(loose_i64)? as i32,
                bandwidth: plan.get("bandwidth").and_then(loose_i64).unwrap_or_default() as i32,
            })
        })
        .collect()
}

#[async_trait]
impl VmInterface for LnDynamic {
    fn kind(&self) -> &'static str {
        "lndynamic"
    }

    async fn create(&self, request: &VmCreateRequest) -> Result<String> {
        let body = self
            .request(
                "vm",
                "create",
                &[
                    ("hostname", request.hostname.as_str()),
                    ("plan_id", request.plan_identification.as_str()),
                    ("image_id", request.image_identification.as_str()),
                    ("region", self.region.as_str()),
                ],
            )
            .await?;

        let vm_id = body
            .get("vm_id")
            .and_then(loose_string)
            .ok_or_else(|| anyhow!("lndynamic create response missing vm_id"))?;
        info!(%vm_id, region = %self.region, "lndynamic: vm created");
        Ok(vm_id)
    }

    async fn delete(&self, vm_id: &str) -> Result<()> {
        self.request("vm", "delete", &[("vm_id", vm_id)]).await?;
        Ok(())
    }

    async fn info(&self, vm_id: &str) -> Result<VmInfo> {
        let body = self.request("vm", "info", &[("vm_id", vm_id)]).await?;
        Ok(parse_info(&body))
    }

    async fn start(&self, vm_id: &str) -> Result<()> {
        self.request("vm", "start", &[("vm_id", vm_id)]).await?;
        Ok(())
    }

    async fn stop(&self, vm_id: &str) -> Result<()> {
        self.request("vm", "stop", &[("vm_id", vm_id)]).await?;
        Ok(())
    }

    async fn reboot(&self, vm_id: &str) -> Result<()> {
        self.request("vm", "reboot", &[("vm_id", vm_id)]).await?;
        Ok(())
    }

    fn as_plan_lister(&self) -> Option<&dyn VmPlanLister> {
        Some(self)
    }
}

#[async_trait]
impl VmPlanLister for LnDynamic {
    async fn plan_list(&self) -> Result<Vec<ProviderPlan>> {
        let body = self.request("plan", "list", &[]).await?;
        Ok(parse_plans(&body))
    }
}
