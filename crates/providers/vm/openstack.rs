use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use super::{ProviderPlan, VmCreateRequest, VmInfo, VmInterface, VmPlanLister, VmStatus};
use crate::providers::config::OpenStackConfig;
use crate::providers::http::{build_client, ensure_success, loose_string};

const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct Session {
    token: String,
    compute_url: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now > Duration::seconds(TOKEN_REFRESH_MARGIN_SECS)
    }
}

/// Nova compute backend authenticated through Keystone v2.0 tokens.
pub struct OpenStack {
    http: reqwest::Client,
    identity_url: Url,
    username: String,
    password: String,
    tenant: String,
    network_id: String,
    session: Mutex<Option<Session>>,
}

impl OpenStack {
    pub fn new(config: &OpenStackConfig) -> Result<Self> {
        let mut identity_url =
            Url::parse(&config.url).with_context(|| format!("invalid url {}", config.url))?;
        if !identity_url.path().ends_with('/') {
            let path = format!("{}/", identity_url.path());
            identity_url.set_path(&path);
        }
        if config.username.is_empty() || config.tenant.is_empty() {
            anyhow::bail!("username and tenant are required");
        }

        Ok(Self {
            http: build_client(false)?,
            identity_url,
            username: config.username.clone(),
            password: config.password.clone(),
            tenant: config.tenant.clone(),
            network_id: config.network_id.clone(),
            session: Mutex::new(None),
        })
    }

    async fn session(&self) -> Result<Session> {
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.as_ref() {
            if session.is_fresh(Utc::now()) {
                return Ok(session.clone());
            }
        }

        let session = self.authenticate().await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    async fn authenticate(&self) -> Result<Session> {
        let url = self.identity_url.join("tokens")?;
        let body = json!({
            "auth": {
                "passwordCredentials": {
                    "username": self.username,
                    "password": self.password,
                },
                "tenantName": self.tenant,
            }
        });

        debug!(tenant = %self.tenant, "openstack: requesting token");
        let resp = self.http.post(url).json(&body).send().await?;
        let resp = ensure_success(resp, "openstack", "authenticate").await?;
        let access: Value = resp.json().await?;
        parse_session(&access)
    }

    async fn compute(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>> {
        let session = self.session().await?;
        let url = format!("{}/{}", session.compute_url.trim_end_matches('/'), path);

        let mut builder = self
            .http
            .request(method, &url)
            .header("X-Auth-Token", &session.token);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let resp = builder.send().await?;
        let resp = ensure_success(resp, "openstack", path).await?;
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn server_action(&self, vm_id: &str, action: Value) -> Result<()> {
        self.compute(
            reqwest::Method::POST,
            &format!("servers/{vm_id}/action"),
            Some(action),
        )
        .await?;
        Ok(())
    }
}

fn parse_session(access: &Value) -> Result<Session> {
    let access = access
        .get("access")
        .ok_or_else(|| anyhow!("token response missing access"))?;

    let token = access
        .pointer("/token/id")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("token response missing token id"))?
        .to_string();
    let expires_at = access
        .pointer("/token/expires")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("token response missing expiry"))?;

    let compute_url = access
        .get("serviceCatalog")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|service| service.get("type").and_then(Value::as_str) == Some("compute"))
        .filter_map(|service| service.pointer("/endpoints/0/publicURL"))
        .find_map(Value::as_str)
        .ok_or_else(|| anyhow!("service catalog has no compute endpoint"))?
        .to_string();

    Ok(Session {
        token,
        compute_url,
        expires_at,
    })
}

fn vm_status(status: &str) -> VmStatus {
    match status {
        "ACTIVE" => VmStatus::Online,
        "SHUTOFF" | "STOPPED" | "SUSPENDED" => VmStatus::Offline,
        _ => VmStatus::Unknown,
    }
}

fn parse_server(body: &Value) -> Result<VmInfo> {
    let server = body
        .get("server")
        .ok_or_else(|| anyhow!("server response missing server"))?;

    let status = server.get("status").and_then(Value::as_str).unwrap_or_default();
    let ip = server
        .get("addresses")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|networks| networks.values())
        .filter_map(Value::as_array)
        .flatten()
        .filter(|addr| addr.get("version").and_then(Value::as_i64) == Some(4))
        .find_map(|addr| addr.get("addr").and_then(loose_string));

    Ok(VmInfo {
        status: vm_status(status),
        ip,
        hostname: server.get("name").and_then(loose_string),
    })
}

fn parse_flavors(body: &Value) -> Vec<ProviderPlan> {
    body.get("flavors")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|flavor| {
            Some(ProviderPlan {
                name: flavor.get("name")?.as_str()?.to_string(),
                identification: loose_string(flavor.get("id")?)?,
                price: 0,
                ram: flavor.get("ram")?.as_i64()? as i32,
                cpu: flavor.get("vcpus")?.as_i64()? as i32,
                storage: flavor.get("disk")?.as_i64()? as i32,
                bandwidth: 0,
            })
        })
        .collect()
}

#[async_trait]
impl VmInterface for OpenStack {
    fn kind(&self) -> &'static str {
        "openstack"
    }

    async fn create(&self, request: &VmCreateRequest) -> Result<String> {
        let body = json!({
            "server": {
                "name": request.hostname,
                "imageRef": request.image_identification,
                "flavorRef": request.plan_identification,
                "networks": [{"uuid": self.network_id}],
                "metadata": {"owner": request.owner},
            }
        });

        let created = self
            .compute(reqwest::Method::POST, "servers", Some(body))
            .await?
            .ok_or_else(|| anyhow!("empty server create response"))?;
        let vm_id = created
            .pointer("/server/id")
            .and_then(loose_string)
            .ok_or_else(|| anyhow!("server create response missing id"))?;

        info!(%vm_id, hostname = %request.hostname, "openstack: server created");
        Ok(vm_id)
    }

    async fn delete(&self, vm_id: &str) -> Result<()> {
        self.compute(reqwest::Method::DELETE, &format!("servers/{vm_id}"), None)
            .await?;
        Ok(())
    }

    async fn info(&self, vm_id: &str) -> Result<VmInfo> {
        let body = self
            .compute(reqwest::Method::GET, &format!("servers/{vm_id}"), None)
            .await?
            .ok_or_else(|| anyhow!("empty server response"))?;
        parse_server(&body)
    }

    async fn start(&self, vm_id: &str) -> Result<()> {
        self.server_action(vm_id, json!({"os-start": null})).await
    }

    async fn stop(&self, vm_id: &str) -> Result<()> {
        self.server_action(vm_id, json!({"os-stop": null})).await
    }

    async fn reboot(&self, vm_id: &str) -> Result<()> {
        self.server_action(vm_id, json!({"reboot": {"type": "SOFT"}}))
            .await
    }

    fn as_plan_lister(&self) -> Option<&dyn VmPlanLister> {
        Some(self)
    }
}

#[async_trait]
impl VmPlanLister for OpenStack {
    async fn plan_list(&self) -> Result<Vec<ProviderPlan>> {
        let body = self
            .compute(reqwest::Method::GET, "flavors/detail", None)
            .await?
            .unwrap_or(Value::Null);
        Ok(parse_flavors(&body))
    }
}
