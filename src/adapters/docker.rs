//! Thin Docker Engine API adapter over HTTP.
//!
//! Only the listing endpoints discovery needs are covered. A unix socket
//! is reached through a socket proxy exposing the API on TCP.

use crate::domain::model::{Network, Service};
use crate::domain::ports::OrchestratorClient;
use crate::utils::error::{Result, SdError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

pub const DEFAULT_DOCKER_HOST: &str = "http://localhost:2375";

#[derive(Debug, Clone)]
pub struct DockerClient {
    client: Client,
    base_url: String,
}

impl DockerClient {
    pub fn new(host: &str, api_version: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SdError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let mut base_url = normalize_host(host);
        if let Some(version) = api_version.map(str::trim).filter(|v| !v.is_empty()) {
            base_url.push('/');
            base_url.push_str(version.trim_start_matches('/'));
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Making Docker API request to: {}", url);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        tracing::debug!("Docker API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Docker reports failures as {"message": "..."}
            let message = serde_json::from_str::<ApiMessage>(&body)
                .map(|m| m.message)
                .unwrap_or(body);
            return Err(SdError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// `DOCKER_HOST` style `tcp://` addresses become `http://`; no trailing slash.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    match host.strip_prefix("tcp://") {
        Some(rest) => format!("http://{}", rest),
        None => host.to_string(),
    }
}

#[async_trait]
impl OrchestratorClient for DockerClient {
    async fn list_services(&self) -> Result<Vec<Service>> {
        let services = self.fetch::<Vec<ServiceResponse>>("/services", &[]).await?;
        let mut services: Vec<Service> = services.into_iter().map(Service::from).collect();

        // dnsrr 模式沒有 VIP，改用執行中 task 的位址
        let missing: Vec<&str> = services
            .iter()
            .filter(|s| s.networks.iter().any(|id| !s.addresses.contains_key(id)))
            .map(|s| s.id.as_str())
            .collect();
        if !missing.is_empty() {
            tracing::debug!("{} services without a virtual IP, looking up their tasks", missing.len());
            let filters = serde_json::json!({
                "service": missing,
                "desired-state": ["running"],
            });
            let tasks = self
                .fetch::<Vec<TaskResponse>>("/tasks", &[("filters", filters.to_string())])
                .await?;
            fill_task_addresses(&mut services, tasks);
        }

        Ok(services)
    }

    async fn list_networks(&self) -> Result<Vec<Network>> {
        let networks = self.fetch::<Vec<NetworkResponse>>("/networks", &[]).await?;
        Ok(networks
            .into_iter()
            .map(|n| Network {
                id: n.id,
                name: n.name,
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkResponse {
    id: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceResponse {
    #[serde(rename = "ID")]
    id: String,
    spec: ServiceSpec,
    #[serde(default)]
    endpoint: Option<ServiceEndpoint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceSpec {
    name: String,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    task_template: Option<TaskTemplate>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaskTemplate {
    #[serde(default)]
    container_spec: Option<ContainerSpec>,
    #[serde(default)]
    networks: Option<Vec<NetworkAttachment>>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerSpec {
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    env: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkAttachment {
    target: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceEndpoint {
    #[serde(default, rename = "VirtualIPs")]
    virtual_ips: Option<Vec<VirtualIp>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VirtualIp {
    #[serde(rename = "NetworkID")]
    network_id: String,
    #[serde(default)]
    addr: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaskResponse {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "ServiceID")]
    service_id: String,
    #[serde(default)]
    desired_state: Option<String>,
    #[serde(default)]
    networks_attachments: Option<Vec<TaskAttachment>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaskAttachment {
    network: TaskNetwork,
    #[serde(default)]
    addresses: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct TaskNetwork {
    #[serde(rename = "ID")]
    id: String,
}

/// Strips a `/prefix` suffix from an interface address.
fn strip_cidr(addr: &str) -> &str {
    addr.split('/').next().unwrap_or(addr)
}

/// Gives services without a VIP on a network the address of their running
/// task on it. The task with the smallest id wins so output stays stable
/// across polls.
fn fill_task_addresses(services: &mut [Service], mut tasks: Vec<TaskResponse>) {
    tasks.retain(|t| t.desired_state.as_deref() == Some("running"));
    tasks.sort_by(|a, b| a.id.cmp(&b.id));

    for task in tasks {
        let Some(service) = services.iter_mut().find(|s| s.id == task.service_id) else {
            continue;
        };
        for attachment in task.networks_attachments.unwrap_or_default() {
            if !service.networks.contains(&attachment.network.id)
                || service.addresses.contains_key(&attachment.network.id)
            {
                continue;
            }
            let first = attachment.addresses.unwrap_or_default().into_iter().next();
            if let Some(addr) = first.filter(|a| !a.is_empty()) {
                service
                    .addresses
                    .insert(attachment.network.id, strip_cidr(&addr).to_string());
            }
        }
    }
}

impl From<ServiceResponse> for Service {
    fn from(raw: ServiceResponse) -> Self {
        let template = raw.spec.task_template.unwrap_or_default();
        let container = template.container_spec.unwrap_or_default();

        let mut networks: BTreeSet<String> = template
            .networks
            .unwrap_or_default()
            .into_iter()
            .map(|n| n.target)
            .collect();
        let mut addresses = BTreeMap::new();

        for vip in raw.endpoint.and_then(|e| e.virtual_ips).unwrap_or_default() {
            if let Some(addr) = vip.addr.as_deref().filter(|a| !a.is_empty()) {
                addresses.insert(vip.network_id.clone(), strip_cidr(addr).to_string());
            }
            networks.insert(vip.network_id);
        }

        Service {
            id: raw.id,
            name: raw.spec.name,
            labels: raw.spec.labels.unwrap_or_default(),
            container_labels: container.labels.unwrap_or_default(),
            environment: container.env.unwrap_or_default(),
            networks,
            addresses,
        }
    }
}
