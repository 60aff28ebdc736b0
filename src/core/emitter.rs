use crate::domain::model::{MonitoredNetworks, Service, TargetGroup};
use crate::domain::ports::{TargetStore, WriteOutcome};
use crate::utils::error::Result;
use std::collections::BTreeMap;

/// Environment variable that overrides the scrape path of a service.
pub const METRICS_PATH_ENV: &str = "PROM_METRICS_PATH";

/// The service's address on the first monitored network it has one on,
/// in network id order, without the prefix length.
pub fn select_address<'a>(service: &'a Service, monitored: &MonitoredNetworks) -> Option<&'a str> {
    monitored
        .ids
        .iter()
        .find_map(|id| service.address_on(id))
        .map(|addr| addr.split('/').next().unwrap_or(addr))
}

/// Prometheus label names only allow `[a-zA-Z0-9_]`.
pub fn sanitize_label_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

pub fn target_group(service: &Service, address: &str, port: u16) -> TargetGroup {
    let mut labels = BTreeMap::new();
    labels.insert("job".to_string(), service.name.clone());
    labels.insert("service".to_string(), service.name.clone());

    for (key, value) in &service.labels {
        labels.insert(format!("service_label_{}", sanitize_label_name(key)), value.clone());
    }
    for (key, value) in &service.container_labels {
        labels.insert(format!("container_label_{}", sanitize_label_name(key)), value.clone());
    }

    if let Some(path) = service.env_var(METRICS_PATH_ENV).filter(|p| !p.is_empty()) {
        labels.insert("__metrics_path__".to_string(), path.to_string());
    }

    TargetGroup {
        targets: vec![format_target(address, port)],
        labels,
    }
}

fn format_target(address: &str, port: u16) -> String {
    // IPv6 literals need brackets to carry a port
    if address.contains(':') {
        format!("[{}]:{}", address, port)
    } else {
        format!("{}:{}", address, port)
    }
}

/// Pretty JSON with a trailing newline; identical groups give identical bytes.
pub fn render(groups: &[TargetGroup]) -> Result<Vec<u8>> {
    let mut payload = serde_json::to_vec_pretty(groups)?;
    payload.push(b'\n');
    Ok(payload)
}

/// Write `payload` unless the store already holds exactly these bytes.
pub async fn emit<S: TargetStore>(store: &S, payload: &[u8]) -> Result<WriteOutcome> {
    match store.read_current().await {
        Ok(Some(current)) if current == payload => {
            tracing::debug!("Target file {} is up to date", store.location().display());
            return Ok(WriteOutcome::Unchanged);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::debug!("Could not read current target file, rewriting: {}", e);
        }
    }

    store.replace(payload).await?;
    tracing::debug!(
        "Wrote {} bytes to {}",
        payload.len(),
        store.location().display()
    );
    Ok(WriteOutcome::Written)
}
