use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A swarm service as seen in one poll of the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    /// Labels on the service spec.
    pub labels: BTreeMap<String, String>,
    /// Labels on the container spec of the task template.
    pub container_labels: BTreeMap<String, String>,
    /// `KEY=VALUE` entries in declaration order.
    pub environment: Vec<String>,
    pub networks: BTreeSet<String>,
    /// Network id to IP; a `/prefix` suffix is tolerated.
    pub addresses: BTreeMap<String, String>,
}

impl Service {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn has_label(&self, key: &str) -> bool {
        self.labels.contains_key(key) || self.container_labels.contains_key(key)
    }

    /// Every value assigned to `name` in the environment, in order.
    pub fn env_values<'a, 'b>(
        &'a self,
        name: &'b str,
    ) -> impl Iterator<Item = &'a str> + use<'a, 'b> {
        self.environment.iter().filter_map(move |entry| {
            let (key, value) = entry.split_once('=')?;
            (key == name).then_some(value)
        })
    }

    /// The value of `name`, or `None` when it is absent or declared more than once.
    pub fn env_var(&self, name: &str) -> Option<&str> {
        let mut values = self.env_values(name);
        let first = values.next()?;
        match values.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    pub fn address_on(&self, network_id: &str) -> Option<&str> {
        self.addresses.get(network_id).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
}

/// Where the monitored network set came from in the current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkSource {
    /// Networks configured by name, detection skipped.
    Static,
    /// Networks the sentinel service is attached to.
    Sentinel { service_id: String },
    /// The fallback network(s) matched by name.
    Fallback { name: String },
    /// Nothing matched; the cycle yields no targets.
    None,
}

impl std::fmt::Display for NetworkSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkSource::Static => write!(f, "static"),
            NetworkSource::Sentinel { service_id } => write!(f, "sentinel service {}", service_id),
            NetworkSource::Fallback { name } => write!(f, "fallback network '{}'", name),
            NetworkSource::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredNetworks {
    pub ids: BTreeSet<String>,
    pub source: NetworkSource,
}

impl MonitoredNetworks {
    pub fn empty() -> Self {
        Self {
            ids: BTreeSet::new(),
            source: NetworkSource::None,
        }
    }

    pub fn contains(&self, network_id: &str) -> bool {
        self.ids.contains(network_id)
    }

    pub fn intersects(&self, networks: &BTreeSet<String>) -> bool {
        !self.ids.is_disjoint(networks)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One entry of the file_sd document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub targets: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

/// The outcome of one pure discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub monitored: MonitoredNetworks,
    pub candidates: usize,
    pub unresolved: usize,
    pub groups: Vec<TargetGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with_env(env: &[&str]) -> Service {
        Service {
            environment: env.iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_env_var_lookup() {
        let service = service_with_env(&["A=1", "SERVICE_PORTS=9100,9200", "B="]);
        assert_eq!(service.env_var("SERVICE_PORTS"), Some("9100,9200"));
        assert_eq!(service.env_var("B"), Some(""));
        assert_eq!(service.env_var("MISSING"), None);
    }

    #[test]
    fn test_env_var_requires_single_declaration() {
        let service = service_with_env(&["SERVICE_PORTS=9100", "SERVICE_PORTS=9200"]);
        assert_eq!(service.env_var("SERVICE_PORTS"), None);
        assert_eq!(service.env_values("SERVICE_PORTS").count(), 2);
    }

    #[test]
    fn test_env_var_does_not_match_prefix() {
        let service = service_with_env(&["SERVICE_PORTS_EXTRA=1", "NOEQUALS"]);
        assert_eq!(service.env_var("SERVICE_PORTS"), None);
        assert_eq!(service.env_var("NOEQUALS"), None);
    }

    #[test]
    fn test_value_may_contain_equals_sign() {
        let service = service_with_env(&["PROM_METRICS_PATH=/metrics?a=b"]);
        assert_eq!(service.env_var("PROM_METRICS_PATH"), Some("/metrics?a=b"));
    }

    #[test]
    fn test_env_value_outlives_lookup_key() {
        let service = service_with_env(&["SERVICE_PORTS=8080"]);
        let value = {
            let key = format!("{}_PORTS", "SERVICE");
            service.env_var(&key)
        };
        assert_eq!(value, Some("8080"));

        let values: Vec<&str> = {
            let key = String::from("SERVICE_PORTS");
            service.env_values(&key).collect()
        };
        assert_eq!(values, vec!["8080"]);
    }
}
