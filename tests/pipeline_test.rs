use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use swarm_sd::core::{Network, OrchestratorClient, Service, WriteOutcome};
use swarm_sd::{AtomicFileStore, DiscoveryRules, RefreshLoop, Result, SdError};
use tempfile::TempDir;

/// Orchestrator double; clones share topology so tests can change it between cycles.
#[derive(Clone)]
struct FakeSwarm {
    services: Arc<Mutex<Vec<Service>>>,
    networks: Vec<Network>,
    down: Arc<Mutex<bool>>,
}

impl FakeSwarm {
    fn new(services: Vec<Service>, networks: Vec<Network>) -> Self {
        Self {
            services: Arc::new(Mutex::new(services)),
            networks,
            down: Arc::new(Mutex::new(false)),
        }
    }

    fn set_services(&self, services: Vec<Service>) {
        *self.services.lock().unwrap() = services;
    }

    fn set_down(&self, down: bool) {
        *self.down.lock().unwrap() = down;
    }
}

#[async_trait]
impl OrchestratorClient for FakeSwarm {
    async fn list_services(&self) -> Result<Vec<Service>> {
        if *self.down.lock().unwrap() {
            return Err(SdError::Transport {
                message: "connection refused".to_string(),
            });
        }
        Ok(self.services.lock().unwrap().clone())
    }

    async fn list_networks(&self) -> Result<Vec<Network>> {
        Ok(self.networks.clone())
    }
}

fn network(id: &str, name: &str) -> Network {
    Network {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn service(id: &str, name: &str, attachments: &[(&str, &str)], labels: &[(&str, &str)]) -> Service {
    Service {
        id: id.to_string(),
        name: name.to_string(),
        labels: labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
        networks: attachments.iter().map(|(n, _)| n.to_string()).collect(),
        addresses: attachments
            .iter()
            .map(|(n, ip)| (n.to_string(), ip.to_string()))
            .collect(),
        ..Default::default()
    }
}

fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_only_labelled_proxy_service_is_emitted() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("swarm.d").join("swarm-endpoints.json");

    let swarm = FakeSwarm::new(
        vec![
            service("a", "A", &[("net-proxy", "10.0.1.4/24")], &[("prometheus.port", "9100")]),
            service("b", "B", &[("net-other", "10.0.2.9/24")], &[]),
        ],
        vec![network("net-proxy", "proxy"), network("net-other", "other")],
    );
    let mut refresh = RefreshLoop::new(swarm.clone(), AtomicFileStore::new(&output), DiscoveryRules::default());

    let report = refresh.run_once().await.unwrap();

    assert_eq!(report.targets, 1);
    assert_eq!(
        read_json(&output),
        serde_json::json!([
            {
                "targets": ["10.0.1.4:9100"],
                "labels": {
                    "job": "A",
                    "service": "A",
                    "service_label_prometheus_port": "9100"
                }
            }
        ])
    );
}

#[tokio::test]
async fn test_topology_change_moves_to_fallback_network() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("targets.json");

    let web = service(
        "w",
        "web",
        &[("net-proxy", "10.0.1.4/24"), ("net-mon", "10.0.3.4/24")],
        &[("prometheus.port", "8080")],
    );
    let prometheus = service("p", "prometheus", &[("net-mon", "10.0.3.2/24")], &[]);
    let swarm = FakeSwarm::new(
        vec![web.clone(), prometheus],
        vec![network("net-proxy", "proxy"), network("net-mon", "monitoring")],
    );
    let mut refresh = RefreshLoop::new(swarm.clone(), AtomicFileStore::new(&output), DiscoveryRules::default());

    refresh.run_once().await.unwrap();
    assert_eq!(read_json(&output)[0]["targets"][0], "10.0.3.4:8080");

    swarm.set_services(vec![web]);
    refresh.run_once().await.unwrap();
    assert_eq!(read_json(&output)[0]["targets"][0], "10.0.1.4:8080");
}

#[tokio::test]
async fn test_outage_leaves_previous_file_intact() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("targets.json");

    let swarm = FakeSwarm::new(
        vec![service("a", "A", &[("net-proxy", "10.0.1.4/24")], &[("prometheus.port", "9100")])],
        vec![network("net-proxy", "proxy")],
    );
    let mut refresh = RefreshLoop::new(swarm.clone(), AtomicFileStore::new(&output), DiscoveryRules::default());

    refresh.run_once().await.unwrap();
    let before = std::fs::read(&output).unwrap();

    swarm.set_down(true);
    assert!(refresh.run_once().await.is_err());
    assert_eq!(std::fs::read(&output).unwrap(), before);

    swarm.set_down(false);
    let report = refresh.run_once().await.unwrap();
    assert_eq!(report.outcome, WriteOutcome::Unchanged);
}

#[tokio::test]
async fn test_repeated_cycles_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let first_path = dir.path().join("first.json");
    let second_path = dir.path().join("second.json");

    let mut api = service("2", "api", &[("net-proxy", "10.0.1.3/24")], &[]);
    api.environment = vec!["SERVICE_PORTS=9100,9200,abc".to_string()];
    let swarm = FakeSwarm::new(
        vec![
            service("1", "web", &[("net-proxy", "10.0.1.4/24")], &[("prometheus.port", "80")]),
            api,
        ],
        vec![network("net-proxy", "proxy")],
    );

    RefreshLoop::new(swarm.clone(), AtomicFileStore::new(&first_path), DiscoveryRules::default())
        .run_once()
        .await
        .unwrap();
    RefreshLoop::new(swarm.clone(), AtomicFileStore::new(&second_path), DiscoveryRules::default())
        .run_once()
        .await
        .unwrap();

    let first = std::fs::read(&first_path).unwrap();
    assert_eq!(first, std::fs::read(&second_path).unwrap());

    let parsed: serde_json::Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(parsed[0]["targets"][0], "10.0.1.3:9100");
    assert_eq!(parsed[1]["targets"][0], "10.0.1.4:80");
}

#[tokio::test]
async fn test_no_monitored_network_writes_empty_list() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("targets.json");

    let swarm = FakeSwarm::new(
        vec![service("a", "A", &[("net-x", "10.0.9.1/24")], &[("prometheus.port", "9100")])],
        vec![network("net-x", "backend")],
    );
    let mut refresh = RefreshLoop::new(swarm.clone(), AtomicFileStore::new(&output), DiscoveryRules::default());

    let report = refresh.run_once().await.unwrap();

    assert_eq!(report.targets, 0);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "[]\n");
}
