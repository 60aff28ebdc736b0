use crate::core::emitter::{select_address, target_group};
use crate::core::network::resolve_monitored_networks;
use crate::core::port::{resolve_port, PortResolution};
use crate::core::scanner::scan_services;
use crate::domain::model::{Discovery, Network, Service};

pub const DEFAULT_SENTINEL_SERVICE: &str = "prometheus";
pub const DEFAULT_FALLBACK_NETWORK: &str = "proxy";
pub const DEFAULT_PORT_LABEL: &str = "prometheus.port";
pub const DEFAULT_PORT_ENV: &str = "SERVICE_PORTS";
pub const DEFAULT_OPT_OUT_LABEL: &str = "nometrics";

/// The naming conventions discovery keys off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRules {
    pub sentinel_service: String,
    pub fallback_network: String,
    /// When non-empty, these network names replace sentinel detection.
    pub static_networks: Vec<String>,
    pub port_label: String,
    pub port_env: String,
    pub opt_out_label: String,
}

impl Default for DiscoveryRules {
    fn default() -> Self {
        Self {
            sentinel_service: DEFAULT_SENTINEL_SERVICE.to_string(),
            fallback_network: DEFAULT_FALLBACK_NETWORK.to_string(),
            static_networks: Vec::new(),
            port_label: DEFAULT_PORT_LABEL.to_string(),
            port_env: DEFAULT_PORT_ENV.to_string(),
            opt_out_label: DEFAULT_OPT_OUT_LABEL.to_string(),
        }
    }
}

/// Turn one orchestrator snapshot into target groups. No I/O, no state.
pub fn discover(services: &[Service], networks: &[Network], rules: &DiscoveryRules) -> Discovery {
    let monitored = resolve_monitored_networks(services, networks, rules);

    let mut candidates = scan_services(services, &monitored, rules);
    candidates.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let mut groups = Vec::with_capacity(candidates.len());
    let mut unresolved = 0;

    for service in &candidates {
        let port = match resolve_port(service, rules) {
            PortResolution::Resolved { port, source } => {
                tracing::debug!("Service '{}' scrapes port {} ({:?})", service.name, port, source);
                port
            }
            PortResolution::Skip(reason) => {
                tracing::debug!("Unable to find port for service '{}': {}, skipping", service.name, reason);
                unresolved += 1;
                continue;
            }
        };

        let Some(address) = select_address(service, &monitored) else {
            tracing::debug!(
                "Service '{}' has no address on a monitored network, skipping",
                service.name
            );
            unresolved += 1;
            continue;
        };

        tracing::debug!("Add endpoint for {} at {}:{}", service.name, address, port);
        groups.push(target_group(service, address, port));
    }

    Discovery {
        monitored,
        candidates: candidates.len(),
        unresolved,
        groups,
    }
}
