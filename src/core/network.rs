use crate::core::discovery::DiscoveryRules;
use crate::domain::model::{MonitoredNetworks, Network, NetworkSource, Service};
use std::collections::BTreeSet;

/// Decide which networks are in scope for this cycle.
///
/// Static names win over detection. Otherwise the networks of the sentinel
/// service are used, falling back to every network named after
/// `rules.fallback_network`. An empty result is a valid outcome.
pub fn resolve_monitored_networks(
    services: &[Service],
    networks: &[Network],
    rules: &DiscoveryRules,
) -> MonitoredNetworks {
    if !rules.static_networks.is_empty() {
        return static_networks(networks, &rules.static_networks);
    }

    if let Some(sentinel) = find_sentinel(services, &rules.sentinel_service) {
        if !sentinel.networks.is_empty() {
            tracing::debug!(
                "Sentinel service '{}' ({}) is on networks {:?}",
                sentinel.name,
                sentinel.id,
                sentinel.networks
            );
            return MonitoredNetworks {
                ids: sentinel.networks.clone(),
                source: NetworkSource::Sentinel {
                    service_id: sentinel.id.clone(),
                },
            };
        }
        tracing::debug!(
            "Sentinel service '{}' is not on any networks, using fallback",
            sentinel.name
        );
    } else {
        tracing::debug!(
            "Sentinel service '{}' not found, using fallback network '{}'",
            rules.sentinel_service,
            rules.fallback_network
        );
    }

    let ids: BTreeSet<String> = networks
        .iter()
        .filter(|network| network.name == rules.fallback_network)
        .map(|network| network.id.clone())
        .collect();

    if ids.is_empty() {
        tracing::warn!(
            "No sentinel service '{}' and no network named '{}'; no targets this cycle",
            rules.sentinel_service,
            rules.fallback_network
        );
        return MonitoredNetworks::empty();
    }

    MonitoredNetworks {
        ids,
        source: NetworkSource::Fallback {
            name: rules.fallback_network.clone(),
        },
    }
}

/// Several services may share the sentinel name; the smallest id wins.
fn find_sentinel<'a>(services: &'a [Service], name: &str) -> Option<&'a Service> {
    let mut matching: Vec<&Service> = services.iter().filter(|s| s.name == name).collect();
    matching.sort_by(|a, b| a.id.cmp(&b.id));

    if matching.len() > 1 {
        let ignored: Vec<&str> = matching[1..].iter().map(|s| s.id.as_str()).collect();
        tracing::warn!(
            "{} services are named '{}'; using {} and ignoring {:?}",
            matching.len(),
            name,
            matching[0].id,
            ignored
        );
    }

    matching.into_iter().next()
}

fn static_networks(networks: &[Network], names: &[String]) -> MonitoredNetworks {
    let mut ids = BTreeSet::new();
    for name in names {
        let before = ids.len();
        ids.extend(
            networks
                .iter()
                .filter(|network| &network.name == name)
                .map(|network| network.id.clone()),
        );
        if ids.len() == before {
            tracing::warn!("Configured network '{}' does not exist, ignoring", name);
        }
    }

    MonitoredNetworks {
        ids,
        source: NetworkSource::Static,
    }
}
