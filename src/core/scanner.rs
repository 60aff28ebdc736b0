use crate::core::discovery::DiscoveryRules;
use crate::domain::model::{MonitoredNetworks, Service};

/// Services attached to a monitored network, minus the sentinel itself and
/// anything carrying the opt-out label. Input order is preserved.
pub fn scan_services<'a>(
    services: &'a [Service],
    monitored: &MonitoredNetworks,
    rules: &DiscoveryRules,
) -> Vec<&'a Service> {
    services
        .iter()
        .filter(|service| {
            if !monitored.intersects(&service.networks) {
                return false;
            }

            // The collector scrapes itself
            if service.name == rules.sentinel_service {
                return false;
            }

            if service.has_label(&rules.opt_out_label) {
                tracing::debug!(
                    "Service '{}' has a '{}' label, skipping",
                    service.name,
                    rules.opt_out_label
                );
                return false;
            }

            true
        })
        .collect()
}
