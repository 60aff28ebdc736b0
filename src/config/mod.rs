#[cfg(feature = "cli")]
pub mod cli;
pub mod file;

use crate::adapters::docker::DEFAULT_DOCKER_HOST;
use crate::core::discovery::DiscoveryRules;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_non_empty_string, validate_output_path, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OUTPUT_PATH: &str = "/etc/prometheus/swarm.d/swarm-endpoints.json";
pub const DEFAULT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// One source of settings. Unset fields defer to the next layer down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub service: Option<String>,
    pub fallback_network: Option<String>,
    pub networks: Option<Vec<String>>,
    pub label: Option<String>,
    pub env_name: Option<String>,
    pub opt_out_label: Option<String>,
    pub output: Option<PathBuf>,
    pub interval: Option<u64>,
    pub docker_host: Option<String>,
    pub api_version: Option<String>,
    pub request_timeout: Option<u64>,
    pub require_orchestrator: Option<bool>,
    pub log_format: Option<LogFormat>,
    pub debug: Option<bool>,
}

impl ConfigLayer {
    /// Fill every unset field from `lower`.
    pub fn merge(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            service: self.service.or(lower.service),
            fallback_network: self.fallback_network.or(lower.fallback_network),
            networks: self.networks.or(lower.networks),
            label: self.label.or(lower.label),
            env_name: self.env_name.or(lower.env_name),
            opt_out_label: self.opt_out_label.or(lower.opt_out_label),
            output: self.output.or(lower.output),
            interval: self.interval.or(lower.interval),
            docker_host: self.docker_host.or(lower.docker_host),
            api_version: self.api_version.or(lower.api_version),
            request_timeout: self.request_timeout.or(lower.request_timeout),
            require_orchestrator: self.require_orchestrator.or(lower.require_orchestrator),
            log_format: self.log_format.or(lower.log_format),
            debug: self.debug.or(lower.debug),
        }
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rules: DiscoveryRules,
    pub output_path: PathBuf,
    pub interval: Duration,
    pub docker_host: String,
    pub api_version: Option<String>,
    pub request_timeout: Duration,
    pub require_orchestrator: bool,
    pub log_format: LogFormat,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::from_layer(ConfigLayer::default())
    }
}

impl Settings {
    pub fn from_layer(layer: ConfigLayer) -> Self {
        let defaults = DiscoveryRules::default();
        let networks = layer
            .networks
            .unwrap_or_default()
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();

        Settings {
            rules: DiscoveryRules {
                sentinel_service: layer.service.unwrap_or(defaults.sentinel_service),
                fallback_network: layer.fallback_network.unwrap_or(defaults.fallback_network),
                static_networks: networks,
                port_label: layer.label.unwrap_or(defaults.port_label),
                port_env: layer.env_name.unwrap_or(defaults.port_env),
                opt_out_label: layer.opt_out_label.unwrap_or(defaults.opt_out_label),
            },
            output_path: layer
                .output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            interval: Duration::from_secs(layer.interval.unwrap_or(DEFAULT_INTERVAL_SECS)),
            docker_host: layer
                .docker_host
                .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string()),
            api_version: layer.api_version.filter(|v| !v.trim().is_empty()),
            request_timeout: Duration::from_secs(
                layer.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            require_orchestrator: layer.require_orchestrator.unwrap_or(false),
            log_format: layer.log_format.unwrap_or_default(),
            debug: layer.debug.unwrap_or(false),
        }
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("service", &self.rules.sentinel_service)?;
        validate_non_empty_string("fallback_network", &self.rules.fallback_network)?;
        validate_non_empty_string("label", &self.rules.port_label)?;
        validate_non_empty_string("env_name", &self.rules.port_env)?;
        validate_non_empty_string("opt_out_label", &self.rules.opt_out_label)?;
        validate_output_path("output", &self.output_path)?;
        validate_range("interval", self.interval.as_secs(), 1, 86_400)?;
        validate_range("request_timeout", self.request_timeout.as_secs(), 1, 300)?;
        validate_url(
            "docker_host",
            &crate::adapters::docker::normalize_host(&self.docker_host),
        )?;
        Ok(())
    }
}
