use crate::config::{ConfigLayer, Settings};
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "swarm-sd")]
#[command(about = "Discover Prometheus metrics endpoints in a Docker swarm")]
pub struct CliArgs {
    #[arg(short = 'c', long, env = "SWARM_SD_CONFIG", help = "TOML file with default settings")]
    pub config: Option<PathBuf>,

    #[arg(short = 's', long, env = "SWARM_SD_SERVICE", help = "Name of the prometheus service to detect [default: prometheus]")]
    pub service: Option<String>,

    #[arg(long, env = "SWARM_SD_FALLBACK_NETWORK", help = "Network used when the prometheus service is absent [default: proxy]")]
    pub fallback_network: Option<String>,

    #[arg(long, env = "SWARM_SD_NETWORKS", value_delimiter = ',', help = "Monitor these networks instead of detecting them")]
    pub networks: Vec<String>,

    #[arg(short = 'l', long, env = "SWARM_SD_PORT_LABEL", help = "Service label to look for [default: prometheus.port]")]
    pub label: Option<String>,

    #[arg(short = 'e', long, env = "SWARM_SD_PORT_ENV", help = "Environment variable to look for [default: SERVICE_PORTS]")]
    pub env_name: Option<String>,

    #[arg(long, env = "SWARM_SD_OPT_OUT_LABEL", help = "Label that excludes a service [default: nometrics]")]
    pub opt_out_label: Option<String>,

    #[arg(short = 'o', long, env = "SWARM_SD_OUTPUT", help = "Path to write output JSON to")]
    pub output: Option<PathBuf>,

    #[arg(long, env = "SWARM_SD_INTERVAL", help = "Seconds between refreshes [default: 30]")]
    pub interval: Option<u64>,

    #[arg(long, env = "DOCKER_HOST", help = "Docker Engine API address [default: http://localhost:2375]")]
    pub docker_host: Option<String>,

    #[arg(long, env = "DOCKER_API_VERSION", help = "Pin the Docker API version, e.g. v1.41")]
    pub api_version: Option<String>,

    #[arg(long, env = "SWARM_SD_REQUEST_TIMEOUT", help = "Seconds before a Docker API call times out [default: 10]")]
    pub request_timeout: Option<u64>,

    #[arg(long, env = "SWARM_SD_REQUIRE_ORCHESTRATOR", help = "Exit if Docker is unreachable on the first refresh")]
    pub require_orchestrator: bool,

    #[arg(long, help = "Run a single refresh and exit")]
    pub once: bool,

    #[arg(long, env = "SWARM_SD_LOG_FORMAT", value_enum, help = "Log output format [default: compact]")]
    pub log_format: Option<LogFormat>,

    #[arg(short = 'd', long, env = "SWARM_SD_DEBUG", help = "Enable debug logging")]
    pub debug: bool,
}

impl CliArgs {
    /// Settings given on the command line or through the environment.
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            service: self.service.clone(),
            fallback_network: self.fallback_network.clone(),
            networks: (!self.networks.is_empty()).then(|| self.networks.clone()),
            label: self.label.clone(),
            env_name: self.env_name.clone(),
            opt_out_label: self.opt_out_label.clone(),
            output: self.output.clone(),
            interval: self.interval,
            docker_host: self.docker_host.clone(),
            api_version: self.api_version.clone(),
            request_timeout: self.request_timeout,
            require_orchestrator: self.require_orchestrator.then_some(true),
            log_format: self.log_format,
            debug: self.debug.then_some(true),
        }
    }

    /// Flags and environment first, then the config file, then defaults.
    pub fn settings(&self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => ConfigLayer::from_file(path)?,
            None => ConfigLayer::default(),
        };

        let settings = Settings::from_layer(self.layer().merge(file));
        settings.validate()?;
        Ok(settings)
    }
}
