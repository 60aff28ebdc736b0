use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

fn filter(debug: bool) -> EnvFilter {
    let default = if debug { "swarm_sd=debug,info" } else { "swarm_sd=info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Event-only output; targets and source positions add nothing for a single binary.
fn events<S>() -> fmt::Layer<S> {
    fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

pub fn init_logger(format: LogFormat, debug: bool) {
    // JSON for log shippers sitting next to the swarm
    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter(debug))
        .with((!json).then(|| events().compact()))
        .with(json.then(|| events().json()))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_config_value() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            format: LogFormat,
        }

        let parsed: Wrapper = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(parsed.format, LogFormat::Json);
        assert_eq!(LogFormat::default(), LogFormat::Compact);
    }
}
