use crate::core::discovery::DiscoveryRules;
use crate::domain::model::Service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSource {
    Label,
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither the label nor the environment variable is set.
    NoHint,
    /// The environment variable is declared more than once.
    AmbiguousEnvironment,
    /// A hint exists but does not hold a usable port.
    InvalidHint { value: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoHint => write!(f, "no port label or environment variable"),
            SkipReason::AmbiguousEnvironment => write!(f, "port variable declared more than once"),
            SkipReason::InvalidHint { value } => write!(f, "'{}' is not a valid port", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortResolution {
    Resolved { port: u16, source: PortSource },
    Skip(SkipReason),
}

/// Parse a port in `1..=65535`, ignoring surrounding whitespace.
pub fn parse_port(value: &str) -> Option<u16> {
    match value.trim().parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

/// Only the first entry of a comma-separated list is honoured.
pub fn parse_port_list(value: &str) -> Option<u16> {
    value.split(',').next().and_then(parse_port)
}

/// Label first, then the environment variable; an invalid label falls through.
pub fn resolve_port(service: &Service, rules: &DiscoveryRules) -> PortResolution {
    let mut invalid = None;

    if let Some(value) = service.label(&rules.port_label) {
        match parse_port(value) {
            Some(port) => {
                return PortResolution::Resolved {
                    port,
                    source: PortSource::Label,
                }
            }
            None => invalid = Some(value.to_string()),
        }
    }

    let declarations = service.env_values(&rules.port_env).count();
    if declarations > 1 {
        return PortResolution::Skip(SkipReason::AmbiguousEnvironment);
    }

    if let Some(value) = service.env_var(&rules.port_env) {
        match parse_port_list(value) {
            Some(port) => {
                return PortResolution::Resolved {
                    port,
                    source: PortSource::Environment,
                }
            }
            None => invalid = Some(value.to_string()),
        }
    }

    match invalid {
        Some(value) => PortResolution::Skip(SkipReason::InvalidHint { value }),
        None => PortResolution::Skip(SkipReason::NoHint),
    }
}
