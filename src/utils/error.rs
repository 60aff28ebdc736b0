use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdError {
    #[error("Orchestrator unreachable: {message}")]
    Transport { message: String },

    #[error("Orchestrator API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to write target file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Orchestrator,
    Filesystem,
    Configuration,
}

impl SdError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SdError::Transport { .. } | SdError::Api { .. } => ErrorCategory::Orchestrator,
            SdError::Write { .. } | SdError::Serialization(_) => ErrorCategory::Filesystem,
            SdError::Config { .. } | SdError::InvalidConfigValue { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    /// Steady-state failures that the next refresh is expected to heal.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Configuration)
    }
}

impl From<reqwest::Error> for SdError {
    fn from(err: reqwest::Error) -> Self {
        // 解碼失敗代表回應格式錯誤，其餘視為連線問題
        if err.is_decode() {
            SdError::Api {
                status: err.status().map(|s| s.as_u16()).unwrap_or(200),
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            SdError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            SdError::Transport {
                message: err.to_string(),
            }
        }
    }
}

impl From<toml::de::Error> for SdError {
    fn from(err: toml::de::Error) -> Self {
        SdError::Config {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_errors_are_retryable() {
        let err = SdError::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Orchestrator);
        assert!(err.is_retryable());

        let err = SdError::Api {
            status: 503,
            message: "node is not a swarm manager".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_config_errors_are_fatal() {
        let err = SdError::InvalidConfigValue {
            field: "interval".to_string(),
            value: "0".to_string(),
            reason: "Value must be between 1 and 86400".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_write_error_names_path() {
        let err = SdError::Write {
            path: PathBuf::from("/etc/prometheus/swarm.d/targets.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/etc/prometheus/swarm.d/targets.json"));
        assert_eq!(err.category(), ErrorCategory::Filesystem);
    }
}
