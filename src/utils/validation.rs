use crate::utils::error::{Result, SdError};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> SdError {
    SdError::InvalidConfigValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// An HTTP(S) endpoint with a host, such as the Docker Engine API address.
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.trim().is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme '{}', expected http, https or tcp", url.scheme()),
        ));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid(field_name, url_str, "URL has no host"));
    }

    Ok(())
}

/// The target file is replaced by rename, so the path must name a file.
pub fn validate_output_path(field_name: &str, path: &Path) -> Result<()> {
    let display = path.display().to_string();

    let reason = if display.is_empty() {
        "Path cannot be empty"
    } else if display.contains('\0') {
        "Path contains null bytes"
    } else if path.file_name().is_none() {
        "Path must name a file, not a directory"
    } else {
        return Ok(());
    };

    Err(invalid(field_name, display, reason))
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("docker_host", "http://localhost:2375").is_ok());
        assert!(validate_url("docker_host", "https://swarm.internal:2376").is_ok());
        assert!(validate_url("docker_host", "").is_err());
        assert!(validate_url("docker_host", "invalid-url").is_err());
        assert!(validate_url("docker_host", "unix:///var/run/docker.sock").is_err());
        assert!(validate_url("docker_host", "http://").is_err());
    }

    #[test]
    fn test_invalid_value_names_field() {
        let err = validate_url("docker_host", "ftp://swarm:21").unwrap_err();
        match err {
            SdError::InvalidConfigValue { field, value, reason } => {
                assert_eq!(field, "docker_host");
                assert_eq!(value, "ftp://swarm:21");
                assert!(reason.contains("ftp"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_output_path() {
        assert!(validate_output_path("output", Path::new("/etc/prometheus/swarm.d/t.json")).is_ok());
        assert!(validate_output_path("output", Path::new("")).is_err());
        assert!(validate_output_path("output", Path::new("/")).is_err());
        assert!(validate_output_path("output", Path::new("swarm.d/..")).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("interval", 30u64, 1, 86_400).is_ok());
        assert!(validate_range("interval", 0u64, 1, 86_400).is_err());
        assert!(validate_range("interval", 86_401u64, 1, 86_400).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("service", "prometheus").is_ok());
        assert!(validate_non_empty_string("service", "   ").is_err());
    }
}
