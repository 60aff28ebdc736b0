use crate::config::ConfigLayer;
use crate::utils::error::{Result, SdError};
use std::fs;
use std::path::Path;

impl ConfigLayer {
    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SdError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        tracing::debug!("Loaded config file {}", path.display());
        Self::from_toml_str(&content)
    }
}
