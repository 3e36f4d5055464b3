use crate::error::{FurError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REPOSITORY: &str = "http://testing.finite.ovh:8080";

/// 覆盖注册中心地址的环境变量（多个地址用逗号分隔）
pub const REGISTRY_ENV: &str = "FUR_REGISTRY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub repositories: Vec<String>,
    pub packages_dir: PathBuf,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            repositories: vec![DEFAULT_REPOSITORY.to_string()],
            packages_dir: home.join(".fur").join("packages"),
            timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn load_or_default() -> Result<Self> {
        let home = dirs::home_dir().ok_or(FurError::NoHomeDir)?;
        let config_path = home.join(".config").join("fur").join("config.toml");

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| FurError::Config {
                path: config_path.clone(),
                reason: e.to_string(),
            })?
        } else {
            Self::default()
        };

        if let Ok(value) = std::env::var(REGISTRY_ENV) {
            config.override_repositories(&value);
        }
        Ok(config)
    }

    /// 用逗号分隔的地址列表替换仓库列表，空列表时保持不变
    pub fn override_repositories(&mut self, value: &str) {
        let repositories: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
            .collect();
        if !repositories.is_empty() {
            self.repositories = repositories;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
