//! 错误类型定义

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FurError>;

#[derive(Debug, Error)]
pub enum FurError {
    #[error("未找到软件包 '{}'", display_spec(.name, .version.as_deref()))]
    NotFound {
        name: String,
        version: Option<String>,
    },

    #[error("网络错误 ({url}): {source}\n请确认 FUR 注册中心可以访问")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("注册中心返回 {status} ({url})")]
    Registry {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("无法启动命令 '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("命令执行失败 ({command}): {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("检测到循环依赖: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    #[error("依赖 '{name}' 安装失败: {source}")]
    Dependency {
        name: String,
        #[source]
        source: Box<FurError>,
    },

    #[error("读取配置文件 {path} 失败: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("未配置任何注册中心仓库")]
    NoRepository,

    #[error("无法定位用户主目录")]
    NoHomeDir,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn display_spec(name: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{}@{}", name, v),
        None => name.to_string(),
    }
}
