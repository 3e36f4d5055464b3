//! PackageManager 相关数据类型定义

use serde::{Deserialize, Serialize};

/// 不指定具体版本时使用的版本哨兵值
pub const LATEST: &str = "latest";

/// 用户输入的包规格（`name` 或 `name@version`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version: Option<String>,
}

/// 注册中心返回的包元数据，同时也是 `furconfig.json` 的内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub authors: Vec<String>,
    pub homepage: String,
    pub issue_tracker: String,
    pub git: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer: Option<String>,
    pub dependencies: Vec<String>,
}

impl PackageMetadata {
    /// 需要切换到的 git 引用；`latest` 或空版本返回 None
    pub fn pinned_ref(&self) -> Option<&str> {
        let version = self.version.trim();
        if version.is_empty() || version == LATEST {
            None
        } else {
            Some(version)
        }
    }

    /// 安装脚本相对路径，空字符串视为未设置
    pub fn installer_path(&self) -> Option<&str> {
        self.installer.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// 列表 / 搜索接口的响应
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageList {
    pub packages: Vec<String>,
    pub detailed_packages: Vec<PackageMetadata>,
    pub package_count: usize,
}

impl PackageList {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.detailed_packages.is_empty()
    }
}

/// 命令执行结果
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}
