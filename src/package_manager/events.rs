//! 安装进度事件

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    /// 开始安装某个包
    Started { name: String },
    /// 开始安装 `parent` 的依赖
    Dependency { parent: String, spec: String },
    Cloning { name: String, url: String },
    Updating { name: String, path: PathBuf },
    RunningInstaller { name: String, script: String },
    Succeeded { name: String, version: String },
    NotFound { name: String },
    Warning { name: String, message: String },
    Failed { name: String, message: String },
}

/// 安装进度的接收方，与终端展示解耦
pub trait EventSink {
    fn emit(&self, event: InstallEvent);
}

