//! 命令行定义（clap derive）

use clap::{Parser, Subcommand};

/// FUR - Finite User Repository 包管理器
#[derive(Parser, Debug)]
#[command(name = "fur", author, about)]
pub struct Cli {
    /// 注册中心地址，覆盖配置文件和 FUR_REGISTRY
    #[arg(long, global = true)]
    pub registry: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 安装软件包及其依赖
    Install {
        /// 包名，可带版本 (name@version)
        package: String,
    },

    /// 搜索软件包
    Search {
        /// 搜索关键词
        query: String,
    },

    /// 列出所有软件包
    List {
        /// 排序方式（mostDownloads、recentlyUpdated 等）
        #[arg(long)]
        sort: Option<String>,
    },

    /// 查看软件包信息
    Info {
        /// 包名
        package: String,

        /// 指定版本
        #[arg(long)]
        version: Option<String>,
    },
}
