mod cli;
mod config;
mod console;
mod error;
mod package_manager;
mod registry;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use console::ConsoleSink;
use error::FurError;
use package_manager::{GitCli, PackageManager, PackageStore};
use registry::{Registry, RegistryClient};

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("错误: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // 仓库地址优先级：命令行 > 环境变量 > 配置文件
    let mut config = config::Config::load_or_default().context("加载配置失败")?;
    if let Some(registry) = &cli.registry {
        config.override_repositories(registry);
    }
    log::debug!("配置: {:?}", config);

    let registry = RegistryClient::new(config.repositories.clone(), config.timeout())?;

    match cli.command {
        Commands::Install { package } => {
            let store = PackageStore::new(&config.packages_dir, GitCli::default())
                .with_context(|| format!("无法创建包目录 {}", config.packages_dir.display()))?;
            let manager = PackageManager::new(registry, store);
            // 失败信息已经通过事件输出
            match manager.install(&package, &ConsoleSink).await {
                Ok(meta) => log::info!(
                    "已安装到 {}",
                    manager.store().package_dir(&meta.name).display()
                ),
                Err(_) => std::process::exit(1),
            }
        }
        Commands::Search { query } => {
            println!("正在搜索 '{}'...", query);
            let results = registry.search(&query).await?;
            console::print_search_results(&results);
        }
        Commands::List { sort } => {
            println!("正在获取软件包列表...");
            let results = registry.list(sort.as_deref()).await?;
            console::print_package_list(&results);
        }
        Commands::Info { package, version } => {
            println!("正在获取 {} 的信息...", package);
            let meta = registry
                .fetch_metadata(&package, version.as_deref())
                .await?
                .ok_or(FurError::NotFound {
                    name: package,
                    version,
                })?;
            console::print_package_info(&meta);
        }
    }

    Ok(())
}
