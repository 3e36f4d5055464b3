//! 终端输出：安装事件与查询结果

use crate::package_manager::{EventSink, InstallEvent, PackageList, PackageMetadata};
use crossterm::style::{Color, Stylize};

/// 粉色 (MTF flag)
const PINK: Color = Color::Rgb { r: 245, g: 169, b: 184 };
/// 蓝色 (MTF flag)
const BLUE: Color = Color::Rgb { r: 91, g: 206, b: 250 };
/// 暗灰色（次要信息）
const DIM: Color = Color::Rgb { r: 130, g: 130, b: 140 };

/// 把安装事件打印到终端；进度走 stdout，警告和错误走 stderr
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: InstallEvent) {
        log::debug!("{:?}", event);
        match event {
            InstallEvent::Started { name } => {
                println!("{} {}...", "正在安装".with(BLUE).bold(), name)
            }
            InstallEvent::Dependency { parent, spec } => {
                println!("  {} {} {}", "依赖".with(DIM), spec, format!("({})", parent).with(DIM))
            }
            InstallEvent::Cloning { name, url } => {
                println!("  {} {} {}", "克隆".with(BLUE), name, url.with(DIM))
            }
            InstallEvent::Updating { name, path } => {
                println!("  {} {} {}", "更新".with(BLUE), name, path.display().to_string().with(DIM))
            }
            InstallEvent::RunningInstaller { name, script } => {
                println!("  {} {} ({})", "运行安装脚本".with(PINK), script, name)
            }
            InstallEvent::Succeeded { name, version } => {
                println!("{} {} v{}", "✓ 安装成功".green().bold(), name, version)
            }
            InstallEvent::NotFound { name } => {
                eprintln!("{} 未找到软件包 '{}'", "✗".red().bold(), name)
            }
            InstallEvent::Warning { name, message } => {
                eprintln!("{} {}: {}", "⚠".yellow().bold(), name, message)
            }
            InstallEvent::Failed { name, message } => {
                eprintln!("{} {} 安装失败: {}", "✗".red().bold(), name, message)
            }
        }
    }
}

fn print_detailed(package: &PackageMetadata) {
    println!("\n📦 {} v{}", package.name.as_str().with(PINK).bold(), package.version);
    if !package.description.is_empty() {
        println!("   描述: {}", package.description);
    }
    if !package.authors.is_empty() {
        println!("   作者: {}", package.authors.join(", "));
    }
    if !package.dependencies.is_empty() {
        println!("   依赖: {}", package.dependencies.join(", "));
    }
    if !package.homepage.is_empty() {
        println!("   主页: {}", package.homepage.as_str().with(BLUE));
    }
}

/// 打印搜索结果；有详细信息时逐个展示，否则只列包名
pub fn print_search_results(results: &PackageList) {
    if results.is_empty() {
        println!("没有找到软件包。");
        return;
    }

    println!("找到 {} 个软件包:", results.package_count);
    if results.detailed_packages.is_empty() {
        for package in &results.packages {
            println!("  - {}", package);
        }
    } else {
        for package in &results.detailed_packages {
            print_detailed(package);
        }
    }
}

pub fn print_package_list(results: &PackageList) {
    if results.packages.is_empty() {
        println!("没有可用的软件包。");
        return;
    }

    println!("可用软件包（共 {} 个）:", results.package_count);
    for package in &results.packages {
        println!("  - {}", package);
    }
}

pub fn print_package_info(package: &PackageMetadata) {
    println!("名称: {}", package.name.as_str().with(PINK).bold());
    println!("版本: {}", package.version);
    if !package.description.is_empty() {
        println!("描述: {}", package.description);
    }
    println!("作者: {}", package.authors.join(", "));
    println!("主页: {}", package.homepage);
    println!("问题反馈: {}", package.issue_tracker);
    println!("Git: {}", package.git);
    println!("安装脚本: {}", package.installer_path().unwrap_or("-"));
    println!("依赖: {}", package.dependencies.join(", "));
}
