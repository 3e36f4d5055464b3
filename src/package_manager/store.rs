//! 本地包目录：克隆或更新仓库、运行安装脚本、保存 furconfig.json

use super::events::{EventSink, InstallEvent};
use super::git::Vcs;
use super::script::{run_script, HostPlatform, ScriptRun};
use super::types::PackageMetadata;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// 包目录中保存元数据快照的文件名
pub const METADATA_FILE: &str = "furconfig.json";

/// 判断包是否已安装的版本控制标记
const VCS_MARKER: &str = ".git";

pub struct PackageStore<V> {
    root: PathBuf,
    vcs: V,
    host: HostPlatform,
}

impl<V: Vcs> PackageStore<V> {
    pub fn new(root: impl Into<PathBuf>, vcs: V) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            vcs,
            host: HostPlatform::current(),
        })
    }

    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// 目录存在且带有 `.git` 即视为已安装
    pub fn is_installed(&self, name: &str) -> bool {
        self.package_dir(name).join(VCS_MARKER).exists()
    }

    /// 读取已安装包的 furconfig.json
    pub async fn installed_metadata(&self, name: &str) -> Result<Option<PackageMetadata>> {
        let path = self.package_dir(name).join(METADATA_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 克隆或更新包目录，运行安装脚本，最后写入元数据
    pub async fn materialize_and_install(
        &self,
        meta: &PackageMetadata,
        events: &dyn EventSink,
    ) -> Result<()> {
        let dir = self.package_dir(&meta.name);

        if self.is_installed(&meta.name) {
            self.update(meta, &dir, events).await?;
        } else {
            self.clone_new(meta, &dir, events).await?;
        }

        self.run_installer(meta, &dir, events).await?;
        self.write_metadata(meta, &dir).await
    }

    async fn update(&self, meta: &PackageMetadata, dir: &Path, events: &dyn EventSink) -> Result<()> {
        events.emit(InstallEvent::Updating {
            name: meta.name.clone(),
            path: dir.to_path_buf(),
        });

        match self.installed_metadata(&meta.name).await {
            Ok(Some(previous)) => {
                log::info!("{}: {} -> {}", meta.name, previous.version, meta.version)
            }
            Ok(None) => {}
            Err(e) => log::debug!("{}: 读取旧的 {} 失败: {}", meta.name, METADATA_FILE, e),
        }

        self.vcs.fetch_all(dir).await?;

        if let Some(reference) = meta.pinned_ref() {
            self.switch_with_fallback(meta, dir, reference, events).await;
        }

        // 检出 tag 后处于分离头指针状态，pull 失败是预期内的
        if let Err(e) = self.vcs.pull(dir).await {
            log::debug!("{}: git pull 失败，忽略: {}", meta.name, e);
        }
        Ok(())
    }

    /// 依次尝试 `<ref>`、`origin/<ref>`，都失败则保持当前检出
    async fn switch_with_fallback(
        &self,
        meta: &PackageMetadata,
        dir: &Path,
        reference: &str,
        events: &dyn EventSink,
    ) {
        let Err(e) = self.vcs.checkout(dir, reference).await else {
            return;
        };
        log::debug!("{}: 检出 {} 失败，尝试远程分支: {}", meta.name, reference, e);

        let remote = format!("origin/{}", reference);
        if let Err(e) = self.vcs.checkout(dir, &remote).await {
            events.emit(InstallEvent::Warning {
                name: meta.name.clone(),
                message: format!("找不到版本 {}，保持当前检出 ({})", reference, e),
            });
        }
    }

    async fn clone_new(&self, meta: &PackageMetadata, dir: &Path, events: &dyn EventSink) -> Result<()> {
        events.emit(InstallEvent::Cloning {
            name: meta.name.clone(),
            url: meta.git.clone(),
        });

        tokio::fs::create_dir_all(&self.root).await?;
        self.vcs.clone_repo(&meta.git, dir).await?;

        if let Some(reference) = meta.pinned_ref() {
            if let Err(e) = self.vcs.checkout(dir, reference).await {
                events.emit(InstallEvent::Warning {
                    name: meta.name.clone(),
                    message: format!("找不到版本 {}，使用默认分支 ({})", reference, e),
                });
            }
        }
        Ok(())
    }

    async fn run_installer(&self, meta: &PackageMetadata, dir: &Path, events: &dyn EventSink) -> Result<()> {
        let Some(relative) = meta.installer_path() else {
            return Ok(());
        };

        let Some(script) = resolve_inside(dir, relative).await else {
            events.emit(InstallEvent::Warning {
                name: meta.name.clone(),
                message: format!("安装脚本 {} 不存在，跳过", relative),
            });
            return Ok(());
        };

        events.emit(InstallEvent::RunningInstaller {
            name: meta.name.clone(),
            script: relative.to_string(),
        });

        if let ScriptRun::Unsupported(reason) = run_script(&script, dir, self.host).await? {
            events.emit(InstallEvent::Warning {
                name: meta.name.clone(),
                message: format!("{}，未运行安装脚本，安装可能不完整", reason),
            });
        }
        Ok(())
    }

    async fn write_metadata(&self, meta: &PackageMetadata, dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(meta)?;
        tokio::fs::write(dir.join(METADATA_FILE), json).await?;
        Ok(())
    }
}

/// 解析包目录内的脚本路径；不存在或越出包目录时返回 None。
///
/// 返回绝对路径：脚本在包目录下运行，相对的包根目录会让相对路径失效。
async fn resolve_inside(dir: &Path, relative: &str) -> Option<PathBuf> {
    let base = tokio::fs::canonicalize(dir).await.ok()?;
    let resolved = tokio::fs::canonicalize(dir.join(relative)).await.ok()?;
    if resolved.starts_with(&base) && resolved.is_file() {
        Some(resolved)
    } else {
        None
    }
}
