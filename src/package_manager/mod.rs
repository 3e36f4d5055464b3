//! 包管理器模块：递归安装依赖，克隆或更新包仓库，运行安装脚本

pub mod events;
pub mod git;
pub mod parser;
pub mod script;
pub mod store;
pub mod streaming;
pub mod types;

#[cfg(test)]
pub mod testing;

// 重新导出常用类型和函数
pub use events::{EventSink, InstallEvent};
pub use git::{GitCli, Vcs};
pub use parser::parse_package_spec;
pub use store::PackageStore;
pub use types::{PackageList, PackageMetadata, PackageSpec};

use crate::error::{FurError, Result};
use crate::registry::Registry;
use std::future::Future;
use std::pin::Pin;

type InstallFuture<'a> = Pin<Box<dyn Future<Output = Result<PackageMetadata>> + 'a>>;

pub struct PackageManager<R, V> {
    registry: R,
    store: PackageStore<V>,
}

impl<R: Registry, V: Vcs> PackageManager<R, V> {
    pub fn new(registry: R, store: PackageStore<V>) -> Self {
        Self { registry, store }
    }

    pub fn store(&self) -> &PackageStore<V> {
        &self.store
    }

    /// 安装 `name` 或 `name@version`，依赖先于包本身按声明顺序安装。
    ///
    /// 已经完成的依赖在后续失败时不会回滚。
    pub async fn install(&self, spec: &str, events: &dyn EventSink) -> Result<PackageMetadata> {
        let mut in_progress = Vec::new();
        let result = self.install_recursive(spec, &mut in_progress, events).await;
        if let Err(e) = &result {
            events.emit(InstallEvent::Failed {
                name: parse_package_spec(spec).name,
                message: e.to_string(),
            });
        }
        result
    }

    /// `in_progress` 是当前递归链上的包名，用于发现循环依赖
    fn install_recursive<'a>(
        &'a self,
        spec: &'a str,
        in_progress: &'a mut Vec<String>,
        events: &'a dyn EventSink,
    ) -> InstallFuture<'a> {
        Box::pin(async move {
            let PackageSpec { name, version } = parse_package_spec(spec);

            if in_progress.contains(&name) {
                let mut chain = in_progress.clone();
                chain.push(name);
                return Err(FurError::CircularDependency { chain });
            }

            events.emit(InstallEvent::Started { name: name.clone() });

            if name.is_empty() {
                events.emit(InstallEvent::NotFound { name: name.clone() });
                return Err(FurError::NotFound { name, version });
            }

            let meta = match self.registry.fetch_metadata(&name, version.as_deref()).await? {
                Some(meta) => meta,
                None => {
                    events.emit(InstallEvent::NotFound { name: name.clone() });
                    return Err(FurError::NotFound { name, version });
                }
            };

            in_progress.push(name);
            let installed = self.install_resolved(&meta, in_progress, events).await;
            in_progress.pop();
            installed?;

            // 下载统计失败不影响安装结果
            if let Err(e) = self.registry.report_download(&meta.name).await {
                log::debug!("{}: 上报下载失败，忽略: {}", meta.name, e);
            }

            events.emit(InstallEvent::Succeeded {
                name: meta.name.clone(),
                version: meta.version.clone(),
            });
            Ok(meta)
        })
    }

    async fn install_resolved(
        &self,
        meta: &PackageMetadata,
        in_progress: &mut Vec<String>,
        events: &dyn EventSink,
    ) -> Result<()> {
        for dependency in &meta.dependencies {
            events.emit(InstallEvent::Dependency {
                parent: meta.name.clone(),
                spec: dependency.clone(),
            });
            self.install_recursive(dependency, in_progress, events)
                .await
                .map_err(|e| dependency_error(dependency, e))?;
        }

        self.store.materialize_and_install(meta, events).await
    }
}

/// 只包装最内层的失败，保留真正出错的依赖名
fn dependency_error(spec: &str, error: FurError) -> FurError {
    match error {
        FurError::Dependency { .. } | FurError::CircularDependency { .. } => error,
        other => FurError::Dependency {
            name: spec.to_string(),
            source: Box::new(other),
        },
    }
}
