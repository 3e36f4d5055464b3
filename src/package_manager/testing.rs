//! 测试用的假注册中心、假 git 和事件记录器

use super::events::{EventSink, InstallEvent};
use super::git::Vcs;
use super::types::PackageMetadata;
use crate::error::{FurError, Result};
use crate::registry::Registry;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

fn repo_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn git_error(command: String) -> FurError {
    FurError::CommandFailed {
        command,
        detail: "simulated failure".to_string(),
    }
}

/// 记录调用顺序的 git 替身；克隆时创建 `.git` 并写入预设文件
#[derive(Clone, Default)]
pub struct FakeVcs {
    trace: Arc<Mutex<Vec<String>>>,
    missing_refs: HashSet<String>,
    failing_clones: HashSet<String>,
    failing_pull: bool,
    files: Vec<(String, String)>,
}

impl FakeVcs {
    pub fn with_missing_refs(mut self, refs: &[&str]) -> Self {
        self.missing_refs.extend(refs.iter().map(|r| r.to_string()));
        self
    }

    pub fn with_failing_clone(mut self, name: &str) -> Self {
        self.failing_clones.insert(name.to_string());
        self
    }

    pub fn with_failing_pull(mut self) -> Self {
        self.failing_pull = true;
        self
    }

    pub fn with_file(mut self, relative: &str, content: &str) -> Self {
        self.files.push((relative.to_string(), content.to_string()));
        self
    }

    pub fn trace(&self) -> Vec<String> {
        self.trace.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.trace.lock().unwrap().push(entry);
    }
}

impl Vcs for FakeVcs {
    async fn clone_repo(&self, _url: &str, target: &Path) -> Result<()> {
        let name = repo_name(target);
        self.record(format!("clone {}", name));
        if self.failing_clones.contains(&name) {
            return Err(git_error(format!("git clone {}", name)));
        }
        std::fs::create_dir_all(target.join(".git"))?;
        for (relative, content) in &self.files {
            std::fs::write(target.join(relative), content)?;
        }
        Ok(())
    }

    async fn fetch_all(&self, repo: &Path) -> Result<()> {
        self.record(format!("fetch {}", repo_name(repo)));
        Ok(())
    }

    async fn checkout(&self, repo: &Path, reference: &str) -> Result<()> {
        self.record(format!("checkout {} {}", repo_name(repo), reference));
        if self.missing_refs.contains(reference) {
            return Err(git_error(format!("git checkout {}", reference)));
        }
        Ok(())
    }

    async fn pull(&self, repo: &Path) -> Result<()> {
        self.record(format!("pull {}", repo_name(repo)));
        if self.failing_pull {
            return Err(git_error("git pull".to_string()));
        }
        Ok(())
    }
}

/// 内存中的注册中心
#[derive(Default)]
pub struct FakeRegistry {
    packages: HashMap<String, PackageMetadata>,
    downloads: Mutex<Vec<String>>,
    failing_downloads: bool,
}

impl FakeRegistry {
    pub fn with_package(mut self, name: &str, version: &str, dependencies: &[&str]) -> Self {
        let meta = PackageMetadata {
            name: name.to_string(),
            version: version.to_string(),
            git: format!("https://example.org/{}.git", name),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        };
        self.packages.insert(name.to_string(), meta);
        self
    }

    pub fn with_installer(mut self, name: &str, installer: &str) -> Self {
        if let Some(meta) = self.packages.get_mut(name) {
            meta.installer = Some(installer.to_string());
        }
        self
    }

    pub fn with_failing_downloads(mut self) -> Self {
        self.failing_downloads = true;
        self
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

impl Registry for FakeRegistry {
    async fn fetch_metadata(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<Option<PackageMetadata>> {
        Ok(self
            .packages
            .get(name)
            .filter(|meta| version.map_or(true, |v| v == meta.version))
            .cloned())
    }

    async fn report_download(&self, name: &str) -> Result<()> {
        self.downloads.lock().unwrap().push(name.to_string());
        if self.failing_downloads {
            return Err(FurError::CommandFailed {
                command: "report download".to_string(),
                detail: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<InstallEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<InstallEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                InstallEvent::Warning { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: InstallEvent) {
        self.events.lock().unwrap().push(event);
    }
}
