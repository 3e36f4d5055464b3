//! 版本控制操作（通过 git 命令行）

use super::streaming::run_command;
use crate::error::Result;
use std::path::Path;

/// 包仓库所需的版本控制操作
#[allow(async_fn_in_trait)]
pub trait Vcs {
    async fn clone_repo(&self, url: &str, target: &Path) -> Result<()>;
    async fn fetch_all(&self, repo: &Path) -> Result<()>;
    async fn checkout(&self, repo: &Path, reference: &str) -> Result<()>;
    async fn pull(&self, repo: &Path) -> Result<()>;
}

/// 调用系统 `git` 的实现
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCli {
    async fn git(&self, cwd: Option<&Path>, args: &[&str]) -> Result<()> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        run_command(&self.program, &args, cwd, false).await?;
        Ok(())
    }
}

impl Vcs for GitCli {
    async fn clone_repo(&self, url: &str, target: &Path) -> Result<()> {
        let target = target.to_string_lossy();
        self.git(None, &["clone", url, target.as_ref()]).await
    }

    async fn fetch_all(&self, repo: &Path) -> Result<()> {
        self.git(Some(repo), &["fetch", "--all", "--tags"]).await
    }

    async fn checkout(&self, repo: &Path, reference: &str) -> Result<()> {
        self.git(Some(repo), &["checkout", reference]).await
    }

    async fn pull(&self, repo: &Path) -> Result<()> {
        self.git(Some(repo), &["pull"]).await
    }
}
