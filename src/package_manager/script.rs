//! 安装脚本的解释器选择与执行

use super::parser::parse_shebang;
use super::streaming::run_command;
use crate::error::{FurError, Result};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

/// 运行安装脚本的主机平台
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    Unix,
}

impl HostPlatform {
    pub fn current() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else {
            HostPlatform::Unix
        }
    }

    fn python(self) -> &'static str {
        match self {
            HostPlatform::Windows => "python",
            HostPlatform::Unix => "python3",
        }
    }

    fn powershell(self) -> &'static str {
        match self {
            HostPlatform::Windows => "powershell",
            HostPlatform::Unix => "pwsh",
        }
    }
}

const SHELL: &str = "bash";

/// 解释器选择结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpreter {
    /// 用 `program args...` 运行
    Command { program: String, args: Vec<String> },
    /// 没有可用的 shebang：先 `chmod +x` 再直接执行脚本
    MarkExecutable,
    /// 当前平台无法运行，附带原因
    Unsupported(String),
}

impl Interpreter {
    fn command(program: impl Into<String>, args: Vec<String>) -> Self {
        Interpreter::Command {
            program: program.into(),
            args,
        }
    }
}

/// 脚本执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptRun {
    Completed,
    Unsupported(String),
}

/// 根据扩展名、shebang 指令和平台选择解释器。
///
/// `exists` 用于判断 shebang 中的绝对路径是否存在。
pub fn select_interpreter(
    script: &Path,
    extension: Option<&str>,
    shebang: Option<&str>,
    host: HostPlatform,
    exists: &dyn Fn(&Path) -> bool,
) -> Interpreter {
    let path = script.to_string_lossy().to_string();
    let windows = host == HostPlatform::Windows;

    match extension.map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("sh") => Interpreter::command(SHELL, vec![path]),
        Some("ps1") => Interpreter::command(
            host.powershell(),
            vec![
                "-ExecutionPolicy".into(),
                "Bypass".into(),
                "-File".into(),
                path,
            ],
        ),
        Some("py") => Interpreter::command(host.python(), vec![path]),
        Some("js") => Interpreter::command("node", vec![path]),
        Some("rb") => Interpreter::command("ruby", vec![path]),
        Some("cmd" | "bat") if windows => {
            Interpreter::command("cmd", vec!["/C".into(), path])
        }
        Some("exe") if windows => Interpreter::command(path, Vec::new()),
        Some(ext) => Interpreter::Unsupported(format!("不支持的安装脚本类型: .{}", ext)),
        None => select_by_shebang(path, shebang, host, exists),
    }
}

fn select_by_shebang(
    path: String,
    shebang: Option<&str>,
    host: HostPlatform,
    exists: &dyn Fn(&Path) -> bool,
) -> Interpreter {
    if let Some(directive) = shebang {
        if directive.contains("bash") || directive.contains("sh") {
            return Interpreter::command(SHELL, vec![path]);
        }
        if directive.contains("python") {
            return Interpreter::command(host.python(), vec![path]);
        }
        if directive.contains("node") {
            return Interpreter::command("node", vec![path]);
        }
        if directive.contains("ruby") {
            return Interpreter::command("ruby", vec![path]);
        }

        let mut tokens = directive.split_whitespace();
        if let Some(program) = tokens.next() {
            let program_path = PathBuf::from(program);
            if program_path.is_absolute() && exists(&program_path) {
                let mut args: Vec<String> = tokens.map(String::from).collect();
                args.push(path);
                return Interpreter::command(program, args);
            }
        }
    }

    match host {
        HostPlatform::Windows => {
            Interpreter::Unsupported("Windows 上无法运行没有扩展名的安装脚本".to_string())
        }
        HostPlatform::Unix => Interpreter::MarkExecutable,
    }
}

/// 读取脚本首行的 shebang 指令，读取失败按没有 shebang 处理
async fn read_shebang(script: &Path) -> Option<String> {
    let first_line = match read_first_line(script).await {
        Ok(line) => line,
        Err(e) => {
            log::debug!("读取 {} 首行失败: {}", script.display(), e);
            return None;
        }
    };
    parse_shebang(&first_line).map(String::from)
}

async fn read_first_line(script: &Path) -> std::io::Result<String> {
    let file = tokio::fs::File::open(script).await?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line).await?;
    Ok(line)
}

/// 为脚本路径选择解释器（无扩展名时读取 shebang）
pub async fn resolve_interpreter(script: &Path, host: HostPlatform) -> Interpreter {
    let extension = script.extension().map(|e| e.to_string_lossy().to_string());
    let shebang = match extension {
        Some(_) => None,
        None => read_shebang(script).await,
    };
    select_interpreter(
        script,
        extension.as_deref(),
        shebang.as_deref(),
        host,
        &|p: &Path| p.exists(),
    )
}

/// 运行安装脚本，输出实时转发到终端
pub async fn run_script(script: &Path, workdir: &Path, host: HostPlatform) -> Result<ScriptRun> {
    match resolve_interpreter(script, host).await {
        Interpreter::Command { program, args } => {
            run_command(&program, &args, Some(workdir), true).await?;
        }
        Interpreter::MarkExecutable => run_directly(script, workdir).await?,
        Interpreter::Unsupported(reason) => return Ok(ScriptRun::Unsupported(reason)),
    }
    Ok(ScriptRun::Completed)
}

/// `chmod +x` 后直接执行；标记失败或内核拒绝执行时交给 shell
async fn run_directly(script: &Path, workdir: &Path) -> Result<()> {
    let path = script.to_string_lossy().to_string();

    if let Err(e) = run_command("chmod", &["+x".to_string(), path.clone()], None, false).await {
        log::warn!("chmod +x {} 失败，改用 {} 执行: {}", path, SHELL, e);
        return run_with_shell(path, workdir).await;
    }

    match run_command(&path, &[], Some(workdir), true).await {
        Ok(_) => Ok(()),
        // 没有 shebang 的文本脚本无法 exec
        Err(FurError::Spawn { source, .. }) if is_exec_format_error(&source) => {
            log::debug!("{} 不是可执行格式，改用 {} 执行", path, SHELL);
            run_with_shell(path, workdir).await
        }
        Err(e) => Err(e),
    }
}

async fn run_with_shell(path: String, workdir: &Path) -> Result<()> {
    run_command(SHELL, &[path], Some(workdir), true).await?;
    Ok(())
}

#[cfg(unix)]
fn is_exec_format_error(error: &std::io::Error) -> bool {
    error.raw_os_error() == Some(libc::ENOEXEC)
}

#[cfg(not(unix))]
fn is_exec_format_error(_: &std::io::Error) -> bool {
    false
}
