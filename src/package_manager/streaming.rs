//! 子进程执行（git / 安装脚本），可选流式输出

use super::parser::clean_terminal_output;
use super::types::CommandOutput;
use crate::error::{FurError, Result};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

#[derive(Debug, Clone, Copy)]
enum Target {
    Stdout,
    Stderr,
}

/// 从管道中逐行读取并写到父进程对应的输出流，返回读到的全部内容
async fn read_stream_lines(stream: Option<impl AsyncRead + Unpin>, target: Target) -> String {
    let mut result = String::new();
    let Some(stream) = stream else {
        return result;
    };

    let mut reader = BufReader::new(stream);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buffer);
                let line = line.trim_end_matches(['\r', '\n']);
                match target {
                    Target::Stdout => println!("{}", line),
                    Target::Stderr => eprintln!("{}", line),
                }
                result.push_str(line);
                result.push('\n');
            }
            Err(e) => {
                log::warn!("读取子进程输出失败: {}", e);
                break;
            }
        }
    }
    result
}

fn exit_code(status: ExitStatus) -> i32 {
    // 被信号终止时没有退出码
    status.code().unwrap_or(-1)
}

fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 执行外部命令，退出码非零时返回 `FurError::CommandFailed`。
///
/// `stream_output` 为真时 stdout / stderr 两个管道并发逐行转发到终端，
/// 两边都读完后才等待进程退出，避免大量输出填满管道导致死锁；
/// 失败信息为退出码。否则输出被缓冲，失败信息取自 stderr。
pub async fn run_command(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    stream_output: bool,
) -> Result<CommandOutput> {
    let display = command_line(program, args);
    log::debug!("执行命令: {}", display);

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|source| FurError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let output = if stream_output {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (all_stdout, all_stderr) = tokio::join!(
            read_stream_lines(stdout, Target::Stdout),
            read_stream_lines(stderr, Target::Stderr)
        );

        let status = child.wait().await?;
        CommandOutput {
            stdout: all_stdout,
            stderr: all_stderr,
            code: exit_code(status),
        }
    } else {
        let output = child.wait_with_output().await?;
        CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: exit_code(output.status),
        }
    };

    if !output.success() {
        let stderr = clean_terminal_output(&output.stderr);
        let detail = if stream_output || stderr.is_empty() {
            format!("退出码 {}", output.code)
        } else {
            stderr
        };
        return Err(FurError::CommandFailed {
            command: display,
            detail,
        });
    }

    log::trace!("{} 输出:\n{}", display, output.stdout.trim_end());
    Ok(output)
}
