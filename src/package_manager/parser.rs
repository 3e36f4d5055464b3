//! 解析函数：包规格、shebang、终端输出

use super::types::PackageSpec;

/// 解析 `name` 或 `name@version`。
///
/// 只认第一个 `@`：`a@b@c` 解析为 `(a, b)`，其余部分丢弃。
pub fn parse_package_spec(input: &str) -> PackageSpec {
    let mut parts = input.trim().split('@');
    let name = parts.next().unwrap_or_default().to_string();
    let version = parts
        .next()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string());
    PackageSpec { name, version }
}

/// 从脚本首行提取解释器指令（去掉 `#!` 后的部分）
pub fn parse_shebang(first_line: &str) -> Option<&str> {
    first_line
        .trim_end_matches(['\r', '\n'])
        .strip_prefix("#!")
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
}

/// 清理终端输出中的 ANSI 转义序列和特殊字符
pub fn clean_terminal_output(input: &str) -> String {
    let mut result = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            '\r' => {
                if chars.peek() != Some(&'\n') && !result.ends_with('\n') {
                    result.push('\n');
                }
            }
            c if c.is_control() && c != '\n' && c != '\t' => {}
            _ => result.push(c),
        }
    }

    let mut cleaned_lines = Vec::new();
    let mut prev_empty = false;

    for line in result.lines() {
        let is_empty = line.trim().is_empty();
        if is_empty && prev_empty {
            continue;
        }
        cleaned_lines.push(line);
        prev_empty = is_empty;
    }

    cleaned_lines.join("\n").trim().to_string()
}
