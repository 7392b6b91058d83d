//! 通用辅助函数：
//! - 环境变量读取与解析
//! - 带颜色的终端输出
//! - 网络请求期间的终端转圈提示

use std::{env, path::PathBuf, time::Duration};

use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};

/// 可选读取 PATH 环境变量为 PathBuf。
pub(crate) fn env_opt_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// 可选读取 String 环境变量。
pub(crate) fn env_opt_string(key: &str) -> Option<String> {
    env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// 读取布尔环境变量的真值（1/true/on/yes/y）。
pub(crate) fn env_bool_truthy(key: &str) -> Option<bool> {
    env::var(key).ok().map(|v| {
        matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes" | "y")
    })
}

/// 字符串能否解析为 URL
pub(crate) fn is_valid_url(u: &str) -> bool {
    url::Url::parse(u.trim()).is_ok()
}

pub(crate) fn print_success(msg: &str) {
    println!("{}", format!("✅ {}", msg).green());
}

pub(crate) fn print_info(msg: &str) {
    println!("ℹ️ {}", msg);
}

pub(crate) fn print_warn(msg: &str) {
    eprintln!("{}", format!("⚠️ {}", msg).yellow());
}

pub(crate) fn print_error(msg: &str) {
    eprintln!("{}", format!("❌ {}", msg).red());
}

pub(crate) fn print_bold(msg: &str) {
    println!("{}", msg.bold());
}

/// 网络请求期间的转圈提示；用完后调用 `finish_and_clear`
pub(crate) fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{msg} {spinner:.cyan}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
