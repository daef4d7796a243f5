//! # 进度条工具
//!
//! 封装 `indicatif` 提供统一的进度显示样式。遍历是惰性的，
//! 总数未知，因此只使用计数 spinner。
//!
//! ## 依赖关系
//! - 被 `commands/relocate.rs` 使用
//! - 使用 `indicatif` 与 `console` crate

use indicatif::{ProgressBar, ProgressStyle};

/// 创建计数 spinner；stderr 不是终端时返回隐藏的进度条
pub fn create_counter(message: &str) -> ProgressBar {
    if !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {elapsed_precise} {pos} files {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"]);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
