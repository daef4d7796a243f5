//! # bm - 按文件名模式批量移动文件
//!
//! 在一个或多个源目录中递归查找基名匹配某个模式（后缀 / 前缀 / 子串）
//! 的文件，并用固定大小的 worker 池把它们移动（或复制）到目标目录。
//!
//! ## 退出码
//! - `0` 成功（包括没有任何匹配文件）
//! - `1` 用法错误、根目录不可访问或任何移动失败
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/     (遍历、分发、移动、统计)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (输出与进度)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    // clap 默认以 2 退出，这里统一为 1（--help / --version 仍为 0）
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            e.print().ok();
            std::process::exit(code);
        }
    };

    if let Err(e) = commands::run(cli) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
