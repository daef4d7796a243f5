//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数。
//!
//! ## 用法
//! ```text
//! bm (--suffix|--prefix|--substring) <PATTERN> --destination <DIR> [DIR ...]
//! ```
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: relocate

pub mod relocate;

use clap::Parser;

pub use relocate::{OnConflict, RelocateArgs};

/// bm - 按文件名模式批量移动文件
#[derive(Parser, Debug)]
#[command(name = "bm")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Move or copy every file whose name matches a pattern into one directory",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub relocate: RelocateArgs,
}
