//! # 移动参数 CLI 定义
//!
//! 文件名模式、目标目录、源目录以及并发与冲突选项。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/relocate.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 同名目标文件的处理方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OnConflict {
    /// Abort the whole run
    Fail,
    /// Leave the existing file alone and skip the source
    Skip,
    /// Store the file as "name (N).ext"
    Rename,
}

impl std::fmt::Display for OnConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnConflict::Fail => write!(f, "fail"),
            OnConflict::Skip => write!(f, "skip"),
            OnConflict::Rename => write!(f, "rename"),
        }
    }
}

/// 文件名模式，必须且只能指定一个
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct MatcherArgs {
    /// Select files whose name ends with PATTERN
    #[arg(short = 's', long, value_name = "PATTERN")]
    pub suffix: Option<String>,

    /// Select files whose name starts with PATTERN
    #[arg(short = 'p', long, value_name = "PATTERN")]
    pub prefix: Option<String>,

    /// Select files whose name contains PATTERN
    #[arg(short = 'S', long, value_name = "PATTERN")]
    pub substring: Option<String>,
}

/// 移动参数
#[derive(Args, Debug)]
pub struct RelocateArgs {
    #[command(flatten)]
    pub matcher: MatcherArgs,

    /// Directory that receives the matched files
    #[arg(short, long, env = "BM_DESTINATION", value_name = "DIR")]
    pub destination: PathBuf,

    /// Source directories to search (defaults to the current directory)
    #[arg(value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Number of worker threads (0 = auto)
    #[arg(short, long, env = "BM_JOBS", default_value_t = 0)]
    pub jobs: usize,

    /// Copy files instead of moving them
    #[arg(long, default_value_t = false)]
    pub copy: bool,

    /// Show what would be done without touching any file
    #[arg(short = 'n', long, default_value_t = false)]
    pub dry_run: bool,

    /// What to do when the target file already exists
    #[arg(long, value_enum, default_value = "fail")]
    pub on_conflict: OnConflict,

    /// Create the destination directory if it does not exist
    #[arg(long, default_value_t = false)]
    pub create_destination: bool,

    /// Maximum directory depth to descend (0 = only the roots themselves)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Skip hidden files and directories
    #[arg(long, default_value_t = false)]
    pub skip_hidden: bool,

    /// Match the pattern case-insensitively
    #[arg(short, long, default_value_t = false)]
    pub ignore_case: bool,

    /// Print every relocated file
    #[arg(short, long, default_value_t = false, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings, errors and the final summary
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}
