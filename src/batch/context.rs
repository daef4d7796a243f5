//! # 运行配置与共享上下文
//!
//! `RelocateConfig` 是与命令行无关的运行配置；`RelocationContext`
//! 在启动时创建一次，以引用形式传给遍历线程和 worker。
//!
//! ## 功能
//! - 统计计数器
//! - 中止标志与首个致命错误
//! - 进度条与输出级别（日志输出在进度条之上进行）
//!
//! ## 依赖关系
//! - 被 `batch/dispatcher.rs`, `commands/relocate.rs` 使用
//! - 使用 `batch/stats.rs`, `utils/output.rs`

use super::matcher::NameMatcher;
use super::mover::{ConflictPolicy, TransferMode};
use super::stats::Stats;
use crate::error::BmError;
use crate::utils::output;

use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// 输出级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

/// 运行配置
#[derive(Debug, Clone)]
pub struct RelocateConfig {
    pub matcher: NameMatcher,
    pub destination: PathBuf,
    pub roots: Vec<PathBuf>,
    /// worker 数量 (0 = CPU 逻辑核数)
    pub jobs: usize,
    pub mode: TransferMode,
    pub on_conflict: ConflictPolicy,
    pub dry_run: bool,
    pub create_destination: bool,
    pub max_depth: Option<usize>,
    pub skip_hidden: bool,
    pub verbosity: Verbosity,
}

impl RelocateConfig {
    /// 以默认选项创建配置
    pub fn new(matcher: NameMatcher, destination: impl Into<PathBuf>, roots: Vec<PathBuf>) -> Self {
        let roots = if roots.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            roots
        };
        RelocateConfig {
            matcher,
            destination: destination.into(),
            roots,
            jobs: 0,
            mode: TransferMode::Move,
            on_conflict: ConflictPolicy::Fail,
            dry_run: false,
            create_destination: false,
            max_depth: None,
            skip_hidden: false,
            verbosity: Verbosity::Normal,
        }
    }
}

/// 共享上下文
pub struct RelocationContext {
    pub stats: Stats,
    verbosity: Verbosity,
    progress: ProgressBar,
    aborted: AtomicBool,
    first_error: Mutex<Option<BmError>>,
}

impl RelocationContext {
    pub fn new(verbosity: Verbosity, progress: ProgressBar) -> Self {
        RelocationContext {
            stats: Stats::new(),
            verbosity,
            progress,
            aborted: AtomicBool::new(false),
            first_error: Mutex::new(None),
        }
    }

    /// 不显示进度、不输出信息的上下文
    #[cfg(test)]
    pub fn silent() -> Self {
        Self::new(Verbosity::Quiet, ProgressBar::hidden())
    }

    pub fn progress(&self) -> &ProgressBar {
        &self.progress
    }

    /// 记录致命错误并通知所有线程停止；只保留第一个错误
    pub fn fail(&self, err: BmError) {
        self.aborted.store(true, Ordering::SeqCst);
        let mut slot = self.first_error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// 取出首个致命错误
    pub fn take_error(&self) -> Option<BmError> {
        self.first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// 打印警告（总是输出，不受 quiet 影响）
    pub fn warn(&self, msg: &str) {
        self.progress.suspend(|| output::print_warning(msg));
    }

    /// 打印普通信息
    pub fn info(&self, msg: &str) {
        if self.verbosity != Verbosity::Quiet {
            self.progress.suspend(|| output::print_info(msg));
        }
    }

    /// 打印逐文件信息（仅 verbose）
    pub fn detail<F: FnOnce()>(&self, print: F) {
        if self.verbosity == Verbosity::Verbose {
            self.progress.suspend(print);
        }
    }
}
