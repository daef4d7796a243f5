//! # 统一错误处理模块
//!
//! 定义 bm 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 用法错误：参数缺失或冲突，未产生任何副作用
//! - 根路径错误：无法访问源目录，整个运行中止
//! - 遍历条目错误：仅记录警告，跳过该条目
//! - 移动错误：首个失败立即中止，不回滚
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use std::io;
use thiserror::Error;

/// bm 统一错误类型
#[derive(Error, Debug)]
pub enum BmError {
    // ─────────────────────────────────────────────────────────────
    // 用法错误
    // ─────────────────────────────────────────────────────────────
    #[error("Usage error: {0}")]
    Usage(String),

    // ─────────────────────────────────────────────────────────────
    // 遍历错误
    // ─────────────────────────────────────────────────────────────
    #[error("Cannot access source root '{path}': {source}")]
    RootUnreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Cannot read '{path}': {reason}")]
    WalkEntry { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 目标目录错误
    // ─────────────────────────────────────────────────────────────
    #[error("Destination is not a directory: {path}")]
    DestinationNotDirectory { path: String },

    #[error("Failed to create destination directory '{path}': {source}")]
    DestinationCreate {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Destination already exists or is claimed by another file: {path}")]
    DestinationConflict { path: String },

    // ─────────────────────────────────────────────────────────────
    // 移动/复制错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to move '{from}' -> '{to}': {source}")]
    MoveFailed {
        from: String,
        to: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy '{from}' -> '{to}': {source}")]
    CopyFailed {
        from: String,
        to: String,
        #[source]
        source: io::Error,
    },

    #[error("Copy verification failed for '{path}': expected {expected} bytes, found {actual}")]
    VerifyFailed {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("Failed to remove source file '{path}' after copy: {source}")]
    RemoveFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{0}")]
    Other(String),
}

impl BmError {
    /// 是否为致命错误（遍历中的单条目错误可恢复，其余全部致命）
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BmError::WalkEntry { .. })
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, BmError>;
