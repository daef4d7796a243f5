//! # 文件条目数据模型
//!
//! 遍历阶段发现的文件及其移动请求。
//!
//! ## 依赖关系
//! - 由 `batch/walker.rs` 创建
//! - 经 `batch/dispatcher.rs` 的通道交给 `batch/mover.rs` 消费

use crate::error::{BmError, Result};

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use walkdir::DirEntry;

/// 遍历发现的文件，创建后只读
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// 绝对路径
    pub path: PathBuf,
    /// 基名
    pub name: OsString,
    /// 大小 (bytes)
    pub size: u64,
    /// 修改时间
    pub modified: Option<SystemTime>,
}

impl FileEntry {
    /// 从 walkdir 条目读取元数据
    pub fn from_dir_entry(entry: &DirEntry) -> Result<Self> {
        let metadata = entry.metadata().map_err(|e| BmError::WalkEntry {
            path: entry.path().display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(FileEntry {
            path: entry.path().to_path_buf(),
            name: entry.file_name().to_os_string(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

/// 移动请求：一个文件条目加上目标目录
///
/// 通过通道按值传递，保证每个文件只被一个 worker 处理。
#[derive(Debug)]
pub struct MoveRequest {
    pub entry: FileEntry,
    pub target_dir: Arc<Path>,
}

impl MoveRequest {
    pub fn new(entry: FileEntry, target_dir: Arc<Path>) -> Self {
        MoveRequest { entry, target_dir }
    }

    /// 不考虑冲突时的目标路径
    pub fn direct_target(&self) -> PathBuf {
        self.target_dir.join(&self.entry.name)
    }
}
