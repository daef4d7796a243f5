//! # 文件移动器
//!
//! 将单个文件移动（或复制）到目标目录。
//!
//! ## 功能
//! - 同一文件系统：原子 rename
//! - 跨文件系统：复制 → fsync → 校验长度 → 恢复修改时间 → 删除源文件
//! - 复制模式：保留源文件
//! - 试运行：只计算目标路径，不修改文件系统
//! - 同名冲突策略：失败 / 跳过 / 编号重命名
//!
//! ## 依赖关系
//! - 被 `batch/dispatcher.rs` 通过 `EntryHandler` trait 调用
//! - 使用 `models/entry.rs`

use crate::error::{BmError, Result};
use crate::models::{FileEntry, MoveRequest};

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions, Permissions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

/// 处理单个移动请求的接口
pub trait EntryHandler: Sync {
    fn handle(&self, request: MoveRequest) -> Result<MoveOutcome>;
}

/// 传输方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// 移动，源文件消失
    Move,
    /// 复制，源文件保留
    Copy,
}

/// 目标文件已存在时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// 致命错误，中止整个运行
    Fail,
    /// 跳过该文件
    Skip,
    /// 使用 `name (N).ext` 形式的新名字
    Rename,
}

/// 实际执行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMethod {
    Rename,
    CopyDelete,
    Copy,
    DryRun,
}

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Done {
        source: PathBuf,
        target: PathBuf,
        bytes: u64,
        method: TransferMethod,
    },
    Skipped {
        source: PathBuf,
        target: PathBuf,
    },
}

/// 文件移动器
pub struct Mover {
    mode: TransferMode,
    policy: ConflictPolicy,
    dry_run: bool,
    /// 本次运行已分配的目标路径
    claimed: Mutex<HashSet<PathBuf>>,
}

impl Mover {
    pub fn new(mode: TransferMode, policy: ConflictPolicy) -> Self {
        Mover {
            mode,
            policy,
            dry_run: false,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 按冲突策略确定目标路径；`None` 表示跳过
    fn resolve_target(&self, request: &MoveRequest) -> Result<Option<PathBuf>> {
        let direct = request.direct_target();
        if self.claim(&direct) {
            return Ok(Some(direct));
        }

        match self.policy {
            ConflictPolicy::Fail => Err(BmError::DestinationConflict {
                path: direct.display().to_string(),
            }),
            ConflictPolicy::Skip => Ok(None),
            ConflictPolicy::Rename => Ok((1u64..)
                .map(|n| request.target_dir.join(numbered_name(&request.entry.name, n)))
                .find(|candidate| self.claim(candidate))),
        }
    }

    /// 路径未被占用时登记并返回 true
    fn claim(&self, target: &Path) -> bool {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        if claimed.contains(target) || fs::symlink_metadata(target).is_ok() {
            return false;
        }
        claimed.insert(target.to_path_buf());
        true
    }
}

impl EntryHandler for Mover {
    fn handle(&self, request: MoveRequest) -> Result<MoveOutcome> {
        let entry = &request.entry;
        let target = match self.resolve_target(&request)? {
            Some(target) => target,
            None => {
                return Ok(MoveOutcome::Skipped {
                    source: entry.path.clone(),
                    target: request.direct_target(),
                })
            }
        };

        if self.dry_run {
            return Ok(MoveOutcome::Done {
                source: entry.path.clone(),
                target,
                bytes: entry.size,
                method: TransferMethod::DryRun,
            });
        }

        let (bytes, method) = match self.mode {
            TransferMode::Copy => (copy_verified(entry, &target)?, TransferMethod::Copy),
            TransferMode::Move => match fs::rename(&entry.path, &target) {
                Ok(()) => (entry.size, TransferMethod::Rename),
                Err(e) if is_cross_device(&e) => {
                    (copy_then_remove(entry, &target)?, TransferMethod::CopyDelete)
                }
                Err(e) => {
                    return Err(BmError::MoveFailed {
                        from: entry.path.display().to_string(),
                        to: target.display().to_string(),
                        source: e,
                    })
                }
            },
        };

        Ok(MoveOutcome::Done {
            source: entry.path.clone(),
            target,
            bytes,
            method,
        })
    }
}

/// 跨文件系统移动：复制并校验后删除源文件
fn copy_then_remove(entry: &FileEntry, target: &Path) -> Result<u64> {
    let bytes = copy_verified(entry, target)?;
    fs::remove_file(&entry.path).map_err(|e| BmError::RemoveFailed {
        path: entry.path.display().to_string(),
        source: e,
    })?;
    Ok(bytes)
}

/// 复制文件，落盘后校验长度并恢复修改时间；任何一步失败都删除目标文件
fn copy_verified(entry: &FileEntry, target: &Path) -> Result<u64> {
    let result = fs::copy(&entry.path, target)
        .map_err(|e| copy_error(entry, target, e))
        .and_then(|copied| finish_copy(entry, target, copied));

    if result.is_err() {
        fs::remove_file(target).ok();
    }
    result
}

/// 校验已复制的目标文件（只读打开，源文件可能是只读的）
fn finish_copy(entry: &FileEntry, target: &Path, copied: u64) -> Result<u64> {
    let file = File::open(target).map_err(|e| copy_error(entry, target, e))?;
    file.sync_all().map_err(|e| copy_error(entry, target, e))?;
    let metadata = file.metadata().map_err(|e| copy_error(entry, target, e))?;
    drop(file);

    let actual = metadata.len();
    if copied != entry.size || actual != entry.size {
        return Err(BmError::VerifyFailed {
            path: target.display().to_string(),
            expected: entry.size,
            actual,
        });
    }

    if let Some(modified) = entry.modified {
        restore_modified(target, modified, metadata.permissions())
            .map_err(|e| copy_error(entry, target, e))?;
    }

    Ok(actual)
}

/// 设置修改时间；只读文件临时加上写权限，完成后恢复原权限
fn restore_modified(
    target: &Path,
    modified: SystemTime,
    permissions: Permissions,
) -> io::Result<()> {
    let set = || {
        OpenOptions::new()
            .write(true)
            .open(target)?
            .set_modified(modified)
    };

    if !permissions.readonly() {
        return set();
    }

    fs::set_permissions(target, owner_writable(&permissions))?;
    let result = set();
    fs::set_permissions(target, permissions)?;
    result
}

#[cfg(unix)]
fn owner_writable(permissions: &Permissions) -> Permissions {
    use std::os::unix::fs::PermissionsExt;
    Permissions::from_mode(permissions.mode() | 0o200)
}

#[cfg(not(unix))]
fn owner_writable(permissions: &Permissions) -> Permissions {
    let mut writable = permissions.clone();
    writable.set_readonly(false);
    writable
}

fn copy_error(entry: &FileEntry, target: &Path, source: io::Error) -> BmError {
    BmError::CopyFailed {
        from: entry.path.display().to_string(),
        to: target.display().to_string(),
        source,
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    #[cfg(windows)]
    const CROSS_DEVICE: i32 = 17; // ERROR_NOT_SAME_DEVICE
    #[cfg(not(windows))]
    const CROSS_DEVICE: i32 = 18; // EXDEV

    err.raw_os_error() == Some(CROSS_DEVICE)
}

/// `movie.mkv` -> `movie (N).mkv`
fn numbered_name(name: &OsStr, n: u64) -> OsString {
    let path = Path::new(name);
    let stem = path.file_stem().unwrap_or(name);

    let mut numbered = stem.to_os_string();
    numbered.push(format!(" ({})", n));
    if let Some(ext) = path.extension() {
        numbered.push(".");
        numbered.push(ext);
    }
    numbered
}
