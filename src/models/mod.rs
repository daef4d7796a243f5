//! # 数据模型模块
//!
//! 定义遍历与移动流水线中传递的数据。
//!
//! ## 依赖关系
//! - 被 `batch/` 和 `commands/` 使用
//! - 子模块: entry

pub mod entry;

pub use entry::{FileEntry, MoveRequest};
