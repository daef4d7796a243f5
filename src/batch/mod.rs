//! # 批量移动模块
//!
//! 按文件名模式筛选并并发移动文件的流水线。
//!
//! ## 数据流
//! ```text
//! 根目录 ─► TreeWalker (每个根目录一个线程)
//!              │ MoveRequest (有界通道)
//!              ▼
//!        WorkDispatcher ─► N 个 worker ─► Mover ─► Stats
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/relocate.rs` 使用
//! - 使用 `rayon` 线程池、`crossbeam-channel` 通道、`walkdir` 遍历

pub mod context;
pub mod dispatcher;
pub mod matcher;
pub mod mover;
pub mod stats;
pub mod walker;

pub use context::{RelocateConfig, RelocationContext, Verbosity};
pub use dispatcher::WorkDispatcher;
pub use matcher::NameMatcher;
pub use mover::{ConflictPolicy, Mover, TransferMode};
pub use stats::Report;
pub use walker::TreeWalker;
