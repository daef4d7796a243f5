//! # 运行统计
//!
//! 多个 worker 通过原子操作累加计数，全部 worker 结束后读取一次生成报告。
//!
//! ## 依赖关系
//! - 被 `batch/dispatcher.rs` 更新
//! - 被 `commands/relocate.rs` 读取并打印

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 原子计数器集合
#[derive(Debug)]
pub struct Stats {
    started: Instant,
    files: AtomicU64,
    bytes: AtomicU64,
    skipped: AtomicU64,
    busy_nanos: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    /// 创建计数器并开始计时
    pub fn new() -> Self {
        Stats {
            started: Instant::now(),
            files: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            busy_nanos: AtomicU64::new(0),
        }
    }

    /// 记录一次成功的移动
    pub fn record_move(&self, bytes: u64, elapsed: Duration) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.busy_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    /// 记录一个被跳过的条目
    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// 生成最终报告（在所有 worker 结束后调用）
    pub fn finish(&self) -> Report {
        Report {
            files: self.files.load(Ordering::SeqCst),
            bytes: self.bytes.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            busy: Duration::from_nanos(self.busy_nanos.load(Ordering::SeqCst)),
            elapsed: self.started.elapsed(),
        }
    }
}

/// 最终报告
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    /// 成功移动的文件数
    pub files: u64,
    /// 移动的总字节数
    pub bytes: u64,
    /// 跳过的条目数
    pub skipped: u64,
    /// 所有 worker 的累计处理时间
    pub busy: Duration,
    /// 墙钟时间
    pub elapsed: Duration,
}

impl Report {
    /// 吞吐量 (files/s)
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.files as f64 / secs
        } else {
            0.0
        }
    }
}
