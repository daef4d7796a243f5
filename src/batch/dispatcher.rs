//! # 任务分发器
//!
//! 遍历线程（每个根目录一个）把匹配条目推入有界通道，固定数量的
//! worker 从通道取出并交给 `EntryHandler` 处理。
//!
//! ## 功能
//! - 基于 rayon 专用线程池运行遍历线程与 worker
//! - 有界通道提供背压：处理慢时遍历线程阻塞
//! - 所有遍历线程结束后通道关闭，worker 取空后退出
//! - 首个致命错误设置中止标志，其余线程尽快停止
//!
//! ## 依赖关系
//! - 被 `commands/relocate.rs` 调用
//! - 使用 `batch/walker.rs`, `batch/mover.rs`, `batch/context.rs`
//! - 使用 `crossbeam-channel` 作为有界队列

use super::context::RelocationContext;
use super::mover::{EntryHandler, MoveOutcome, TransferMethod};
use super::walker::TreeWalker;
use crate::error::Result;
use crate::models::MoveRequest;
use crate::utils::output;

use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// 任务分发器
pub struct WorkDispatcher {
    /// worker 数量
    workers: usize,
    /// 通道容量
    capacity: usize,
}

impl WorkDispatcher {
    /// 创建分发器 (jobs = 0 时使用 CPU 逻辑核数)
    pub fn new(jobs: usize) -> Self {
        let workers = if jobs == 0 { num_cpus::get() } else { jobs };
        Self {
            workers,
            capacity: workers * 2,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// 遍历所有根目录并把匹配文件交给 handler，返回首个致命错误
    pub fn run<H: EntryHandler>(
        &self,
        walker: &TreeWalker,
        target_dir: &Path,
        handler: &H,
        ctx: &RelocationContext,
    ) -> Result<()> {
        let roots = walker.roots();
        let target_dir: Arc<Path> = Arc::from(target_dir);
        let (tx, rx) = bounded::<MoveRequest>(self.capacity);

        // 每个遍历线程与 worker 各占一个线程，阻塞不会饿死其他任务
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(roots.len() + self.workers)
            .thread_name(|i| format!("bm-{}", i))
            .build()?;

        pool.scope(move |s| {
            for root in roots {
                let tx = tx.clone();
                let target_dir = Arc::clone(&target_dir);
                s.spawn(move |_| walk_root(walker, root, tx, target_dir, ctx));
            }
            // 只剩遍历线程持有发送端，全部结束后通道关闭
            drop(tx);

            for _ in 0..self.workers {
                let rx = rx.clone();
                s.spawn(move |_| drain(rx, handler, ctx));
            }
        });

        match ctx.take_error() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// 遍历线程：单条目错误记录警告后继续，致命错误中止整个运行
fn walk_root(
    walker: &TreeWalker,
    root: &Path,
    tx: Sender<MoveRequest>,
    target_dir: Arc<Path>,
    ctx: &RelocationContext,
) {
    for item in walker.walk(root) {
        if ctx.is_aborted() {
            return;
        }
        match item {
            Ok(entry) => {
                // 接收端全部关闭只会发生在中止之后
                if tx
                    .send(MoveRequest::new(entry, Arc::clone(&target_dir)))
                    .is_err()
                {
                    return;
                }
            }
            Err(e) if e.is_fatal() => {
                ctx.fail(e);
                return;
            }
            Err(e) => {
                ctx.stats.record_skip();
                ctx.warn(&format!(
                    "{} {}",
                    e,
                    output::fields(&[("root", root.display().to_string())])
                ));
            }
        }
    }
}

/// worker：取到通道关闭为止，遇到中止标志立即退出
fn drain<H: EntryHandler>(rx: Receiver<MoveRequest>, handler: &H, ctx: &RelocationContext) {
    for request in rx.iter() {
        if ctx.is_aborted() {
            return;
        }

        let started = Instant::now();
        match handler.handle(request) {
            Ok(MoveOutcome::Done {
                source,
                target,
                bytes,
                method,
            }) => {
                ctx.stats.record_move(bytes, started.elapsed());
                ctx.progress().inc(1);
                ctx.detail(|| {
                    output::print_relocation(
                        &source.display().to_string(),
                        &target.display().to_string(),
                        method_label(method),
                    )
                });
            }
            Ok(MoveOutcome::Skipped { source, target }) => {
                ctx.stats.record_skip();
                ctx.progress().suspend(|| {
                    output::print_skip(&format!(
                        "Target exists {}",
                        output::fields(&[
                            ("source", source.display().to_string()),
                            ("target", target.display().to_string()),
                        ])
                    ))
                });
            }
            Err(e) => {
                ctx.fail(e);
                return;
            }
        }
    }
}

fn method_label(method: TransferMethod) -> &'static str {
    match method {
        TransferMethod::Rename => "rename",
        TransferMethod::CopyDelete => "copy+delete",
        TransferMethod::Copy => "copy",
        TransferMethod::DryRun => "dry-run",
    }
}
