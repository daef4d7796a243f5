//! # 批量移动命令实现
//!
//! 把命令行参数转换为运行配置，准备目标目录，启动遍历与 worker，
//! 全部结束后打印统计报告。
//!
//! ## 运行阶段
//! `Idle → Walking & Dispatching → Draining → Reporting → Terminated`；
//! 任何致命错误直接进入 `Terminated`，不打印报告。
//!
//! ## 依赖关系
//! - 使用 `cli/relocate.rs` 定义的参数
//! - 使用 `batch/` 流水线
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::{
    ConflictPolicy, Mover, NameMatcher, RelocateConfig, RelocationContext, Report, TransferMode,
    TreeWalker, Verbosity, WorkDispatcher,
};
use crate::cli::{OnConflict, RelocateArgs};
use crate::error::{BmError, Result};
use crate::utils::{output, progress};

use indicatif::{HumanBytes, HumanDuration, ProgressBar};
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

impl From<OnConflict> for ConflictPolicy {
    fn from(value: OnConflict) -> Self {
        match value {
            OnConflict::Fail => ConflictPolicy::Fail,
            OnConflict::Skip => ConflictPolicy::Skip,
            OnConflict::Rename => ConflictPolicy::Rename,
        }
    }
}

impl TryFrom<RelocateArgs> for RelocateConfig {
    type Error = BmError;

    fn try_from(args: RelocateArgs) -> Result<Self> {
        let matcher = NameMatcher::from_options(
            args.matcher.suffix.as_deref(),
            args.matcher.prefix.as_deref(),
            args.matcher.substring.as_deref(),
        )?
        .ignore_case(args.ignore_case);

        let verbosity = if args.quiet {
            Verbosity::Quiet
        } else if args.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        let mut config = RelocateConfig::new(matcher, args.destination, args.dirs);
        config.jobs = args.jobs;
        config.mode = if args.copy {
            TransferMode::Copy
        } else {
            TransferMode::Move
        };
        config.on_conflict = args.on_conflict.into();
        config.dry_run = args.dry_run;
        config.create_destination = args.create_destination;
        config.max_depth = args.max_depth;
        config.skip_hidden = args.skip_hidden;
        config.verbosity = verbosity;
        Ok(config)
    }
}

/// 执行批量移动命令
pub fn execute(args: RelocateArgs) -> Result<()> {
    let config = RelocateConfig::try_from(args)?;
    let quiet = config.verbosity == Verbosity::Quiet;

    if !quiet {
        let title = match (config.mode, config.dry_run) {
            (_, true) => "Bulk Relocation (dry run)",
            (TransferMode::Move, false) => "Bulk Move",
            (TransferMode::Copy, false) => "Bulk Copy",
        };
        output::print_header(title);
    }

    let pb = if config.verbosity == Verbosity::Normal {
        progress::create_counter("relocated")
    } else {
        ProgressBar::hidden()
    };

    let result = relocate(&config, pb.clone());
    pb.finish_and_clear();
    let report = result?;

    if !quiet {
        output::print_separator();
        print_report(&report);
    }

    let verb = match (config.mode, config.dry_run) {
        (_, true) => "Would relocate",
        (TransferMode::Move, false) => "Moved",
        (TransferMode::Copy, false) => "Copied",
    };
    output::print_done(&format!(
        "{} {} file(s) into '{}' {}",
        verb,
        report.files,
        config.destination.display(),
        output::fields(&[
            ("bytes", report.bytes.to_string()),
            ("skipped", report.skipped.to_string()),
            ("elapsed", format!("{:.3}s", report.elapsed.as_secs_f64())),
            ("files_per_sec", format!("{:.1}", report.throughput())),
        ])
    ));

    Ok(())
}

/// 运行完整流水线，成功时返回统计报告
pub fn relocate(config: &RelocateConfig, progress: ProgressBar) -> Result<Report> {
    // 根目录先于目标目录检查，根目录无效时不创建任何目录
    let walker = TreeWalker::new(&config.roots, config.matcher.clone())?
        .max_depth(config.max_depth)
        .skip_hidden(config.skip_hidden);
    let destination = prepare_destination(config)?;
    let walker = walker.exclude(destination.clone());

    let dispatcher = WorkDispatcher::new(config.jobs);
    let ctx = RelocationContext::new(config.verbosity, progress);

    ctx.info(&format!(
        "Selecting files by {} {}",
        walker.matcher(),
        output::fields(&[
            ("roots", walker.roots().len().to_string()),
            ("workers", dispatcher.workers().to_string()),
            ("destination", destination.display().to_string()),
        ])
    ));

    let mover = Mover::new(config.mode, config.on_conflict).dry_run(config.dry_run);
    dispatcher.run(&walker, &destination, &mover, &ctx)?;

    Ok(ctx.stats.finish())
}

/// 检查目标目录，返回其绝对路径
///
/// 目标目录不存在且未要求创建时不报错：首次移动会失败并中止运行。
fn prepare_destination(config: &RelocateConfig) -> Result<PathBuf> {
    let dest = &config.destination;

    if !dest.exists() && config.create_destination && !config.dry_run {
        fs::create_dir_all(dest).map_err(|e| BmError::DestinationCreate {
            path: dest.display().to_string(),
            source: e,
        })?;
    }

    if dest.exists() {
        if !dest.is_dir() {
            return Err(BmError::DestinationNotDirectory {
                path: dest.display().to_string(),
            });
        }
        return fs::canonicalize(dest).map_err(|e| BmError::DestinationCreate {
            path: dest.display().to_string(),
            source: e,
        });
    }

    absolute(dest)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| BmError::Other(format!(
        "Cannot resolve destination '{}': {}",
        path.display(),
        e
    )))
}

/// 统计表格行
#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn print_report(report: &Report) {
    let rows = vec![
        ReportRow {
            metric: "Files",
            value: report.files.to_string(),
        },
        ReportRow {
            metric: "Size",
            value: HumanBytes(report.bytes).to_string(),
        },
        ReportRow {
            metric: "Skipped",
            value: report.skipped.to_string(),
        },
        ReportRow {
            metric: "Elapsed",
            value: HumanDuration(report.elapsed).to_string(),
        },
        ReportRow {
            metric: "Worker time",
            value: format!("{:.3}s", report.busy.as_secs_f64()),
        },
        ReportRow {
            metric: "Throughput",
            value: format!("{:.1} files/s", report.throughput()),
        },
    ];

    println!("{}", Table::new(&rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::matcher::MatchKind;
    use tempfile::TempDir;

    fn write(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config(kind: MatchKind, pattern: &str, dest: &Path, roots: Vec<PathBuf>) -> RelocateConfig {
        let mut config = RelocateConfig::new(NameMatcher::new(kind, pattern).unwrap(), dest, roots);
        config.verbosity = Verbosity::Quiet;
        config
    }

    #[test]
    fn test_matching_files_moved_others_untouched() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        write(&src.join("a.mkv"), b"a");
        write(&src.join("season1/b.mkv"), b"bb");
        write(&src.join("season1/b.srt"), b"subs");
        write(&src.join("notes.txt"), b"n");

        let cfg = config(MatchKind::Suffix, ".mkv", &dest, vec![src.clone()]);
        let report = relocate(&cfg, ProgressBar::hidden()).unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.bytes, 3);
        assert!(dest.join("a.mkv").exists());
        assert!(dest.join("b.mkv").exists());
        assert!(!src.join("a.mkv").exists());
        assert!(!src.join("season1/b.mkv").exists());
        assert!(src.join("season1/b.srt").exists());
        assert!(src.join("notes.txt").exists());
    }

    #[test]
    fn test_second_run_moves_nothing() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        for i in 0..10 {
            write(&src.join(format!("IMG_{}.jpg", i)), b"jpg");
        }

        let cfg = config(MatchKind::Prefix, "IMG_", &dest, vec![src.clone()]);
        assert_eq!(relocate(&cfg, ProgressBar::hidden()).unwrap().files, 10);
        assert_eq!(relocate(&cfg, ProgressBar::hidden()).unwrap().files, 0);
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 10);
    }

    #[test]
    fn test_destination_inside_root_is_not_rescanned() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        let dest = root.join("collected");
        write(&root.join("x/report-draft.doc"), b"1");
        write(&root.join("y/draft-2.doc"), b"2");

        let mut cfg = config(MatchKind::Substring, "draft", &dest, vec![root.clone()]);
        cfg.create_destination = true;
        let report = relocate(&cfg, ProgressBar::hidden()).unwrap();

        assert_eq!(report.files, 2);
        assert!(dest.join("report-draft.doc").exists());
        assert!(dest.join("draft-2.doc").exists());
    }

    #[test]
    fn test_empty_tree_reports_zero() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();

        let cfg = config(MatchKind::Suffix, ".mkv", &dest, vec![src]);
        let report = relocate(&cfg, ProgressBar::hidden()).unwrap();
        assert_eq!(report.files, 0);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn test_missing_destination_aborts_without_moving() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("nowhere");
        for i in 0..5 {
            write(&src.join(format!("f{}.log", i)), b"log");
        }

        let mut cfg = config(MatchKind::Suffix, ".log", &dest, vec![src.clone()]);
        cfg.jobs = 1;
        let err = relocate(&cfg, ProgressBar::hidden()).unwrap_err();

        assert!(matches!(err, BmError::MoveFailed { .. }));
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(&src).unwrap().count(), 5);
    }

    #[test]
    fn test_destination_must_be_directory() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("file-not-dir");
        fs::write(&dest, b"x").unwrap();

        let cfg = config(MatchKind::Suffix, ".mkv", &dest, vec![tmp.path().to_path_buf()]);
        let err = relocate(&cfg, ProgressBar::hidden()).unwrap_err();
        assert!(matches!(err, BmError::DestinationNotDirectory { .. }));
    }

    #[test]
    fn test_duplicate_base_names_fail_by_default() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        write(&src.join("a/cover.jpg"), b"a");
        write(&src.join("b/cover.jpg"), b"b");

        let cfg = config(MatchKind::Suffix, ".jpg", &dest, vec![src.clone()]);
        let err = relocate(&cfg, ProgressBar::hidden()).unwrap_err();
        assert!(matches!(err, BmError::DestinationConflict { .. }));

        // 恰好一个文件被移动，另一个留在原处
        assert!(dest.join("cover.jpg").exists());
        let remaining = [src.join("a/cover.jpg"), src.join("b/cover.jpg")]
            .iter()
            .filter(|p| p.exists())
            .count();
        assert_eq!(remaining, 1);
    }

    #[test]
    fn test_duplicate_base_names_renamed() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        write(&src.join("a/cover.jpg"), b"a");
        write(&src.join("b/cover.jpg"), b"b");
        write(&src.join("c/cover.jpg"), b"c");

        let mut cfg = config(MatchKind::Suffix, ".jpg", &dest, vec![src]);
        cfg.on_conflict = ConflictPolicy::Rename;
        let report = relocate(&cfg, ProgressBar::hidden()).unwrap();

        assert_eq!(report.files, 3);
        assert!(dest.join("cover.jpg").exists());
        assert!(dest.join("cover (1).jpg").exists());
        assert!(dest.join("cover (2).jpg").exists());
    }

    #[test]
    fn test_copy_and_dry_run_modes() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        write(&src.join("keep.txt"), b"keep");

        let mut dry = config(MatchKind::Suffix, ".txt", &dest, vec![src.clone()]);
        dry.dry_run = true;
        assert_eq!(relocate(&dry, ProgressBar::hidden()).unwrap().files, 1);
        assert!(!dest.join("keep.txt").exists());

        let mut copy = config(MatchKind::Suffix, ".txt", &dest, vec![src.clone()]);
        copy.mode = TransferMode::Copy;
        assert_eq!(relocate(&copy, ProgressBar::hidden()).unwrap().files, 1);
        assert!(dest.join("keep.txt").exists());
        assert!(src.join("keep.txt").exists());
    }

    #[test]
    fn test_invalid_root_creates_no_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("new/dest");
        write(&src.join("a.mkv"), b"a");

        let mut cfg = config(
            MatchKind::Suffix,
            ".mkv",
            &dest,
            vec![src.clone(), tmp.path().join("typo")],
        );
        cfg.create_destination = true;
        let err = relocate(&cfg, ProgressBar::hidden()).unwrap_err();

        assert!(matches!(err, BmError::RootUnreadable { .. }));
        assert!(!tmp.path().join("new").exists());
        assert!(src.join("a.mkv").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_counted_as_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        write(&src.join("a.mkv"), b"a");
        write(&src.join("open/b.mkv"), b"b");
        write(&src.join("locked/c.mkv"), b"c");
        let locked = src.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root 不受目录权限限制
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let cfg = config(MatchKind::Suffix, ".mkv", &dest, vec![src.clone()]);
        let report = relocate(&cfg, ProgressBar::hidden());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let report = report.unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.skipped, 1);
        assert!(dest.join("a.mkv").exists());
        assert!(dest.join("b.mkv").exists());
        assert!(locked.join("c.mkv").exists());
    }
}
