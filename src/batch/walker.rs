//! # 目录遍历器
//!
//! 递归遍历一个或多个源目录，产出基名匹配的文件条目。
//!
//! ## 功能
//! - 根目录规范化与去重（嵌套根目录只保留外层）
//! - 跳过目录与符号链接，只产出普通文件
//! - 不进入目标目录，避免已移动的文件被再次发现
//! - 可选深度限制与隐藏文件过滤
//! - 单条目错误可恢复，根目录错误致命
//!
//! ## 依赖关系
//! - 被 `batch/dispatcher.rs` 调用（每个根目录一个线程）
//! - 使用 `batch/matcher.rs` 进行匹配
//! - 使用 `walkdir` 遍历目录

use super::matcher::NameMatcher;
use crate::error::{BmError, Result};
use crate::models::FileEntry;

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// 目录遍历器
pub struct TreeWalker {
    /// 规范化、去重后的根目录
    roots: Vec<PathBuf>,
    /// 文件名匹配器
    matcher: NameMatcher,
    /// 最大递归深度
    max_depth: Option<usize>,
    /// 是否跳过隐藏文件和目录
    skip_hidden: bool,
    /// 不进入的目录（目标目录）
    exclude: Option<PathBuf>,
}

impl TreeWalker {
    /// 创建遍历器，任何根目录无法访问都是致命错误
    pub fn new(roots: &[PathBuf], matcher: NameMatcher) -> Result<Self> {
        Ok(Self {
            roots: prepare_roots(roots)?,
            matcher,
            max_depth: None,
            skip_hidden: false,
            exclude: None,
        })
    }

    /// 设置最大递归深度
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 设置是否跳过隐藏文件
    pub fn skip_hidden(mut self, skip_hidden: bool) -> Self {
        self.skip_hidden = skip_hidden;
        self
    }

    /// 设置不进入的目录
    pub fn exclude(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exclude = Some(dir.into());
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn matcher(&self) -> &NameMatcher {
        &self.matcher
    }

    /// 惰性遍历单个根目录
    ///
    /// 产出 `Ok(FileEntry)` 表示匹配文件；`Err` 中 `is_fatal()` 为真的
    /// 错误表示根目录本身不可读，其余为可跳过的单条目错误。
    pub fn walk<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = Result<FileEntry>> + 'a {
        let mut walker = WalkDir::new(root).follow_links(false);
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        walker
            .into_iter()
            .filter_entry(move |e| self.should_enter(e))
            .filter_map(move |item| match item {
                Ok(entry) => {
                    if !entry.file_type().is_file() || !self.matcher.matches_path(entry.path()) {
                        return None;
                    }
                    Some(FileEntry::from_dir_entry(&entry))
                }
                Err(e) => Some(Err(classify_walk_error(root, e))),
            })
    }

    /// 判断是否进入/保留某个条目
    fn should_enter(&self, entry: &DirEntry) -> bool {
        if let Some(ref exclude) = self.exclude {
            if entry.file_type().is_dir() && entry.path() == exclude.as_path() {
                return false;
            }
        }
        if self.skip_hidden && entry.depth() > 0 && is_hidden(entry) {
            return false;
        }
        true
    }
}

/// 规范化根目录，去除重复以及被其他根目录包含的根目录
fn prepare_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut canonical = Vec::with_capacity(roots.len());
    for root in roots {
        let path = fs::canonicalize(root).map_err(|e| BmError::RootUnreadable {
            path: root.display().to_string(),
            source: e,
        })?;
        canonical.push(path);
    }

    // 外层目录排在前面，之后只需检查已保留的根目录
    canonical.sort_by_key(|p| p.components().count());

    let mut unique: Vec<PathBuf> = Vec::with_capacity(canonical.len());
    for path in canonical {
        if !unique.iter().any(|kept| path.starts_with(kept)) {
            unique.push(path);
        }
    }
    Ok(unique)
}

/// 深度为 0 的错误来自根目录本身，属于致命错误
fn classify_walk_error(root: &Path, err: walkdir::Error) -> BmError {
    let path = err
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| root.display().to_string());

    if err.depth() == 0 {
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk failed"));
        return BmError::RootUnreadable { path, source };
    }

    BmError::WalkEntry {
        path,
        reason: err.to_string(),
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().as_encoded_bytes().starts_with(b".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::matcher::MatchKind;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"data").unwrap();
    }

    fn names(walker: &TreeWalker) -> Vec<String> {
        let mut names: Vec<String> = walker
            .roots()
            .iter()
            .flat_map(|root| walker.walk(root))
            .map(|r| r.unwrap().name.to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn suffix(pattern: &str) -> NameMatcher {
        NameMatcher::new(MatchKind::Suffix, pattern).unwrap()
    }

    #[test]
    fn test_walk_matches_files_only() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.mkv"));
        touch(&tmp.path().join("nested/deeper/b.mkv"));
        touch(&tmp.path().join("nested/c.txt"));
        fs::create_dir_all(tmp.path().join("dir.mkv")).unwrap();

        let walker = TreeWalker::new(&[tmp.path().to_path_buf()], suffix(".mkv")).unwrap();
        assert_eq!(names(&walker), vec!["a.mkv", "b.mkv"]);
    }

    #[test]
    fn test_walk_yields_absolute_paths() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.mkv"));

        let walker = TreeWalker::new(&[tmp.path().to_path_buf()], suffix(".mkv")).unwrap();
        let entry = walker.walk(&walker.roots()[0]).next().unwrap().unwrap();
        assert!(entry.path.is_absolute());
        assert_eq!(entry.size, 4);
    }

    #[test]
    fn test_nested_and_duplicate_roots_are_deduplicated() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("sub/a.mkv"));
        touch(&tmp.path().join("b.mkv"));

        let roots = vec![
            tmp.path().join("sub"),
            tmp.path().to_path_buf(),
            tmp.path().join("sub/../sub"),
        ];
        let walker = TreeWalker::new(&roots, suffix(".mkv")).unwrap();
        assert_eq!(walker.roots().len(), 1);
        assert_eq!(names(&walker), vec!["a.mkv", "b.mkv"]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("does-not-exist");

        let result = TreeWalker::new(&[missing], suffix(".mkv"));
        match result {
            Err(e) => assert!(e.is_fatal()),
            Ok(_) => panic!("expected root error"),
        }
    }

    #[test]
    fn test_destination_is_not_descended() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.mkv"));
        touch(&tmp.path().join("out/already.mkv"));

        let root = fs::canonicalize(tmp.path()).unwrap();
        let walker = TreeWalker::new(&[root.clone()], suffix(".mkv"))
            .unwrap()
            .exclude(root.join("out"));
        assert_eq!(names(&walker), vec!["a.mkv"]);
    }

    #[test]
    fn test_max_depth_and_hidden() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("top.log"));
        touch(&tmp.path().join(".hidden.log"));
        touch(&tmp.path().join(".cache/inner.log"));
        touch(&tmp.path().join("a/b/deep.log"));

        let root = vec![tmp.path().to_path_buf()];

        let all = TreeWalker::new(&root, suffix(".log")).unwrap();
        assert_eq!(names(&all), vec![".hidden.log", "deep.log", "inner.log", "top.log"]);

        let shallow = TreeWalker::new(&root, suffix(".log"))
            .unwrap()
            .max_depth(Some(1));
        assert_eq!(names(&shallow), vec![".hidden.log", "top.log"]);

        let visible = TreeWalker::new(&root, suffix(".log"))
            .unwrap()
            .skip_hidden(true);
        assert_eq!(names(&visible), vec!["deep.log", "top.log"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_hidden_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("top.log"));
        touch(&tmp.path().join(OsStr::from_bytes(b".\xff.log")));
        touch(&tmp.path().join(OsStr::from_bytes(b".\xfe")).join("inner.log"));

        let root = vec![tmp.path().to_path_buf()];
        let visible = TreeWalker::new(&root, suffix(".log"))
            .unwrap()
            .skip_hidden(true);
        assert_eq!(names(&visible), vec!["top.log"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_recoverable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.mkv"));
        touch(&tmp.path().join("open/b.mkv"));
        touch(&tmp.path().join("locked/c.mkv"));
        let locked = tmp.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root 不受目录权限限制
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let walker = TreeWalker::new(&[tmp.path().to_path_buf()], suffix(".mkv")).unwrap();
        let (found, errors): (Vec<_>, Vec<_>) = walker
            .walk(&walker.roots()[0])
            .partition(|r| r.is_ok());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let mut found: Vec<String> = found
            .into_iter()
            .map(|r| r.unwrap().name.to_string_lossy().to_string())
            .collect();
        found.sort();
        assert_eq!(found, vec!["a.mkv", "b.mkv"]);

        assert_eq!(errors.len(), 1);
        match errors.into_iter().next().unwrap() {
            Err(e) => {
                assert!(!e.is_fatal());
                assert!(matches!(e, BmError::WalkEntry { .. }));
            }
            Ok(_) => unreachable!(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_matched() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("real.mkv"));
        std::os::unix::fs::symlink(tmp.path().join("real.mkv"), tmp.path().join("link.mkv"))
            .unwrap();

        let walker = TreeWalker::new(&[tmp.path().to_path_buf()], suffix(".mkv")).unwrap();
        assert_eq!(names(&walker), vec!["real.mkv"]);
    }
}
