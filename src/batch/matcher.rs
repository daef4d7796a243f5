//! # 文件名匹配器
//!
//! 根据单一模式判断文件基名（不含父目录）是否匹配。
//!
//! ## 功能
//! - 后缀 / 前缀 / 子串三种匹配方式
//! - 可选忽略大小写
//!
//! ## 依赖关系
//! - 被 `batch/walker.rs` 调用
//! - 由 `commands/relocate.rs` 根据命令行参数构造

use crate::error::{BmError, Result};

use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

/// 匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// 基名以模式结尾
    Suffix,
    /// 基名以模式开头
    Prefix,
    /// 基名包含模式
    Substring,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Suffix => write!(f, "suffix"),
            MatchKind::Prefix => write!(f, "prefix"),
            MatchKind::Substring => write!(f, "substring"),
        }
    }
}

/// 文件名匹配器，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatcher {
    kind: MatchKind,
    pattern: String,
    ignore_case: bool,
}

impl NameMatcher {
    /// 创建新的匹配器，模式不能为空
    pub fn new(kind: MatchKind, pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(BmError::Usage(format!("the {} pattern must not be empty", kind)));
        }
        Ok(Self {
            kind,
            pattern,
            ignore_case: false,
        })
    }

    /// 从三个可选模式构造匹配器，必须恰好设置其中一个
    pub fn from_options(
        suffix: Option<&str>,
        prefix: Option<&str>,
        substring: Option<&str>,
    ) -> Result<Self> {
        let configured: Vec<(MatchKind, &str)> = [
            (MatchKind::Suffix, suffix),
            (MatchKind::Prefix, prefix),
            (MatchKind::Substring, substring),
        ]
        .into_iter()
        .filter_map(|(kind, pattern)| pattern.map(|p| (kind, p)))
        .collect();

        match configured.as_slice() {
            [(kind, pattern)] => Self::new(*kind, *pattern),
            [] => Err(BmError::Usage(
                "one of --suffix, --prefix or --substring is required".to_string(),
            )),
            _ => Err(BmError::Usage(
                "only one of --suffix, --prefix or --substring may be given".to_string(),
            )),
        }
    }

    /// 设置是否忽略大小写
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        if ignore_case {
            self.pattern = self.pattern.to_lowercase();
        }
        self
    }

    /// 检查基名是否匹配
    pub fn matches(&self, name: &str) -> bool {
        let name: Cow<'_, str> = if self.ignore_case {
            Cow::Owned(name.to_lowercase())
        } else {
            Cow::Borrowed(name)
        };

        match self.kind {
            MatchKind::Suffix => name.ends_with(&self.pattern),
            MatchKind::Prefix => name.starts_with(&self.pattern),
            MatchKind::Substring => name.contains(&self.pattern),
        }
    }

    /// 检查 `OsStr` 形式的基名（非 UTF-8 部分按有损方式转换）
    pub fn matches_os(&self, name: &OsStr) -> bool {
        self.matches(&name.to_string_lossy())
    }

    /// 仅取路径的最后一段参与匹配
    pub fn matches_path(&self, path: &Path) -> bool {
        match path.file_name() {
            Some(name) => self.matches_os(name),
            None => false,
        }
    }
}

impl fmt::Display for NameMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.pattern)?;
        if self.ignore_case {
            write!(f, " (ignore case)")?;
        }
        Ok(())
    }
}
