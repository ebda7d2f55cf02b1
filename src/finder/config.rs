use crate::finder::error::ScanError;
use encoding_rs::{Encoding, UTF_8};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 默认关键词
pub const DEFAULT_KEYWORDS: &[&str] = &["homework", "interesting"];

/// 默认扫描目录
pub const DEFAULT_DIRECTORY: &str = "test_files";

/// 关键词集合：有序、去重、区分大小写
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    words: Vec<String>,
}

impl KeywordSet {
    /// 创建关键词集合，重复的关键词只保留第一次出现
    pub fn new<I, S>(words: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for word in words {
            let word = word.into();
            // 空串是任何文本的子串
            if word.is_empty() {
                return Err(ScanError::EmptyKeyword);
            }
            if !unique.contains(&word) {
                unique.push(word);
            }
        }

        if unique.is_empty() {
            return Err(ScanError::NoKeywords);
        }
        Ok(KeywordSet { words: unique })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        KeywordSet {
            words: DEFAULT_KEYWORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// 并发模型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// 共享内存的多线程
    Threaded,
    /// 相互隔离的多进程
    Multiprocess,
}

impl ConcurrencyMode {
    /// 报告中使用的标题
    pub fn title(&self) -> &'static str {
        match self {
            ConcurrencyMode::Threaded => "多线程模式",
            ConcurrencyMode::Multiprocess => "多进程模式",
        }
    }

    /// 每个 CPU 核心分配的 worker 数
    pub fn scaling_factor(&self) -> usize {
        match self {
            // 线程多开一倍以抵消 I/O 等待
            ConcurrencyMode::Threaded => 2,
            ConcurrencyMode::Multiprocess => 1,
        }
    }
}

impl fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcurrencyMode::Threaded => write!(f, "threaded"),
            ConcurrencyMode::Multiprocess => write!(f, "multiprocess"),
        }
    }
}

impl FromStr for ConcurrencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "threaded" | "thread" | "threads" => Ok(ConcurrencyMode::Threaded),
            "multiprocess" | "process" | "processes" => Ok(ConcurrencyMode::Multiprocess),
            other => Err(format!("未知的并发模式: {}", other)),
        }
    }
}

/// 按 WHATWG 标签查找编码
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, ScanError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ScanError::UnknownEncoding(label.to_string()))
}

/// 扫描配置结构体
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub keywords: KeywordSet,
    pub directory: PathBuf,
    pub mode: ConcurrencyMode,
    /// 覆盖自动计算的 worker 数量
    pub workers: Option<usize>,
    /// 等待所有 worker 的最长时间，`None` 表示一直等待
    pub timeout: Option<Duration>,
    pub encoding: &'static Encoding,
    pub recursive: bool,
    /// 在终端上显示分块进度条
    pub progress: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            keywords: KeywordSet::default(),
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            mode: ConcurrencyMode::Threaded,
            workers: None,
            timeout: None,
            encoding: UTF_8,
            recursive: false,
            progress: false,
        }
    }
}

impl ScanConfig {
    /// 创建新的扫描配置实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 检查配置是否可用于扫描
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.keywords.is_empty() {
            return Err(ScanError::NoKeywords);
        }
        if self.workers == Some(0) {
            return Err(ScanError::InvalidWorkerCount);
        }
        if !self.directory.is_dir() {
            return Err(ScanError::DirectoryNotFound(self.directory.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_set_drops_duplicates_in_order() {
        let set = KeywordSet::new(["b", "a", "b", "c"]).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn keyword_set_rejects_empty_input() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(KeywordSet::new(empty), Err(ScanError::NoKeywords)));
        assert!(matches!(
            KeywordSet::new(["ok", ""]),
            Err(ScanError::EmptyKeyword)
        ));
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("threaded".parse::<ConcurrencyMode>(), Ok(ConcurrencyMode::Threaded));
        assert_eq!(
            "Multiprocess".parse::<ConcurrencyMode>(),
            Ok(ConcurrencyMode::Multiprocess)
        );
        assert!("fibers".parse::<ConcurrencyMode>().is_err());
        assert_eq!(ConcurrencyMode::Threaded.scaling_factor(), 2);
        assert_eq!(ConcurrencyMode::Multiprocess.scaling_factor(), 1);
    }

    #[test]
    fn encoding_labels() {
        assert_eq!(encoding_for_label("utf8").unwrap(), UTF_8);
        assert_eq!(encoding_for_label("GBK").unwrap().name(), "GBK");
        assert!(matches!(
            encoding_for_label("klingon"),
            Err(ScanError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn validate_rejects_missing_directory_and_zero_workers() {
        let mut config = ScanConfig::new();
        config.directory = PathBuf::from("/definitely/not/here");
        assert!(matches!(
            config.validate(),
            Err(ScanError::DirectoryNotFound(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        config.directory = dir.path().to_path_buf();
        assert!(config.validate().is_ok());

        config.workers = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ScanError::InvalidWorkerCount)
        ));
    }
}
