//! 多线程 / 多进程关键词扫描工具
//!
//! 列出目录中的文件，按连续分块交给若干 worker 并行扫描，
//! 再把各 worker 的部分结果合并为 `关键词 -> 文件列表` 的映射。

pub mod finder;
pub mod utils;

pub use finder::{
    run_scan, scan_all, ConcurrencyMode, KeywordSet, MatchMap, ProcessStrategy, ScanConfig,
    ScanError, ScanOptions, ScanReport, ThreadStrategy, WorkerFault, WorkerStrategy,
};
