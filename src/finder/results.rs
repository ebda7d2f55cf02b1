use crate::finder::config::KeywordSet;
use crate::finder::error::WorkerFault;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 关键词到文件列表的映射
///
/// 既用于单个 worker 的部分结果，也用于合并后的最终结果。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchMap {
    entries: BTreeMap<String, Vec<PathBuf>>,
}

impl MatchMap {
    /// 为每个关键词建立一个空列表
    pub fn new(keywords: &KeywordSet) -> Self {
        MatchMap {
            entries: keywords.iter().map(|k| (k.to_string(), Vec::new())).collect(),
        }
    }

    /// 记录 `path` 包含 `keyword`
    pub fn record(&mut self, keyword: &str, path: &Path) {
        self.entries
            .entry(keyword.to_string())
            .or_default()
            .push(path.to_path_buf());
    }

    /// 把另一份结果按关键词追加到当前结果后面
    pub fn merge(&mut self, other: MatchMap) {
        for (keyword, files) in other.entries {
            self.entries.entry(keyword).or_default().extend(files);
        }
    }

    /// 每个列表排序后的副本，用于与完成顺序无关的比较
    pub fn normalized(&self) -> MatchMap {
        let mut entries = self.entries.clone();
        for files in entries.values_mut() {
            files.sort();
        }
        MatchMap { entries }
    }

    pub fn get(&self, keyword: &str) -> Option<&[PathBuf]> {
        self.entries.get(keyword).map(Vec::as_slice)
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// 所有关键词的匹配条目总数
    pub fn total_matches(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// 按出队顺序合并所有部分结果
///
/// 即使没有任何部分结果，每个关键词也会出现在结果中。
pub fn merge_all<I>(keywords: &KeywordSet, partials: I) -> MatchMap
where
    I: IntoIterator<Item = MatchMap>,
{
    let mut merged = MatchMap::new(keywords);
    for partial in partials {
        merged.merge(partial);
    }
    merged
}

/// 无法读取的文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadableFile {
    pub path: PathBuf,
    pub error: String,
}

/// 一个 worker 扫描一个分块后的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResult {
    pub matches: MatchMap,
    #[serde(default)]
    pub unreadable: Vec<UnreadableFile>,
}

impl ChunkResult {
    pub fn new(keywords: &KeywordSet) -> Self {
        ChunkResult {
            matches: MatchMap::new(keywords),
            unreadable: Vec::new(),
        }
    }
}

/// 没有交回结果的分块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFault {
    pub chunk: usize,
    pub files: Vec<PathBuf>,
    pub fault: WorkerFault,
}

/// 一次扫描的完整报告
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub merged: MatchMap,
    pub unreadable: Vec<UnreadableFile>,
    pub faults: Vec<ChunkFault>,
    pub workers: usize,
    pub files: usize,
    pub elapsed: Duration,
    /// 有分块没有交回结果时为真
    pub incomplete: bool,
}

impl ScanReport {
    /// 没有文件时的报告：不启动任何 worker
    pub fn empty(keywords: &KeywordSet) -> Self {
        ScanReport {
            merged: MatchMap::new(keywords),
            unreadable: Vec::new(),
            faults: Vec::new(),
            workers: 0,
            files: 0,
            elapsed: Duration::ZERO,
            incomplete: false,
        }
    }
}
