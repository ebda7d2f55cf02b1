use crate::finder::config::KeywordSet;
use crate::finder::error::ScanError;
use crate::finder::results::{ChunkResult, MatchMap, UnreadableFile};
use crate::finder::util::read_text;
use encoding_rs::Encoding;
use std::path::{Path, PathBuf};

/// 检查单个文件包含哪些关键词
///
/// 读取失败时返回错误，不打印任何信息。
pub fn find_keywords(
    path: &Path,
    keywords: &KeywordSet,
    encoding: &'static Encoding,
) -> Result<MatchMap, ScanError> {
    let content = read_text(path, encoding)?;

    let mut found = MatchMap::new(keywords);
    for keyword in keywords.iter() {
        // 只关心是否出现，不计次数
        if content.contains(keyword) {
            found.record(keyword, path);
        }
    }
    Ok(found)
}

/// 匹配单个文件，读取失败时在 stderr 打印一行诊断信息
fn match_or_report(
    path: &Path,
    keywords: &KeywordSet,
    encoding: &'static Encoding,
) -> Result<MatchMap, UnreadableFile> {
    find_keywords(path, keywords, encoding).map_err(|e| {
        // 错误信息本身已经带有路径
        eprintln!("读取文件时出错: {}", e);
        UnreadableFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        }
    })
}

/// 根据关键词匹配单个文件
///
/// 文件无法读取时打印一行诊断信息，并视为没有任何关键词。
pub fn match_file(path: &Path, keywords: &KeywordSet, encoding: &'static Encoding) -> MatchMap {
    match_or_report(path, keywords, encoding).unwrap_or_else(|_| MatchMap::new(keywords))
}

/// 依次扫描一个分块中的所有文件
pub fn scan_chunk(
    paths: &[PathBuf],
    keywords: &KeywordSet,
    encoding: &'static Encoding,
) -> ChunkResult {
    let mut result = ChunkResult::new(keywords);

    for path in paths {
        match match_or_report(path, keywords, encoding) {
            Ok(found) => result.matches.merge(found),
            Err(unreadable) => result.unreadable.push(unreadable),
        }
    }

    log::debug!(
        "分块扫描完成: {} 个文件, {} 条匹配, {} 个无法读取",
        paths.len(),
        result.matches.total_matches(),
        result.unreadable.len()
    );
    result
}
