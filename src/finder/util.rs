use crate::finder::error::ScanError;
use encoding_rs::Encoding;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 列出目录中的普通文件，按文件名排序
///
/// 默认只看目录本身这一层；`recursive` 为真时深入子目录。
/// 子项无法访问时打印诊断信息并跳过。
pub fn list_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::DirectoryNotFound(dir.to_path_buf()));
    }

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            Err(e) => {
                // 根目录本身读不了就没法继续
                if e.depth() == 0 {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk error"));
                    return Err(ScanError::Io { path, source });
                }
                eprintln!("跳过无法访问的条目: {}", e);
            }
        }
    }

    log::info!("在 {} 中找到 {} 个文件", dir.display(), files.len());
    Ok(files)
}

/// 读取整个文件并按指定编码解码
///
/// 解码不做替换：只要有非法字节序列就返回 `ScanError::Decode`。
pub fn read_text(path: &Path, encoding: &'static Encoding) -> Result<String, ScanError> {
    let bytes = fs::read(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| ScanError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name().to_string(),
        })
}

/// 逻辑 CPU 数量，获取失败时退回 4
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{GBK, UTF_8};

    #[test]
    fn lists_only_regular_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), "c").unwrap();

        let files = list_files(dir.path(), false).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);

        let all = list_files(dir.path(), true).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|p| p.ends_with("nested/c.txt")));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        assert!(matches!(
            list_files(&missing, false),
            Err(ScanError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn read_text_decodes_with_requested_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gbk.txt");
        let (bytes, _, _) = GBK.encode("作业 homework");
        fs::write(&path, &bytes).unwrap();

        assert_eq!(read_text(&path, GBK).unwrap(), "作业 homework");
        assert!(matches!(
            read_text(&path, UTF_8),
            Err(ScanError::Decode { .. })
        ));
    }

    #[test]
    fn read_text_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_text(&dir.path().join("nope.txt"), UTF_8).unwrap_err();
        assert!(matches!(err, ScanError::Io { .. }));
    }
}
