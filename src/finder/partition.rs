use std::path::PathBuf;

/// 计算 worker 数量
///
/// 默认取 `scaling_factor × cpus`，`requested` 可覆盖；结果不超过文件数。
pub fn worker_count(
    file_count: usize,
    scaling_factor: usize,
    cpus: usize,
    requested: Option<usize>,
) -> usize {
    let wanted = requested.unwrap_or_else(|| scaling_factor.max(1) * cpus.max(1));
    wanted.min(file_count)
}

/// 把文件列表切成 `workers` 个连续、互不重叠的分块
///
/// 每块 `len / workers` 个文件，余数全部并入最后一块，
/// 保证每个文件恰好分到一个 worker。
pub fn partition(files: &[PathBuf], workers: usize) -> Vec<Vec<PathBuf>> {
    if files.is_empty() || workers == 0 {
        return Vec::new();
    }
    let workers = workers.min(files.len());
    let chunk_size = files.len() / workers;

    (0..workers)
        .map(|i| {
            let start = i * chunk_size;
            let end = if i + 1 == workers {
                files.len()
            } else {
                start + chunk_size
            };
            files[start..end].to_vec()
        })
        .collect()
}
