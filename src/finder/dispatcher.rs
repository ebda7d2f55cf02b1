use crate::finder::config::{ConcurrencyMode, KeywordSet, ScanConfig};
use crate::finder::error::{ScanError, WorkerFault};
use crate::finder::partition::{partition, worker_count};
use crate::finder::process_worker::ProcessStrategy;
use crate::finder::results::{merge_all, ChunkFault, ChunkResult, ScanReport};
use crate::finder::thread_worker::ThreadStrategy;
use crate::finder::util::{available_parallelism, list_files};
use crate::utils::progress::ScanProgress;
use encoding_rs::{Encoding, UTF_8};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// worker 交回的一条消息
#[derive(Debug)]
pub struct ChunkReport {
    pub chunk: usize,
    pub outcome: Result<ChunkResult, WorkerFault>,
}

/// worker 的执行方式
///
/// 实现者为每个分块启动一个 worker，worker 结束时必须向 `results`
/// 发送恰好一条 `ChunkReport`。
pub trait WorkerStrategy: Send + Sync {
    fn mode(&self) -> ConcurrencyMode;

    fn scaling_factor(&self) -> usize {
        self.mode().scaling_factor()
    }

    fn launch(
        &self,
        chunks: Vec<Vec<PathBuf>>,
        keywords: &KeywordSet,
        encoding: &'static Encoding,
        results: Sender<ChunkReport>,
    ) -> Result<Box<dyn WorkerGroup>, ScanError>;
}

/// 已启动的一组 worker
pub trait WorkerGroup {
    /// 放弃仍未交回结果的分块
    fn abandon(&mut self, chunks: &[usize]);
}

/// 分发参数
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub workers: Option<usize>,
    pub timeout: Option<Duration>,
    pub encoding: &'static Encoding,
    pub show_progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            workers: None,
            timeout: None,
            encoding: UTF_8,
            show_progress: false,
        }
    }
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        ScanOptions {
            workers: config.workers,
            timeout: config.timeout,
            encoding: config.encoding,
            show_progress: config.progress,
        }
    }
}

/// 分块、并行扫描、收集并合并结果
pub fn scan_all(
    files: &[PathBuf],
    keywords: &KeywordSet,
    strategy: &dyn WorkerStrategy,
    options: &ScanOptions,
) -> Result<ScanReport, ScanError> {
    if options.workers == Some(0) {
        return Err(ScanError::InvalidWorkerCount);
    }
    if files.is_empty() {
        log::info!("没有需要扫描的文件");
        return Ok(ScanReport::empty(keywords));
    }

    let start = Instant::now();
    let workers = worker_count(
        files.len(),
        strategy.scaling_factor(),
        available_parallelism(),
        options.workers,
    );
    let chunks = partition(files, workers);
    log::info!(
        "[{}] {} 个文件分给 {} 个 worker",
        strategy.mode(),
        files.len(),
        chunks.len()
    );

    let progress = ScanProgress::new(chunks.len(), options.show_progress, strategy.mode().title());
    let (sender, receiver) = mpsc::channel();
    let mut group = strategy.launch(chunks.clone(), keywords, options.encoding, sender)?;

    let (reports, missing) = collect_reports(&receiver, chunks.len(), options.timeout, &progress);
    progress.finish();

    let mut faults = Vec::new();
    if !missing.is_empty() {
        log::warn!("{} 个分块没有交回结果", missing.len());
        group.abandon(&missing);
        for (chunk, fault) in missing.iter().map(|&c| (c, missing_fault(options.timeout))) {
            faults.push(ChunkFault {
                chunk,
                files: chunks[chunk].clone(),
                fault,
            });
        }
    }

    let mut partials = Vec::with_capacity(reports.len());
    let mut unreadable = Vec::new();
    for report in reports {
        match report.outcome {
            Ok(result) => {
                partials.push(result.matches);
                unreadable.extend(result.unreadable);
            }
            Err(fault) => {
                log::warn!("分块 {} 失败: {}", report.chunk, fault);
                faults.push(ChunkFault {
                    chunk: report.chunk,
                    files: chunks.get(report.chunk).cloned().unwrap_or_default(),
                    fault,
                });
            }
        }
    }
    faults.sort_by_key(|f| f.chunk);

    Ok(ScanReport {
        merged: merge_all(keywords, partials),
        unreadable,
        incomplete: !faults.is_empty(),
        faults,
        workers: chunks.len(),
        files: files.len(),
        elapsed: start.elapsed(),
    })
}

/// 按完成顺序接收 worker 的结果
///
/// 返回收到的结果和没有交回结果的分块编号。
/// 有 `timeout` 时最多等待这么久；所有发送端都关闭后也会提前结束。
pub(crate) fn collect_reports(
    receiver: &Receiver<ChunkReport>,
    expected: usize,
    timeout: Option<Duration>,
    progress: &ScanProgress,
) -> (Vec<ChunkReport>, Vec<usize>) {
    // 超出 Instant 范围的超时视为不设期限
    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
    let mut done = vec![false; expected];
    let mut reports = Vec::with_capacity(expected);

    while reports.len() < expected {
        let next = match deadline {
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                receiver.recv_timeout(left)
            }
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match next {
            Ok(report) => {
                if report.chunk < expected && !done[report.chunk] {
                    done[report.chunk] = true;
                    progress.chunk_done();
                    reports.push(report);
                } else {
                    log::warn!("忽略重复或越界的分块结果: {}", report.chunk);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("等待 worker 超时");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let missing = done
        .iter()
        .enumerate()
        .filter(|(_, finished)| !**finished)
        .map(|(i, _)| i)
        .collect();
    (reports, missing)
}

fn missing_fault(timeout: Option<Duration>) -> WorkerFault {
    match timeout {
        Some(_) => WorkerFault::TimedOut,
        None => WorkerFault::Protocol("worker 未交回结果".to_string()),
    }
}

/// 按配置选择执行方式
pub fn strategy_for(mode: ConcurrencyMode) -> Result<Box<dyn WorkerStrategy>, ScanError> {
    Ok(match mode {
        ConcurrencyMode::Threaded => Box::new(ThreadStrategy),
        ConcurrencyMode::Multiprocess => Box::new(ProcessStrategy::current_exe()?),
    })
}

/// 按配置执行一次完整扫描：列目录、分发、合并
pub fn run_scan(config: &ScanConfig) -> Result<ScanReport, ScanError> {
    config.validate()?;
    let files = list_files(&config.directory, config.recursive)?;
    let strategy = strategy_for(config.mode)?;
    scan_all(&files, &config.keywords, strategy.as_ref(), &ScanOptions::from(config))
}
