use crate::finder::config::{ConcurrencyMode, KeywordSet};
use crate::finder::dispatcher::{ChunkReport, WorkerGroup, WorkerStrategy};
use crate::finder::error::{ScanError, WorkerFault};
use crate::finder::keyword_finder::scan_chunk;
use crate::finder::results::ChunkResult;
use encoding_rs::Encoding;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// 共享内存的多线程执行方式
///
/// 每次扫描创建一个线程数与分块数相同的 rayon 线程池，
/// 每个线程处理一个分块。
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadStrategy;

/// 线程池在所有任务结束后自行退出，这里只保留引用
struct ThreadGroup {
    _pool: rayon::ThreadPool,
}

impl WorkerGroup for ThreadGroup {
    fn abandon(&mut self, chunks: &[usize]) {
        // 线程无法被强制终止，只能放弃它们的结果
        log::warn!("放弃 {} 个仍在运行的线程: {:?}", chunks.len(), chunks);
    }
}

impl WorkerStrategy for ThreadStrategy {
    fn mode(&self) -> ConcurrencyMode {
        ConcurrencyMode::Threaded
    }

    fn launch(
        &self,
        chunks: Vec<Vec<PathBuf>>,
        keywords: &KeywordSet,
        encoding: &'static Encoding,
        results: Sender<ChunkReport>,
    ) -> Result<Box<dyn WorkerGroup>, ScanError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(chunks.len().max(1))
            .thread_name(|i| format!("kwscan-worker-{}", i))
            .build()
            .map_err(|e| ScanError::ThreadPool(e.to_string()))?;

        let keywords = Arc::new(keywords.clone());
        for (chunk, files) in chunks.into_iter().enumerate() {
            let keywords = Arc::clone(&keywords);
            let results = results.clone();
            pool.spawn(move || {
                let outcome = run_guarded(|| scan_chunk(&files, &keywords, encoding));
                // 接收端已放弃（超时）时忽略
                let _ = results.send(ChunkReport { chunk, outcome });
            });
        }

        Ok(Box::new(ThreadGroup { _pool: pool }))
    }
}

/// 执行 worker 任务，把 panic 转成 `WorkerFault::Panicked`
pub(crate) fn run_guarded<F>(work: F) -> Result<ChunkResult, WorkerFault>
where
    F: FnOnce() -> ChunkResult,
{
    panic::catch_unwind(AssertUnwindSafe(work))
        .map_err(|payload| WorkerFault::Panicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "未知错误".to_string()
    }
}
