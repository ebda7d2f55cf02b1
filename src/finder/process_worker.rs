//! 多进程执行方式
//!
//! 父进程以隐藏的 `worker` 子命令重新启动自身：
//! 分块通过 stdin 以 JSON 数组传入，`ChunkResult` 通过 stdout 以 JSON 传回，
//! 诊断信息直接写到继承的 stderr。

use crate::finder::config::{ConcurrencyMode, KeywordSet};
use crate::finder::dispatcher::{ChunkReport, WorkerGroup, WorkerStrategy};
use crate::finder::error::{ScanError, WorkerFault};
use crate::finder::keyword_finder::scan_chunk;
use crate::finder::results::ChunkResult;
use encoding_rs::Encoding;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// worker 子命令名
pub const WORKER_COMMAND: &str = "worker";

/// 读取线程检查子进程是否退出的间隔
const REAP_INTERVAL: Duration = Duration::from_millis(10);

/// 相互隔离的多进程执行方式
#[derive(Debug, Clone)]
pub struct ProcessStrategy {
    program: PathBuf,
}

impl ProcessStrategy {
    /// 使用指定的可执行文件作为 worker
    pub fn new(program: impl Into<PathBuf>) -> Self {
        ProcessStrategy {
            program: program.into(),
        }
    }

    /// 使用当前可执行文件作为 worker
    pub fn current_exe() -> Result<Self, ScanError> {
        let program = std::env::current_exe().map_err(|source| ScanError::WorkerSpawn { source })?;
        Ok(Self::new(program))
    }

    fn spawn_child(
        &self,
        keywords: &KeywordSet,
        encoding: &'static Encoding,
    ) -> Result<Child, ScanError> {
        let mut command = Command::new(&self.program);
        command
            .arg(WORKER_COMMAND)
            .arg(format!("--encoding={}", encoding.name()));
        for keyword in keywords.iter() {
            // 用 `=` 连接，避免以 `-` 开头的关键词被当成参数
            command.arg(format!("--keyword={}", keyword));
        }

        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ScanError::WorkerSpawn { source })
    }
}

/// 已启动的子进程；由各自的读取线程负责回收
struct ProcessGroup {
    children: Vec<Arc<Mutex<Child>>>,
}

impl ProcessGroup {
    fn abandon_all(&mut self) {
        let started: Vec<usize> = (0..self.children.len()).collect();
        self.abandon(&started);
    }
}

impl WorkerGroup for ProcessGroup {
    fn abandon(&mut self, chunks: &[usize]) {
        for &chunk in chunks {
            let Some(child) = self.children.get(chunk) else {
                continue;
            };
            // 读取线程只在 try_wait 期间持有锁
            let mut child = match child.lock() {
                Ok(child) => child,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Ok(Some(_)) = child.try_wait() {
                log::debug!("分块 {} 的进程已经退出", chunk);
                continue;
            }
            match child.kill() {
                Ok(()) => log::warn!("已结束超时的 worker 进程 {}", child.id()),
                Err(e) => log::debug!("结束 worker 进程 {} 失败: {}", child.id(), e),
            }
        }
    }
}

/// 等待子进程退出，不在等待期间占住锁
fn reap(child: &Mutex<Child>) -> io::Result<ExitStatus> {
    loop {
        let polled = match child.lock() {
            Ok(mut child) => child.try_wait(),
            Err(poisoned) => poisoned.into_inner().try_wait(),
        };
        match polled? {
            Some(status) => return Ok(status),
            None => thread::sleep(REAP_INTERVAL),
        }
    }
}

impl WorkerStrategy for ProcessStrategy {
    fn mode(&self) -> ConcurrencyMode {
        ConcurrencyMode::Multiprocess
    }

    fn launch(
        &self,
        chunks: Vec<Vec<PathBuf>>,
        keywords: &KeywordSet,
        encoding: &'static Encoding,
        results: Sender<ChunkReport>,
    ) -> Result<Box<dyn WorkerGroup>, ScanError> {
        let mut group = ProcessGroup {
            children: Vec::with_capacity(chunks.len()),
        };

        for (chunk, files) in chunks.iter().enumerate() {
            let mut child = match self.spawn_child(keywords, encoding) {
                Ok(child) => child,
                Err(e) => {
                    // 已经启动的进程不再需要
                    group.abandon_all();
                    return Err(e);
                }
            };
            log::debug!("分块 {} -> 进程 {}", chunk, child.id());

            if let Some(mut stdin) = child.stdin.take() {
                // 写失败说明子进程已经退出，交给退出码处理
                if let Err(e) = serde_json::to_writer(&mut stdin, files) {
                    log::debug!("向 worker 进程写入分块失败: {}", e);
                }
            }

            let stdout = child.stdout.take();
            let child = Arc::new(Mutex::new(child));
            let reaper = Arc::clone(&child);
            group.children.push(child);

            let results = results.clone();
            let spawned = thread::Builder::new()
                .name(format!("kwscan-reader-{}", chunk))
                .spawn(move || {
                    let mut output = Vec::new();
                    let read = match stdout {
                        Some(mut stdout) => stdout.read_to_end(&mut output).map(|_| ()),
                        None => Ok(()),
                    };
                    let status = reap(&reaper);
                    let outcome = decode_worker_output(status, read, &output);
                    let _ = results.send(ChunkReport { chunk, outcome });
                });
            if let Err(source) = spawned {
                group.abandon_all();
                // 这个进程没有读取线程，由这里回收
                if let Some(last) = group.children.last() {
                    let waited = match last.lock() {
                        Ok(mut child) => child.wait(),
                        Err(poisoned) => poisoned.into_inner().wait(),
                    };
                    if let Err(e) = waited {
                        log::debug!("回收 worker 进程失败: {}", e);
                    }
                }
                return Err(ScanError::WorkerSpawn { source });
            }
        }

        Ok(Box::new(group))
    }
}

/// 把子进程的退出状态和输出转换成分块结果
fn decode_worker_output(
    status: io::Result<ExitStatus>,
    read: io::Result<()>,
    output: &[u8],
) -> Result<ChunkResult, WorkerFault> {
    let status = status.map_err(|_| WorkerFault::Exited { code: None })?;
    if !status.success() {
        return Err(WorkerFault::Exited {
            code: status.code(),
        });
    }
    read.map_err(|e| WorkerFault::Protocol(e.to_string()))?;
    serde_json::from_slice(output).map_err(|e| WorkerFault::Protocol(e.to_string()))
}

/// worker 子进程的入口：从 `input` 读分块，扫描后把结果写到 `output`
pub fn run_worker<R, W>(
    input: R,
    mut output: W,
    keywords: &KeywordSet,
    encoding: &'static Encoding,
) -> Result<(), ScanError>
where
    R: Read,
    W: Write,
{
    let files: Vec<PathBuf> = serde_json::from_reader(input)?;
    let result = scan_chunk(&files, keywords, encoding);
    serde_json::to_writer(&mut output, &result)?;
    output.flush().map_err(|source| ScanError::Io {
        path: PathBuf::from("<stdout>"),
        source,
    })
}
