use std::path::PathBuf;
use thiserror::Error;

/// 扫描过程中的错误
///
/// `Io` 和 `Decode` 属于单个文件的读取错误，由文件匹配器就地处理；
/// 其余错误会终止本次扫描。
#[derive(Error, Debug)]
pub enum ScanError {
    // 配置
    #[error("至少需要一个关键词")]
    NoKeywords,

    #[error("关键词不能为空字符串")]
    EmptyKeyword,

    #[error("worker 数量必须大于 0")]
    InvalidWorkerCount,

    #[error("无法识别的编码: {0}")]
    UnknownEncoding(String),

    #[error("目录不存在: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    // 文件
    #[error("读取 {} 失败: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} 不是有效的 {encoding} 文本", path.display())]
    Decode { path: PathBuf, encoding: String },

    // 运行时
    #[error("创建线程池失败: {0}")]
    ThreadPool(String),

    #[error("启动 worker 进程失败: {source}")]
    WorkerSpawn {
        #[source]
        source: std::io::Error,
    },

    #[error("worker 数据格式错误: {0}")]
    WorkerProtocol(#[from] serde_json::Error),
}

/// 单个分块的 worker 没有交回结果的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerFault {
    #[error("worker 线程崩溃: {0}")]
    Panicked(String),

    #[error("worker 进程异常退出 (退出码: {code:?})")]
    Exited { code: Option<i32> },

    #[error("worker 输出无法解析: {0}")]
    Protocol(String),

    #[error("等待 worker 超时")]
    TimedOut,
}
