use log::{LevelFilter, SetLoggerError};
use simple_logger::SimpleLogger;
use std::fs::OpenOptions;
use std::io::Write;

/// 报告日志文件名
pub const LOG_FILE: &str = "keyword_scan.log";

/// 初始化日志系统
///
/// 日志写到 stderr，不会混进 stdout 的报告；设置了 `RUST_LOG` 时以它为准。
pub fn init_logger(enable_log: bool) -> Result<(), SetLoggerError> {
    let level = if enable_log {
        LevelFilter::Info
    } else {
        LevelFilter::Off
    };
    SimpleLogger::new().with_level(level).env().init()
}

/// 把扫描报告追加到日志文件
pub fn log_to_file(report: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(LOG_FILE)?;
    writeln!(file, "{}", report)
}
