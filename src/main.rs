use chrono::Local;
use clap::{Arg, ArgAction, ArgMatches, Command};
use keyword_scan::finder::config::{DEFAULT_DIRECTORY, DEFAULT_KEYWORDS};
use keyword_scan::finder::{
    encoding_for_label, list_files, run_worker, scan_all, strategy_for, ConcurrencyMode,
    KeywordSet, ScanConfig, ScanError, ScanOptions, ScanReport, WORKER_COMMAND,
};
use keyword_scan::utils::{init_logger, log_to_file};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

const USAGE: &str = r#"示例:
  keyword-scan
        扫描 ./test_files，关键词 homework、interesting，两种模式各跑一次

  keyword-scan --dir notes --keyword todo,fixme --mode threaded
        只用多线程模式扫描 notes 目录

  keyword-scan --workers 4 --timeout 30 --encoding gbk
        固定 4 个 worker，最多等待 30 秒，按 GBK 解码文件

说明:
  每个文件完整读入内存后按字面子串匹配，区分大小写。
  无法读取的文件会在 stderr 打印一行诊断信息，并视为没有匹配。
"#;

/// 命令行参数解析
fn parse_args() -> ArgMatches {
    Command::new("keyword-scan")
        .about("多线程 / 多进程关键词扫描工具")
        .after_help(USAGE)
        .arg(
            Arg::new("dir")
                .short('d')
                .long("dir")
                .help("要扫描的目录")
                .default_value(DEFAULT_DIRECTORY)
                .value_name("DIR"),
        )
        .arg(
            Arg::new("keyword")
                .short('k')
                .long("keyword")
                .help("要查找的关键词，可重复或用逗号分隔")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .default_values(DEFAULT_KEYWORDS.iter().copied())
                .value_name("KEYWORD"),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .help("并发模式")
                .value_parser(["threaded", "multiprocess", "both"])
                .default_value("both")
                .value_name("MODE"),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .help("worker 数量 (默认: 线程为 2×CPU，进程为 CPU 数)")
                .value_name("WORKERS")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("等待所有 worker 的最长时间（秒）")
                .value_name("SECS")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("encoding")
                .long("encoding")
                .help("文件编码")
                .default_value("utf-8")
                .value_name("ENCODING"),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("同时扫描子目录")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .help("在终端显示进度条")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .help("输出运行日志并把报告追加到日志文件")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new(WORKER_COMMAND)
                .hide(true)
                .about("从 stdin 读取一个分块并扫描（由多进程模式内部使用）")
                .arg(
                    Arg::new("keyword")
                        .long("keyword")
                        .action(ArgAction::Append)
                        .required(true)
                        .allow_hyphen_values(true),
                )
                .arg(Arg::new("encoding").long("encoding").default_value("utf-8")),
        )
        .get_matches()
}

/// 创建扫描配置，同时返回要运行的模式
fn create_scan_config(
    matches: &ArgMatches,
) -> Result<(ScanConfig, Vec<ConcurrencyMode>), String> {
    let mut config = ScanConfig::new();

    if let Some(dir) = matches.get_one::<String>("dir") {
        config.directory = PathBuf::from(dir);
    }

    let keywords = matches
        .get_many::<String>("keyword")
        .into_iter()
        .flatten()
        .filter(|k| !k.is_empty())
        .cloned();
    config.keywords = KeywordSet::new(keywords).map_err(|e| e.to_string())?;

    config.workers = matches.get_one::<usize>("workers").copied();

    if let Some(secs) = matches.get_one::<f64>("timeout") {
        if *secs <= 0.0 {
            return Err(format!("超时时间必须是正数: {}", secs));
        }
        // NaN、无穷大和超出 Duration 范围的值都在这里被拒绝
        let timeout = Duration::try_from_secs_f64(*secs)
            .map_err(|_| format!("超时时间必须是正数: {}", secs))?;
        config.timeout = Some(timeout);
    }

    if let Some(label) = matches.get_one::<String>("encoding") {
        config.encoding = encoding_for_label(label).map_err(|e| e.to_string())?;
    }

    config.recursive = matches.get_flag("recursive");
    config.progress = matches.get_flag("progress");

    let modes = match matches.get_one::<String>("mode").map(String::as_str) {
        None | Some("both") => vec![ConcurrencyMode::Threaded, ConcurrencyMode::Multiprocess],
        Some(mode) => vec![mode.parse::<ConcurrencyMode>()?],
    };
    if let Some(mode) = modes.first() {
        config.mode = *mode;
    }

    Ok((config, modes))
}

/// 格式化一次扫描的报告
fn format_report(mode: ConcurrencyMode, keywords: &KeywordSet, report: &ScanReport) -> String {
    let mut out = format!("=== {} ===\n", mode.title());
    out.push_str(&format!(
        "开始时间: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!(
        "扫描 {} 个文件，使用 {} 个 worker\n",
        report.files, report.workers
    ));

    out.push_str("结果:\n");
    // 完成顺序不固定，按路径排序后输出；关键词保持用户给出的顺序
    let merged = report.merged.normalized();
    for keyword in keywords.iter() {
        let files = merged.get(keyword).unwrap_or_default();
        let list: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
        out.push_str(&format!("  {}: [{}]\n", keyword, list.join(", ")));
    }

    if !report.unreadable.is_empty() {
        out.push_str(&format!("无法读取的文件: {}\n", report.unreadable.len()));
        for file in &report.unreadable {
            out.push_str(&format!("  {}\n", file.path.display()));
        }
    }

    if report.incomplete {
        out.push_str(&format!("失败的分块: {} (结果不完整)\n", report.faults.len()));
        for fault in &report.faults {
            out.push_str(&format!(
                "  分块 {} ({} 个文件): {}\n",
                fault.chunk,
                fault.files.len(),
                fault.fault
            ));
        }
    }

    out.push_str(&format!("耗时: {:.2} 秒\n", report.elapsed.as_secs_f64()));
    out
}

/// 按指定模式扫描一次
fn scan_with_mode(
    mode: ConcurrencyMode,
    files: &[PathBuf],
    config: &ScanConfig,
) -> Result<ScanReport, ScanError> {
    let strategy = strategy_for(mode)?;
    scan_all(files, &config.keywords, strategy.as_ref(), &ScanOptions::from(config))
}

/// worker 子进程入口，返回退出码
fn worker_main(matches: &ArgMatches) -> i32 {
    let keywords = matches
        .get_many::<String>("keyword")
        .into_iter()
        .flatten()
        .cloned();
    let keywords = match KeywordSet::new(keywords) {
        Ok(k) => k,
        Err(e) => {
            eprintln!("worker 参数错误: {}", e);
            return 2;
        }
    };

    let label = matches
        .get_one::<String>("encoding")
        .map(String::as_str)
        .unwrap_or("utf-8");
    let encoding = match encoding_for_label(label) {
        Ok(enc) => enc,
        Err(e) => {
            eprintln!("worker 参数错误: {}", e);
            return 2;
        }
    };

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    match run_worker(stdin, stdout, &keywords, encoding) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("worker 执行失败: {}", e);
            1
        }
    }
}

fn main() {
    let matches = parse_args();

    if let Some(worker) = matches.subcommand_matches(WORKER_COMMAND) {
        process::exit(worker_main(worker));
    }

    // 初始化日志
    let enable_log = matches.get_flag("log");
    if let Err(e) = init_logger(enable_log) {
        eprintln!("初始化日志失败: {}", e);
    }

    let (config, modes) = match create_scan_config(&matches) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("错误: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("错误: {}", e);
        process::exit(1);
    }

    // 两种模式使用同一份文件列表
    let files = match list_files(&config.directory, config.recursive) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("错误: {}", e);
            process::exit(1);
        }
    };

    for (i, mode) in modes.iter().enumerate() {
        if i > 0 {
            println!();
        }
        match scan_with_mode(*mode, &files, &config) {
            Ok(report) => {
                let text = format_report(*mode, &config.keywords, &report);
                print!("{}", text);
                if enable_log {
                    if let Err(e) = log_to_file(&text) {
                        eprintln!("记录日志失败: {}", e);
                    }
                }
            }
            Err(e) => {
                eprintln!("{} 扫描失败: {}", mode.title(), e);
                process::exit(1);
            }
        }
    }
}
