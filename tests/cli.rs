use std::fs;
use std::process::{Command, Output};

fn keyword_scan(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_keyword-scan"))
        .args(args)
        .output()
        .expect("run keyword-scan")
}

#[test]
fn default_run_prints_both_report_blocks() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    fs::write(tmp.path().join("a.txt"), "this is homework").unwrap();
    fs::write(tmp.path().join("b.txt"), "nothing interesting here").unwrap();
    let dir = tmp.path().to_str().unwrap();

    let output = keyword_scan(&["--dir", dir]);
    assert!(
        output.status.success(),
        "scan failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== 多线程模式 ==="), "got: {stdout}");
    assert!(stdout.contains("=== 多进程模式 ==="), "got: {stdout}");

    let a = tmp.path().join("a.txt");
    let b = tmp.path().join("b.txt");
    let homework = format!("homework: [{}]", a.display());
    let interesting = format!("interesting: [{}]", b.display());
    assert_eq!(stdout.matches(&homework).count(), 2, "got: {stdout}");
    assert_eq!(stdout.matches(&interesting).count(), 2, "got: {stdout}");
    assert_eq!(stdout.matches("耗时: ").count(), 2);
}

#[test]
fn single_mode_and_custom_keywords() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    fs::write(tmp.path().join("todo.txt"), "TODO: fix me").unwrap();
    fs::write(tmp.path().join("done.txt"), "all good").unwrap();
    let dir = tmp.path().to_str().unwrap();

    let output = keyword_scan(&["--dir", dir, "--mode", "threaded", "-k", "TODO,good,absent"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("多进程模式"));
    assert!(stdout.contains(&format!("TODO: [{}]", tmp.path().join("todo.txt").display())));
    assert!(stdout.contains(&format!("good: [{}]", tmp.path().join("done.txt").display())));
    // 没有匹配的关键词也会出现
    assert!(stdout.contains("absent: []"), "got: {stdout}");
}

#[test]
fn unreadable_file_is_diagnosed_and_run_succeeds() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    fs::write(tmp.path().join("ok.txt"), "homework").unwrap();
    fs::write(tmp.path().join("bad.txt"), [0xc3, 0x28, 0xff]).unwrap();
    let dir = tmp.path().to_str().unwrap();

    let output = keyword_scan(&["--dir", dir, "--mode", "multiprocess"]);
    assert!(output.status.success());

    // 诊断信息只提到一次路径
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("bad.txt").count(), 1, "stderr: {stderr}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("无法读取的文件: 1"), "got: {stdout}");
    assert!(stdout.contains(&format!("homework: [{}]", tmp.path().join("ok.txt").display())));
}

#[test]
fn missing_directory_exits_with_error() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let missing = tmp.path().join("nope");

    let output = keyword_scan(&["--dir", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("目录不存在"));
}

#[test]
fn invalid_options_are_rejected() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let dir = tmp.path().to_str().unwrap();

    assert_eq!(keyword_scan(&["--dir", dir, "--workers", "0"]).status.code(), Some(1));
    assert_eq!(keyword_scan(&["--dir", dir, "--timeout", "0"]).status.code(), Some(1));
    assert_eq!(keyword_scan(&["--dir", dir, "--encoding", "klingon"]).status.code(), Some(1));
}

#[test]
fn oversized_timeout_is_a_configuration_error() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let dir = tmp.path().to_str().unwrap();

    let output = keyword_scan(&["--dir", dir, "--mode", "threaded", "--timeout", "1e20"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("超时时间必须是正数"));
}

#[test]
fn very_long_timeout_still_scans() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    fs::write(tmp.path().join("a.txt"), "homework").unwrap();
    let dir = tmp.path().to_str().unwrap();

    let output = keyword_scan(&["--dir", dir, "--mode", "threaded", "--timeout", "1e19"]);
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("homework: [{}]", tmp.path().join("a.txt").display())));
}

#[test]
fn keywords_are_printed_in_the_order_given() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    fs::write(tmp.path().join("a.txt"), "alpha and zeta").unwrap();
    let dir = tmp.path().to_str().unwrap();

    let output = keyword_scan(&["--dir", dir, "--mode", "threaded", "-k", "zeta,alpha"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let zeta = stdout.find("  zeta: [").expect("zeta line");
    let alpha = stdout.find("  alpha: [").expect("alpha line");
    assert!(zeta < alpha, "got: {stdout}");
}

#[test]
fn keywords_are_matched_literally() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    fs::write(tmp.path().join("a.txt"), "myhomework").unwrap();
    let dir = tmp.path().to_str().unwrap();

    let output = keyword_scan(&["--dir", dir, "--mode", "threaded", "-k", " homework"]);
    assert!(output.status.success());

    // 前导空格是关键词的一部分
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("   homework: []"), "got: {stdout}");
}

#[test]
fn worker_subcommand_speaks_json() {
    use std::io::Write;
    use std::process::Stdio;

    let tmp = tempfile::tempdir().expect("create temp dir");
    let a = tmp.path().join("a.txt");
    fs::write(&a, "-x flag and homework").unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_keyword-scan"))
        .args(["worker", "--keyword=-x", "--keyword=homework", "--keyword=missing"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn worker");
    let input = serde_json::to_vec(&vec![a.clone()]).unwrap();
    child.stdin.take().unwrap().write_all(&input).unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let path = a.to_str().unwrap();
    assert_eq!(value["matches"]["-x"][0], path);
    assert_eq!(value["matches"]["homework"][0], path);
    assert_eq!(value["matches"]["missing"].as_array().unwrap().len(), 0);
}
