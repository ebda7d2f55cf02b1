use indicatif::{ProgressBar, ProgressStyle};

/// 分块进度条
///
/// 只在 stderr 是终端时绘制，否则 indicatif 会自动隐藏。
pub struct ScanProgress {
    bar: ProgressBar,
}

impl ScanProgress {
    /// 创建进度条，`visible` 为假时完全不绘制
    pub fn new(chunks: usize, visible: bool, label: &str) -> Self {
        let bar = if visible {
            ProgressBar::new(chunks as u64)
        } else {
            ProgressBar::hidden()
        };

        let style = ProgressStyle::with_template(
            "{spinner} {msg} [{bar:30}] {pos}/{len} 个分块 | 用时: {elapsed}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("▮▮ ");
        bar.set_style(style);
        bar.set_message(label.to_string());

        ScanProgress { bar }
    }

    /// 一个分块已交回结果
    pub fn chunk_done(&self) {
        self.bar.inc(1);
    }

    /// 清除进度条
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
