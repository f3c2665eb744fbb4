use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::workflow::{BatchSummary, QueueCounts};

/// 初始化 tracing 订阅者
///
/// `RUST_LOG` 优先；否则默认 info，详细模式为 debug
pub fn init(verbose: bool) {
    let default_level = if verbose { "gift_pricer=debug" } else { "gift_pricer=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n礼物特效定价日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 礼物特效定价 AI (批量模式)");
    info!("🤖 分析后端: {:?} / 模型: {}", config.backend, config.model_name);
    if config.credential().is_none() {
        info!("⚠️ 未配置 API Key，批量分析将无法启动");
    }
    info!("{}", "=".repeat(60));
}

/// 记录文件加载信息
pub fn log_files_loaded(loaded: usize, rejected: usize) {
    info!("✓ 加入队列 {} 个文件", loaded);
    if rejected > 0 {
        info!("⚠️ {} 个文件无法加载，已跳过", rejected);
    }
}

/// 记录批次开始信息
pub fn log_batch_start(total: usize, model: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始批量分析: {} 个待处理文件", total);
    info!("🤖 模型: {}", model);
    info!("{}", "=".repeat(60));
}

/// 记录单个文件开始分析
pub fn log_item_start(index: usize, total: usize, file_name: &str) {
    info!("[{}/{}] 🔍 正在分析 {}...", index, total, truncate_text(file_name, 60));
}

/// 记录批次完成信息
pub fn log_batch_complete(summary: &BatchSummary) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 批量分析完成: 成功 {}/{}，失败 {}，跳过 {}",
        summary.success, summary.total, summary.failed, summary.skipped
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(counts: &QueueCounts, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", counts.success, counts.total);
    info!("❌ 失败: {}", counts.error);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
