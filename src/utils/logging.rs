/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use crate::config::Config;
use crate::services::ExportStats;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志（默认 info 级别，可通过 `RUST_LOG` 覆盖）
///
/// 重复调用是安全的，只有第一次生效。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 画作裁剪数据集生成");
    info!("📁 画作目录: {}", config.paintings_dir.display());
    info!(
        "📊 每张画作: 检测器裁剪上限 {}，低显著性补充 {} 张 ({}x{})",
        config.crops_per_painting, config.filler_crops, config.filler_width, config.filler_height
    );
    info!("{}", "=".repeat(60));
}

/// 记录画作加载信息
pub fn log_paintings_loaded(total: usize) {
    info!("✓ 找到 {} 张待处理的画作\n", total);
}

/// 记录单张画作开始处理
pub fn log_painting_start(index: usize, total: usize, file_name: &str) {
    info!("\n{}", "─".repeat(60));
    info!("🖼️ 开始处理第 {}/{} 张画作: {}", index, total, file_name);
}

/// 打印最终统计信息
///
/// # 参数
/// - `stats`: 每个来源的记录数 (FRCNN, BING, 低显著性)
pub fn print_final_stats(
    processed: usize,
    skipped: usize,
    stats: (usize, usize, usize),
    config: &Config,
) {
    let (proposal, saliency, filler) = stats;
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已处理画作: {}", processed);
    info!("❌ 跳过画作: {}", skipped);
    info!(
        "🧩 裁剪总数: {} (FRCNN {}, BING {}, 低显著性 {})",
        proposal + saliency + filler,
        proposal,
        saliency,
        filler
    );
    info!("{}", "=".repeat(60));
    info!("\n裁剪图片目录: {}", config.crops_dir().display());
    info!("汇总 CSV: {}", config.combined_csv().display());
}

/// 打印带标签导出的统计
pub fn log_export_stats(stats: &ExportStats, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 带标签导出完成");
    info!("🖼️ 原图: {}", stats.paintings);
    info!("✅ 导出裁剪: {}", stats.crops_written);
    info!("❌ 跳过行: {}", stats.rows_skipped);
    info!("📁 输出目录: {}", config.labeled_crops_dir.display());
    info!("{}", "=".repeat(60));
}
