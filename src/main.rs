use anyhow::Result;
use clap::{Parser, Subcommand};
use combo_cropper::services::LabeledExporter;
use combo_cropper::utils::logging;
use combo_cropper::{App, Config};
use std::path::PathBuf;

/// 画作裁剪数据集生成工具
#[derive(Debug, Parser)]
#[command(name = "combo-cropper", version)]
struct Cli {
    /// TOML 配置文件（可选，未设置的项使用默认值）
    #[arg(short, long, env = "COMBO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 运行检测器并生成汇总数据集（默认）
    Run,
    /// 根据汇总 CSV 从原图重新裁剪，按来源标签命名导出
    ExportLabeled {
        /// 汇总 CSV 路径（默认为输出目录下的 combined_data.csv）
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let mut app = App::initialize(config).await?;
            app.run().await?;
        }
        Command::ExportLabeled { csv } => {
            let csv = csv.unwrap_or_else(|| config.combined_csv());
            let exporter = LabeledExporter::new(
                &config.paintings_dir,
                &config.labeled_crops_dir,
                config.labeled_jpeg_quality,
            )?;
            let stats = exporter.export(&csv)?;
            logging::log_export_stats(&stats, &config);
        }
    }

    Ok(())
}
