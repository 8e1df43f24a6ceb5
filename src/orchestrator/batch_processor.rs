//! 批量画作处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量画作的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建输出目录、临时目录根、汇总 CSV（写入表头）
//! 2. **批量加载**：按目录列举顺序扫描所有画作
//! 3. **顺序处理**：一次只处理一张画作，检测器调用从不重叠
//! 4. **资源管理**：持有唯一的汇总 CSV 写入器和临时目录登记表
//! 5. **全局统计**：汇总所有画作的处理结果
//!
//! 初始化阶段的任何失败都会中止整次运行；单张画作内的失败只影响该画作。

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::{ProcessDetectors, RegionDetectors, TempRegistry};
use crate::models::load_paintings;
use crate::services::{AllocationPlan, DatasetWriter};
use crate::utils::logging::{
    log_painting_start, log_paintings_loaded, log_startup, print_final_stats,
};
use crate::workflow::{PaintingCtx, PaintingFlow};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

/// 应用主结构
pub struct App<D: RegionDetectors = ProcessDetectors> {
    config: Config,
    detectors: D,
    writer: DatasetWriter,
    temp: TempRegistry,
    rng: StdRng,
}

/// 整次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub paintings_total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub from_proposal: usize,
    pub from_saliency: usize,
    pub from_filler: usize,
}

impl RunStats {
    fn record(&mut self, plan: &AllocationPlan) {
        self.processed += 1;
        self.from_proposal += plan.from_proposal;
        self.from_saliency += plan.from_saliency;
        self.from_filler += plan.from_filler;
    }

    pub fn records_total(&self) -> usize {
        self.from_proposal + self.from_saliency + self.from_filler
    }
}

impl App<ProcessDetectors> {
    /// 初始化应用（使用子进程检测器）
    pub async fn initialize(config: Config) -> Result<Self> {
        let detectors = ProcessDetectors::new(&config);
        Self::with_detectors(config, detectors).await
    }
}

impl<D: RegionDetectors> App<D> {
    /// 使用指定的检测器实现初始化应用
    pub async fn with_detectors(config: Config, detectors: D) -> Result<Self> {
        log_startup(&config);

        for dir in [config.crops_dir(), config.temp_base_dir.clone()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| AppError::create_dir_failed(&dir, e))?;
        }

        // 表头在处理任何画作之前写入
        let writer = DatasetWriter::create(config.combined_csv()).map_err(AppError::from)?;

        let rng = match config.rng_seed {
            Some(seed) => {
                info!("🎲 使用固定随机种子: {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        let temp = TempRegistry::new(&config.temp_base_dir, config.temp_cleanup);

        Ok(Self {
            config,
            detectors,
            writer,
            temp,
            rng,
        })
    }

    pub fn detectors(&self) -> &D {
        &self.detectors
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<RunStats> {
        info!("\n📁 正在扫描待处理的画作...");
        let paintings = load_paintings(&self.config.paintings_dir)
            .await
            .map_err(AppError::from)?;

        let mut stats = RunStats {
            paintings_total: paintings.len(),
            ..Default::default()
        };

        if paintings.is_empty() {
            warn!("⚠️ 没有找到待处理的画作，程序结束");
            return Ok(stats);
        }
        log_paintings_loaded(paintings.len());

        let flow = PaintingFlow::new(&self.config);
        let total = paintings.len();

        for (idx, painting) in paintings.into_iter().enumerate() {
            let painting_index = idx + 1;
            log_painting_start(painting_index, total, &painting.file_name);

            let work_dir = match self.temp.acquire(&painting.base_name) {
                Ok(dir) => dir,
                Err(e) => {
                    warn!(
                        "[画作 #{} {}] ⚠️ 无法创建临时目录，跳过: {}",
                        painting_index, painting.file_name, e
                    );
                    stats.skipped += 1;
                    continue;
                }
            };

            let ctx = PaintingCtx::new(painting, painting_index, work_dir);
            let outcome = flow
                .run(&self.detectors, &ctx, &mut self.writer, &mut self.rng)
                .await;
            stats.record(&outcome.plan);

            self.temp.finish(&ctx.work_dir);
        }

        if let Err(e) = self.writer.flush() {
            warn!("⚠️ 最终 flush 汇总 CSV 失败: {}", e);
        }
        self.temp.release_all();

        print_final_stats(
            stats.processed,
            stats.skipped,
            (stats.from_proposal, stats.from_saliency, stats.from_filler),
            &self.config,
        );

        Ok(stats)
    }
}
