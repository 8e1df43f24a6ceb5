//! 单张画作处理流程 - 流程层
//!
//! 核心职责：定义"一张画"的完整处理流程
//!
//! 流程顺序（每个阶段最多执行一次，可以跳过，不会重跑）：
//! 1. 候选框检测器（FRCNN）→ 取前 min(候选数, 预算) 个
//! 2. 显著性检测器（BING）→ 补足预算缺口（缺口为 0 时不调用）
//! 3. 低显著性补充裁剪 → 固定数量，不占预算
//!
//! 每个阶段结束都 flush 汇总 CSV，后续崩溃不会丢失已写入的记录。

use crate::config::Config;
use crate::infrastructure::{RegionDetectors, PROPOSAL_META_FILE, SALIENCY_META_FILE};
use crate::models::crop::{CropDescriptor, CropOrigin};
use crate::models::loaders::MetaRecordReader;
use crate::services::{AllocationPlan, CropMaterializer, DatasetWriter, FillerPlanner, QuotaAllocator};
use crate::workflow::painting_ctx::PaintingCtx;
use rand::Rng;
use tracing::{debug, error, info, warn};

/// 单张画作的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    ProposalRequested,
    ProposalConsolidated,
    SaliencyRequested,
    SaliencyConsolidated,
    FillerGenerated,
    Done,
}

/// 单张画作的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintingOutcome {
    pub plan: AllocationPlan,
    /// 实际经过的阶段
    pub stages: Vec<Stage>,
    /// 向显著性检测器请求的数量（0 表示未调用）
    pub saliency_requested: usize,
}

impl PaintingOutcome {
    pub fn saliency_invoked(&self) -> bool {
        self.stages.contains(&Stage::SaliencyRequested)
    }
}

/// 画作处理流程
///
/// - 编排三个来源的先后顺序与回退
/// - 不持有外部资源（检测器、写入器由调用方传入）
/// - 只依赖业务能力（services）
pub struct PaintingFlow {
    allocator: QuotaAllocator,
    materializer: CropMaterializer,
    filler_planner: FillerPlanner,
    filler_width: u32,
    filler_height: u32,
    verbose_logging: bool,
}

impl PaintingFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            allocator: QuotaAllocator::new(config.crops_per_painting, config.filler_crops),
            materializer: CropMaterializer::new(config.crops_dir(), config.filler_jpeg_quality),
            filler_planner: FillerPlanner::new(config.filler_width, config.filler_height),
            filler_width: config.filler_width,
            filler_height: config.filler_height,
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run<D, R>(
        &self,
        detectors: &D,
        ctx: &PaintingCtx,
        writer: &mut DatasetWriter,
        rng: &mut R,
    ) -> PaintingOutcome
    where
        D: RegionDetectors,
        R: Rng + ?Sized,
    {
        let mut outcome = PaintingOutcome {
            plan: AllocationPlan::default(),
            stages: vec![Stage::Start],
            saliency_requested: 0,
        };

        // ========== 阶段 1: 候选框检测器 ==========
        outcome.stages.push(Stage::ProposalRequested);
        self.proposal_stage(detectors, ctx, writer, &mut outcome.plan).await;
        self.flush(writer, ctx, "候选框");
        outcome.stages.push(Stage::ProposalConsolidated);

        // ========== 阶段 2: 显著性检测器 ==========
        let requested = self.allocator.saliency_request(outcome.plan.from_proposal);
        if requested > 0 {
            outcome.stages.push(Stage::SaliencyRequested);
            outcome.saliency_requested = requested;
            self.saliency_stage(detectors, ctx, requested, writer, &mut outcome.plan)
                .await;
        } else {
            info!("{} 候选框已满足预算，跳过 BING", ctx);
        }
        self.flush(writer, ctx, "显著性");
        outcome.stages.push(Stage::SaliencyConsolidated);

        // ========== 阶段 3: 低显著性补充 ==========
        self.filler_stage(ctx, writer, rng, &mut outcome.plan).await;
        self.flush(writer, ctx, "低显著性");
        outcome.stages.push(Stage::FillerGenerated);

        outcome.stages.push(Stage::Done);
        info!(
            "{} ✅ 完成，共生成 {} 张裁剪 (FRCNN {}, BING {}, 低显著性 {})",
            ctx,
            outcome.plan.total(),
            outcome.plan.from_proposal,
            outcome.plan.from_saliency,
            outcome.plan.from_filler
        );
        outcome
    }

    async fn proposal_stage<D: RegionDetectors>(
        &self,
        detectors: &D,
        ctx: &PaintingCtx,
        writer: &mut DatasetWriter,
        plan: &mut AllocationPlan,
    ) {
        info!("{} 🔍 运行 FRCNN...", ctx);
        let proposal_count = match detectors.propose(&ctx.painting.path, &ctx.work_dir).await {
            Ok(raw) => QuotaAllocator::clamp_count(raw),
            Err(e) => {
                warn!("{} ⚠️ FRCNN 调用失败，按 0 个候选处理: {}", ctx, e);
                0
            }
        };
        info!("{} FRCNN 生成 {} 个候选", ctx, proposal_count);

        let quota = self.allocator.plan_proposal(proposal_count);
        if quota.take == 0 {
            return;
        }

        info!("{} 从 FRCNN 取前 {} 个候选", ctx, quota.take);
        let meta_path = ctx.work_dir.join(PROPOSAL_META_FILE);
        let report = match MetaRecordReader::with_score().read(&meta_path) {
            Ok(report) => report,
            Err(e) => {
                warn!("{} ⚠️ 无法读取 FRCNN 元数据，跳过 FRCNN 裁剪: {}", ctx, e);
                return;
            }
        };

        // 只尝试前 take 个候选，失败的不由后续候选补位
        for descriptor in report.descriptors.iter().take(quota.take) {
            let index = plan.total();
            if self.emit(ctx, index, descriptor, CropOrigin::Proposal, writer).await {
                plan.from_proposal += 1;
            }
        }
    }

    async fn saliency_stage<D: RegionDetectors>(
        &self,
        detectors: &D,
        ctx: &PaintingCtx,
        requested: usize,
        writer: &mut DatasetWriter,
        plan: &mut AllocationPlan,
    ) {
        info!("{} 🔍 运行 BING，请求 {} 个候选...", ctx, requested);
        match detectors
            .saliency(&ctx.painting.path, requested, &ctx.work_dir)
            .await
        {
            Ok(run) => {
                if self.verbose_logging {
                    info!(
                        "{} BING 原始输出 ({} 字节):\n{}",
                        ctx,
                        run.output.len(),
                        run.output
                    );
                } else {
                    debug!(
                        "{} BING 原始输出 ({} 字节):\n{}",
                        ctx,
                        run.output.len(),
                        run.output
                    );
                }
                if !run.succeeded {
                    warn!("{} ⚠️ BING 退出状态异常: {}", ctx, run.status);
                }
            }
            Err(e) => warn!("{} ⚠️ BING 调用失败: {}", ctx, e),
        }

        let meta_path = ctx.work_dir.join(SALIENCY_META_FILE);
        if !meta_path.exists() {
            warn!(
                "{} ⚠️ 未找到 BING 元数据 {}（BING 可能在写出前失败）",
                ctx,
                meta_path.display()
            );
            return;
        }

        let report = match MetaRecordReader::without_score().read(&meta_path) {
            Ok(report) => report,
            Err(e) => {
                warn!("{} ⚠️ 无法读取 BING 元数据，跳过 BING 裁剪: {}", ctx, e);
                return;
            }
        };
        info!("{} BING 元数据共 {} 条", ctx, report.len());

        // 按成功数计数，失败的由后续候选补位
        let take = self.allocator.take_from_saliency(report.len(), requested);
        for descriptor in &report.descriptors {
            if plan.from_saliency >= take {
                break;
            }
            let index = plan.total();
            if self.emit(ctx, index, descriptor, CropOrigin::Saliency, writer).await {
                plan.from_saliency += 1;
            }
        }
        info!("{} 从 BING 添加 {} 张裁剪", ctx, plan.from_saliency);
    }

    async fn filler_stage<R: Rng + ?Sized>(
        &self,
        ctx: &PaintingCtx,
        writer: &mut DatasetWriter,
        rng: &mut R,
        plan: &mut AllocationPlan,
    ) {
        let (width, height) = match image::image_dimensions(&ctx.painting.path) {
            Ok(dims) => dims,
            Err(e) => {
                warn!("{} ⚠️ 无法获取图片尺寸，跳过低显著性裁剪: {}", ctx, e);
                return;
            }
        };

        let quota =
            self.allocator
                .filler_quota(width, height, self.filler_width, self.filler_height);
        if quota == 0 {
            warn!(
                "{} ⚠️ 图片尺寸 {}x{} 小于目标 {}x{}，跳过低显著性裁剪",
                ctx, width, height, self.filler_width, self.filler_height
            );
            return;
        }

        info!("{} 生成 {} 张低显著性裁剪...", ctx, quota);
        let descriptors = self
            .filler_planner
            .plan(rng, &ctx.painting.path, width, height, quota);
        for descriptor in &descriptors {
            let index = plan.total();
            if self.emit(ctx, index, descriptor, CropOrigin::Filler, writer).await {
                plan.from_filler += 1;
            }
        }
        info!("{} 添加 {} 张低显著性裁剪", ctx, plan.from_filler);
    }

    /// 生成一张裁剪，返回是否成功；失败只记录日志，不占用序号
    async fn emit(
        &self,
        ctx: &PaintingCtx,
        index: usize,
        descriptor: &CropDescriptor,
        origin: CropOrigin,
        writer: &mut DatasetWriter,
    ) -> bool {
        match self
            .materializer
            .materialize(&ctx.painting, index, descriptor, origin, &ctx.work_dir, writer)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!("{} ⚠️ {} 裁剪 #{} 生成失败: {}", ctx, origin, index, e);
                false
            }
        }
    }

    fn flush(&self, writer: &mut DatasetWriter, ctx: &PaintingCtx, stage: &str) {
        if let Err(e) = writer.flush() {
            error!(
                "{} ❌ {}阶段结束时 flush 汇总 CSV 失败 ({}): {}",
                ctx,
                stage,
                writer.path().display(),
                e
            );
        }
    }
}
