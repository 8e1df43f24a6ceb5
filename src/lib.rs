//! # Combo Cropper
//!
//! 从一个画作目录生成固定规模的裁剪数据集：
//! 合并两个外部检测器（FRCNN 候选框、BING 显著性）的候选区域，
//! 再补充随机位置的低显著性裁剪，输出一份汇总 CSV。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源，只暴露能力
//! - `ProcessDetectors` - 以子进程方式运行两个检测器
//! - `TempRegistry` - 每张画作的临时工作目录
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个裁剪或单张画作的一个决定
//! - `QuotaAllocator` - 三个来源的配额分配
//! - `CropMaterializer` - 裁剪落盘 + 追加记录
//! - `FillerPlanner` - 低显著性裁剪的随机位置
//! - `DatasetWriter` - 写汇总 CSV
//! - `LabeledExporter` - 按来源标签重新导出裁剪
//!
//! ### ③ 流程层（Workflow）
//! - `PaintingCtx` - 上下文封装（画作 + 序号 + 工作目录）
//! - `PaintingFlow` - 流程编排（FRCNN → BING → 低显著性）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量画作处理器，管理资源，顺序执行

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, TempCleanup};
pub use error::{AppError, AppResult};
pub use infrastructure::{ProcessDetectors, RegionDetectors, SaliencyRun};
pub use models::{CropDescriptor, CropOrigin, CropRect, DatasetRecord, Painting};
pub use orchestrator::{App, RunStats};
pub use workflow::{PaintingCtx, PaintingFlow};
