//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量画作处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 扫描画作目录（Vec<Painting>）
//! - 持有汇总 CSV 写入器、临时目录登记表和随机数发生器
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Painting>)
//!     ↓
//! workflow::PaintingFlow (处理单张画作)
//!     ↓
//! services (能力层：配额 / 元数据 / 落盘 / 写 CSV)
//!     ↓
//! infrastructure (基础设施：检测器子进程、临时目录)
//! ```

pub mod batch_processor;

pub use batch_processor::{App, RunStats};
