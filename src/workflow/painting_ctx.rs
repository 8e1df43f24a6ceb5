//! 单张画作处理上下文
//!
//! 封装"我正在处理第几张画、它的工作目录在哪"这一信息

use crate::models::painting::Painting;
use std::fmt::Display;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PaintingCtx {
    pub painting: Painting,

    /// 画作序号（从1开始，仅用于日志显示）
    pub painting_index: usize,

    /// 本张画作的临时工作目录
    pub work_dir: PathBuf,
}

impl PaintingCtx {
    pub fn new(painting: Painting, painting_index: usize, work_dir: PathBuf) -> Self {
        Self {
            painting,
            painting_index,
            work_dir,
        }
    }
}

impl Display for PaintingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[画作 #{} {}]",
            self.painting_index, self.painting.file_name
        )
    }
}
