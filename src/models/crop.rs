//! 裁剪相关的数据模型

use std::fmt;
use std::path::PathBuf;

/// 像素矩形（左上角 + 宽高）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl CropRect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 右下角；坐标溢出 i64 时返回 `None`
    pub fn far_corner(&self) -> Option<(i64, i64)> {
        Some((
            self.x.checked_add(self.width)?,
            self.y.checked_add(self.height)?,
        ))
    }

    /// 四个角点，顺序为 左上、右上、左下、右下
    ///
    /// 溢出的坐标饱和到 i64 边界；元数据读取时已跳过这类行。
    pub fn corners(&self) -> [(i64, i64); 4] {
        let (x1, y1) = (self.x, self.y);
        let (x2, y2) = (
            self.x.saturating_add(self.width),
            self.y.saturating_add(self.height),
        );
        [(x1, y1), (x2, y1), (x1, y2), (x2, y2)]
    }

    /// 矩形是否非空且完全落在图片内
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && self.far_corner().is_some_and(|(x2, y2)| {
                x2 <= i64::from(image_width) && y2 <= i64::from(image_height)
            })
    }
}

/// 裁剪来源，每条记录恰好属于其中一种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropOrigin {
    /// 候选框检测器（FRCNN）
    Proposal,
    /// 显著性检测器（BING）
    Saliency,
    /// 随机位置的低显著性补充裁剪
    Filler,
}

impl CropOrigin {
    /// 生成最终文件名时使用的标签
    pub fn file_tag(self) -> &'static str {
        match self {
            CropOrigin::Proposal | CropOrigin::Saliency => "combo",
            CropOrigin::Filler => "lowsaliency",
        }
    }

    /// 带标签导出时使用的标签
    pub fn label(self) -> &'static str {
        match self {
            CropOrigin::Proposal => "FRCNN",
            CropOrigin::Saliency => "BING",
            CropOrigin::Filler => "RANDOM",
        }
    }

    /// 由汇总 CSV 中的两个来源标记还原来源（FRCNN 优先）
    pub fn from_flags(proposal: bool, saliency: bool) -> Self {
        if proposal {
            CropOrigin::Proposal
        } else if saliency {
            CropOrigin::Saliency
        } else {
            CropOrigin::Filler
        }
    }
}

impl fmt::Display for CropOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 像素数据从哪里来
#[derive(Debug, Clone, PartialEq)]
pub enum PixelSource {
    /// 检测器已经裁好的图片，路径相对于该图片的临时工作目录
    PreCropped(PathBuf),
    /// 从原图中按矩形裁剪
    Original(PathBuf),
}

/// 一个候选或生成的裁剪区域
///
/// 由元数据读取器创建或由补充裁剪规划直接生成，只被消费一次，不会被修改。
#[derive(Debug, Clone, PartialEq)]
pub struct CropDescriptor {
    pub source: PixelSource,
    pub rect: CropRect,
    /// 只有候选框检测器会提供置信度
    pub score: Option<f64>,
}

/// 汇总 CSV 表头
pub const DATASET_HEADER: [&str; 13] = [
    "original_filename",
    "crop_idx",
    "top_left_x",
    "top_left_y",
    "top_right_x",
    "top_right_y",
    "bottom_left_x",
    "bottom_left_y",
    "bottom_right_x",
    "bottom_right_y",
    "WRONG_file",
    "FRCNN_source",
    "BING_source",
];

/// 汇总 CSV 中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRecord {
    pub original_filename: String,
    /// 同一张原图内从 0 开始连续编号
    pub crop_index: usize,
    pub rect: CropRect,
    pub is_wrong: bool,
    pub origin: CropOrigin,
}

impl DatasetRecord {
    pub fn is_proposal(&self) -> bool {
        self.origin == CropOrigin::Proposal
    }

    pub fn is_saliency(&self) -> bool {
        self.origin == CropOrigin::Saliency
    }

    pub fn is_filler(&self) -> bool {
        self.origin == CropOrigin::Filler
    }

    /// 转为 CSV 字段，布尔值写为 "TRUE"/"FALSE"
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(DATASET_HEADER.len());
        row.push(self.original_filename.clone());
        row.push(self.crop_index.to_string());
        for (x, y) in self.rect.corners() {
            row.push(x.to_string());
            row.push(y.to_string());
        }
        row.push(flag(self.is_wrong).to_string());
        row.push(flag(self.is_proposal()).to_string());
        row.push(flag(self.is_saliency()).to_string());
        row
    }
}

/// 布尔值的 CSV 表示
pub fn flag(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}
