//! 低显著性补充裁剪规划 - 业务能力层
//!
//! 在原图内随机放置固定尺寸的矩形，各次抽样相互独立，允许重叠。

use crate::models::crop::{CropDescriptor, CropRect, PixelSource};
use rand::Rng;
use std::path::Path;

pub struct FillerPlanner {
    target_width: u32,
    target_height: u32,
}

impl FillerPlanner {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// 图片是否足够容纳目标尺寸
    pub fn fits(&self, image_width: u32, image_height: u32) -> bool {
        image_width >= self.target_width && image_height >= self.target_height
    }

    /// 生成 `count` 个补充裁剪描述；图片小于目标尺寸时返回空列表
    ///
    /// 左上角在 `[0, image_width - target_width] × [0, image_height - target_height]`
    /// 内均匀抽取。
    pub fn plan<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        painting_path: &Path,
        image_width: u32,
        image_height: u32,
        count: usize,
    ) -> Vec<CropDescriptor> {
        if !self.fits(image_width, image_height) {
            return Vec::new();
        }

        let max_x = image_width - self.target_width;
        let max_y = image_height - self.target_height;

        (0..count)
            .map(|_| {
                let x = rng.gen_range(0..=max_x);
                let y = rng.gen_range(0..=max_y);
                CropDescriptor {
                    source: PixelSource::Original(painting_path.to_path_buf()),
                    rect: CropRect::new(
                        i64::from(x),
                        i64::from(y),
                        i64::from(self.target_width),
                        i64::from(self.target_height),
                    ),
                    score: None,
                }
            })
            .collect()
    }
}
