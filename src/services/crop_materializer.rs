//! 裁剪落盘服务 - 业务能力层
//!
//! 把一个裁剪描述变成最终的图片文件 + 汇总 CSV 中的一行。
//! 成功时恰好写一个文件、追加一行；失败时除日志外没有副作用需要调用方处理。

use crate::error::CropError;
use crate::models::crop::{CropDescriptor, CropOrigin, DatasetRecord, PixelSource};
use crate::models::painting::Painting;
use crate::services::dataset_writer::DatasetWriter;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct CropMaterializer {
    crops_dir: PathBuf,
    jpeg_quality: u8,
}

impl CropMaterializer {
    pub fn new(crops_dir: impl Into<PathBuf>, jpeg_quality: u8) -> Self {
        Self {
            crops_dir: crops_dir.into(),
            jpeg_quality,
        }
    }

    /// 最终裁剪文件名：`<base>_combo_crop<idx>.jpg` 或 `<base>_lowsaliency_crop<idx>.jpg`
    pub fn crop_file_name(base_name: &str, origin: CropOrigin, index: usize) -> String {
        format!("{}_{}_crop{}.jpg", base_name, origin.file_tag(), index)
    }

    /// 生成一张裁剪并追加记录
    ///
    /// 检测器产出的裁剪（`PreCropped`）直接复制；`Original` 则从原图解码、
    /// 截取矩形、以配置的质量重新编码为 JPEG。
    pub async fn materialize(
        &self,
        painting: &Painting,
        index: usize,
        descriptor: &CropDescriptor,
        origin: CropOrigin,
        work_dir: &Path,
        writer: &mut DatasetWriter,
    ) -> Result<DatasetRecord, CropError> {
        let dest = self
            .crops_dir
            .join(Self::crop_file_name(&painting.base_name, origin, index));

        match &descriptor.source {
            PixelSource::PreCropped(relative) => {
                copy_file(&work_dir.join(relative), &dest).await?;
            }
            PixelSource::Original(path) => {
                write_region_jpeg(path, descriptor, &dest, self.jpeg_quality)?;
            }
        }
        debug!("裁剪已写入: {}", dest.display());

        let record = DatasetRecord {
            original_filename: painting.file_name.clone(),
            crop_index: index,
            rect: descriptor.rect,
            is_wrong: painting.is_wrong,
            origin,
        };
        if let Err(e) = writer.append(&record) {
            // 没有对应记录的裁剪文件不能留在 crops/ 里
            discard(&dest).await;
            return Err(CropError::RecordWriteFailed(e));
        }

        Ok(record)
    }
}

async fn copy_file(source: &Path, dest: &Path) -> Result<(), CropError> {
    let mut source_file =
        tokio::fs::File::open(source)
            .await
            .map_err(|e| CropError::SourceUnreadable {
                path: source.to_path_buf(),
                source: e,
            })?;

    let dest_failed = |e| CropError::DestinationFailed {
        path: dest.to_path_buf(),
        source: e,
    };
    let mut dest_file = tokio::fs::File::create(dest).await.map_err(dest_failed)?;
    if let Err(e) = tokio::io::copy(&mut source_file, &mut dest_file).await {
        drop(dest_file);
        discard(dest).await;
        return Err(dest_failed(e));
    }
    Ok(())
}

/// 删除写了一半的目标文件
async fn discard(dest: &Path) {
    if let Err(e) = tokio::fs::remove_file(dest).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("⚠️ 无法删除残留裁剪 {}: {}", dest.display(), e);
        }
    }
}

fn write_region_jpeg(
    source: &Path,
    descriptor: &CropDescriptor,
    dest: &Path,
    quality: u8,
) -> Result<(), CropError> {
    let image = image::open(source).map_err(|e| CropError::DecodeFailed {
        path: source.to_path_buf(),
        source: e,
    })?;

    let rect = descriptor.rect;
    if !rect.fits_within(image.width(), image.height()) {
        return Err(CropError::OutOfBounds {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            image_width: image.width(),
            image_height: image.height(),
        });
    }

    // fits_within 已保证各值非负且不超过 u32 范围
    let region = image
        .crop_imm(rect.x as u32, rect.y as u32, rect.width as u32, rect.height as u32)
        .to_rgb8();

    save_jpeg(&region, dest, quality)
}

/// 以指定质量把 RGB 图片编码为 JPEG 写入 `dest`
pub fn save_jpeg(region: &RgbImage, dest: &Path, quality: u8) -> Result<(), CropError> {
    let file = File::create(dest).map_err(|e| CropError::DestinationFailed {
        path: dest.to_path_buf(),
        source: e,
    })?;
    let mut out = BufWriter::new(file);
    let encoded = JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(region)
        .map_err(|e| CropError::EncodeFailed {
            path: dest.to_path_buf(),
            source: e,
        });
    let result = encoded.and_then(|()| {
        out.flush().map_err(|e| CropError::DestinationFailed {
            path: dest.to_path_buf(),
            source: e,
        })
    });

    if result.is_err() {
        drop(out);
        if let Err(e) = std::fs::remove_file(dest) {
            warn!("⚠️ 无法删除残留裁剪 {}: {}", dest.display(), e);
        }
    }
    result
}
