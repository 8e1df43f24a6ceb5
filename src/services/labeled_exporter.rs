//! 带标签导出服务 - 业务能力层
//!
//! 读取汇总 CSV，按原图分组，从原图重新裁剪每个矩形，
//! 以 `<作者>_<编号>_crop<序号>_<来源>[_WRONG].jpg` 命名输出。

use crate::models::crop::CropOrigin;
use crate::services::crop_materializer::save_jpeg;
use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 汇总 CSV 中导出需要的列
#[derive(Debug, Clone, Deserialize)]
struct CombinedRow {
    original_filename: String,
    crop_idx: usize,
    top_left_x: i64,
    top_left_y: i64,
    bottom_right_x: i64,
    bottom_right_y: i64,
    #[serde(rename = "WRONG_file")]
    wrong_file: String,
    #[serde(rename = "FRCNN_source")]
    frcnn_source: String,
    #[serde(rename = "BING_source")]
    bing_source: String,
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("TRUE")
}

/// 从原图文件名解析出的命名片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts {
    pub first: String,
    pub last: String,
    pub num: String,
}

/// 解析 `<first>_<last>_<num>.jpg` 形式的文件名
///
/// 少于两段时返回 `UNKNOWN/UNKNOWN/0`；最后一段不是数字时编号取 `0`。
pub fn parse_painting_name(file_name: &str, digits: &Regex) -> NameParts {
    let name = file_name.replace(".jpg", "");
    let parts: Vec<&str> = name.split('_').collect();

    if parts.len() < 2 {
        warn!("文件名格式异常，无法解析: '{}'", file_name);
        return NameParts {
            first: "UNKNOWN".to_string(),
            last: "UNKNOWN".to_string(),
            num: "0".to_string(),
        };
    }

    let tail = parts[parts.len() - 1];
    if !digits.is_match(tail) {
        warn!("文件名最后一段不是数字: '{}'，编号按 0 处理", name);
        return NameParts {
            first: parts[..parts.len() - 1].join("_"),
            last: tail.to_string(),
            num: "0".to_string(),
        };
    }

    if parts.len() == 2 {
        NameParts {
            first: parts[0].to_string(),
            last: String::new(),
            num: tail.to_string(),
        }
    } else {
        NameParts {
            first: parts[..parts.len() - 2].join("_"),
            last: parts[parts.len() - 2].to_string(),
            num: tail.to_string(),
        }
    }
}

/// 导出文件名
pub fn labeled_file_name(parts: &NameParts, crop_idx: usize, origin: CropOrigin, is_wrong: bool) -> String {
    let base = if parts.last.is_empty() {
        format!("{}_{}_crop{}_{}", parts.first, parts.num, crop_idx + 1, origin.label())
    } else {
        format!(
            "{}_{}_{}_crop{}_{}",
            parts.first,
            parts.last,
            parts.num,
            crop_idx + 1,
            origin.label()
        )
    };
    if is_wrong {
        format!("{}_WRONG.jpg", base)
    } else {
        format!("{}.jpg", base)
    }
}

/// 导出统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    pub paintings: usize,
    pub crops_written: usize,
    pub rows_skipped: usize,
}

pub struct LabeledExporter {
    paintings_dir: PathBuf,
    output_dir: PathBuf,
    jpeg_quality: u8,
    digits: Regex,
}

impl LabeledExporter {
    pub fn new(
        paintings_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        jpeg_quality: u8,
    ) -> Result<Self> {
        Ok(Self {
            paintings_dir: paintings_dir.into(),
            output_dir: output_dir.into(),
            jpeg_quality,
            digits: Regex::new(r"^\d+$")?,
        })
    }

    /// 执行导出
    ///
    /// 原图缺失时中止；原图无法解码时跳过该图；坐标非法的行跳过。
    pub fn export(&self, combined_csv: &Path) -> Result<ExportStats> {
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("无法创建导出目录: {}", self.output_dir.display()))?;
        info!("📁 导出目录: {}", self.output_dir.display());

        let mut stats = ExportStats::default();
        let groups = self.load_groups(combined_csv, &mut stats)?;

        for (file_name, rows) in &groups {
            let source = self.paintings_dir.join(file_name);
            info!("🖼️ 正在处理原图: {}", source.display());

            if !source.exists() {
                bail!("原图不存在: {}，停止导出", source.display());
            }
            let image = match image::open(&source) {
                Ok(image) => image,
                Err(e) => {
                    warn!("⚠️ 无法加载原图 {}: {}，跳过", source.display(), e);
                    continue;
                }
            };
            stats.paintings += 1;

            let parts = parse_painting_name(file_name, &self.digits);
            let (width, height) = (i64::from(image.width()), i64::from(image.height()));

            for row in rows {
                let (x1, y1, x2, y2) = (
                    row.top_left_x,
                    row.top_left_y,
                    row.bottom_right_x,
                    row.bottom_right_y,
                );
                if !(0 <= y1 && y1 < y2 && y2 <= height && 0 <= x1 && x1 < x2 && x2 <= width) {
                    warn!(
                        "⚠️ 坐标非法 {} 裁剪 {}: ({},{})-({},{})，图片尺寸 {}x{}，跳过",
                        file_name, row.crop_idx, x1, y1, x2, y2, width, height
                    );
                    stats.rows_skipped += 1;
                    continue;
                }

                let origin = CropOrigin::from_flags(is_true(&row.frcnn_source), is_true(&row.bing_source));
                let output_name = labeled_file_name(&parts, row.crop_idx, origin, is_true(&row.wrong_file));
                let output_path = self.output_dir.join(&output_name);

                let region = image
                    .crop_imm(x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32)
                    .to_rgb8();
                match save_jpeg(&region, &output_path, self.jpeg_quality) {
                    Ok(()) => {
                        stats.crops_written += 1;
                        if stats.crops_written % 100 == 0 {
                            info!("✓ 已保存 {} (累计 {} 张)", output_name, stats.crops_written);
                        }
                    }
                    Err(e) => {
                        warn!("⚠️ 保存裁剪失败 {}: {}", output_path.display(), e);
                        stats.rows_skipped += 1;
                    }
                }
            }
        }

        Ok(stats)
    }

    /// 读取汇总 CSV 并按原图文件名分组（按文件名排序）
    fn load_groups(
        &self,
        combined_csv: &Path,
        stats: &mut ExportStats,
    ) -> Result<BTreeMap<String, Vec<CombinedRow>>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(combined_csv)
            .with_context(|| format!("无法读取汇总 CSV: {}", combined_csv.display()))?;

        let mut groups: BTreeMap<String, Vec<CombinedRow>> = BTreeMap::new();
        for result in reader.deserialize::<CombinedRow>() {
            match result {
                Ok(row) => groups.entry(row.original_filename.clone()).or_default().push(row),
                Err(e) => {
                    warn!("⚠️ 汇总 CSV 行无法解析: {}", e);
                    stats.rows_skipped += 1;
                }
            }
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crop::{CropRect, DatasetRecord};
    use crate::services::dataset_writer::DatasetWriter;
    use image::{Rgb, RgbImage};

    fn digits() -> Regex {
        Regex::new(r"^\d+$").unwrap()
    }

    #[test]
    fn test_parse_three_part_name() {
        let parts = parse_painting_name("claude_monet_12.jpg", &digits());
        assert_eq!(
            parts,
            NameParts {
                first: "claude".to_string(),
                last: "monet".to_string(),
                num: "12".to_string()
            }
        );

        let parts = parse_painting_name("pierre_auguste_renoir_3.jpg", &digits());
        assert_eq!(parts.first, "pierre_auguste");
        assert_eq!(parts.last, "renoir");
    }

    #[test]
    fn test_parse_two_part_name() {
        let parts = parse_painting_name("monet_7.jpg", &digits());
        assert_eq!((parts.first.as_str(), parts.last.as_str(), parts.num.as_str()), ("monet", "", "7"));
    }

    #[test]
    fn test_parse_non_numeric_tail() {
        let parts = parse_painting_name("van_gogh_3_WRONG.jpg", &digits());
        assert_eq!(parts.first, "van_gogh_3");
        assert_eq!(parts.last, "WRONG");
        assert_eq!(parts.num, "0");
    }

    #[test]
    fn test_parse_single_part_name() {
        let parts = parse_painting_name("untitled.jpg", &digits());
        assert_eq!(parts.first, "UNKNOWN");
        assert_eq!(parts.num, "0");
    }

    #[test]
    fn test_labeled_file_names() {
        let parts = parse_painting_name("claude_monet_12.jpg", &digits());
        assert_eq!(
            labeled_file_name(&parts, 0, CropOrigin::Proposal, false),
            "claude_monet_12_crop1_FRCNN.jpg"
        );
        let parts = parse_painting_name("monet_7.jpg", &digits());
        assert_eq!(
            labeled_file_name(&parts, 4, CropOrigin::Filler, true),
            "monet_7_crop5_RANDOM_WRONG.jpg"
        );
    }

    #[test]
    fn test_export_from_combined_csv() {
        let dir = tempfile::tempdir().unwrap();
        let paintings = dir.path().join("paintings");
        std::fs::create_dir_all(&paintings).unwrap();
        RgbImage::from_pixel(100, 80, Rgb([10, 20, 30]))
            .save(paintings.join("claude_monet_1.jpg"))
            .unwrap();

        let csv_path = dir.path().join("combined.csv");
        let mut writer = DatasetWriter::create(&csv_path).unwrap();
        let rects = [
            (CropRect::new(0, 0, 50, 40), CropOrigin::Proposal),
            (CropRect::new(10, 10, 20, 20), CropOrigin::Saliency),
            (CropRect::new(90, 0, 20, 20), CropOrigin::Filler),
        ];
        for (index, (rect, origin)) in rects.into_iter().enumerate() {
            writer
                .append(&DatasetRecord {
                    original_filename: "claude_monet_1.jpg".to_string(),
                    crop_index: index,
                    rect,
                    is_wrong: false,
                    origin,
                })
                .unwrap();
        }
        writer.flush().unwrap();

        let out = dir.path().join("labeled");
        let exporter = LabeledExporter::new(&paintings, &out, 95).unwrap();
        let stats = exporter.export(&csv_path).unwrap();

        assert_eq!(stats.paintings, 1);
        assert_eq!(stats.crops_written, 2);
        assert_eq!(stats.rows_skipped, 1);
        assert_eq!(
            image::image_dimensions(out.join("claude_monet_1_crop1_FRCNN.jpg")).unwrap(),
            (50, 40)
        );
        assert!(out.join("claude_monet_1_crop2_BING.jpg").exists());
    }

    #[test]
    fn test_export_stops_when_painting_missing() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("combined.csv");
        let mut writer = DatasetWriter::create(&csv_path).unwrap();
        writer
            .append(&DatasetRecord {
                original_filename: "gone_1.jpg".to_string(),
                crop_index: 0,
                rect: CropRect::new(0, 0, 5, 5),
                is_wrong: false,
                origin: CropOrigin::Filler,
            })
            .unwrap();
        writer.flush().unwrap();

        let exporter = LabeledExporter::new(dir.path(), dir.path().join("labeled"), 95).unwrap();
        assert!(exporter.export(&csv_path).is_err());
    }
}
