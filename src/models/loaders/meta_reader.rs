//! 检测器元数据读取
//!
//! 元数据文件格式：一行表头，之后每行
//! `relative_path,x,y,width,height[,score]`。

use crate::error::MetaError;
use crate::models::crop::{CropDescriptor, CropRect, PixelSource};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// 宽松解析的结果：解析失败时退回默认值，但保留失败的事实
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lenient<T> {
    Parsed(T),
    Defaulted(T),
}

impl<T: Copy> Lenient<T> {
    pub fn value(&self) -> T {
        match self {
            Lenient::Parsed(v) | Lenient::Defaulted(v) => *v,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Lenient::Defaulted(_))
    }
}

/// 解析数值字段，失败时取默认值（0）
pub fn parse_lenient<T: FromStr + Default + Copy>(field: &str) -> Lenient<T> {
    match field.parse::<T>() {
        Ok(v) => Lenient::Parsed(v),
        Err(_) => Lenient::Defaulted(T::default()),
    }
}

/// 一次读取的结果
#[derive(Debug, Default)]
pub struct MetaReport {
    /// 按文件顺序排列的裁剪描述
    pub descriptors: Vec<CropDescriptor>,
    /// 因字段不足或格式错误而跳过的行数
    pub skipped_rows: usize,
    /// 数值解析失败、被置为 0 的字段数
    pub defaulted_fields: usize,
}

impl MetaReport {
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// 元数据读取器
pub struct MetaRecordReader {
    has_score: bool,
}

impl MetaRecordReader {
    /// 候选框检测器的元数据（带置信度列）
    pub fn with_score() -> Self {
        Self { has_score: true }
    }

    /// 显著性检测器的元数据（无置信度列）
    pub fn without_score() -> Self {
        Self { has_score: false }
    }

    fn expected_columns(&self) -> usize {
        if self.has_score {
            6
        } else {
            5
        }
    }

    /// 读取元数据文件
    ///
    /// 文件不存在或无法打开时返回错误；行级问题只记录日志并跳过该行。
    pub fn read(&self, path: &Path) -> Result<MetaReport, MetaError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|source| MetaError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })?;

        // 提前读取表头，区分 "表头损坏" 与 "行损坏"
        reader.headers().map_err(|source| MetaError::HeaderFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let expected = self.expected_columns();
        let mut report = MetaReport::default();

        for (line, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("元数据行格式错误 {} (第 {} 行): {}", path.display(), line + 2, e);
                    report.skipped_rows += 1;
                    continue;
                }
            };

            if record.len() < expected {
                warn!(
                    "元数据行字段不足 {}: 期望 {} 列, 实际 {} 列 (行: {})",
                    path.display(),
                    expected,
                    record.len(),
                    record.iter().collect::<Vec<_>>().join(",")
                );
                report.skipped_rows += 1;
                continue;
            }

            let coords: Vec<Lenient<i64>> = (1..=4).map(|i| parse_lenient(&record[i])).collect();
            let score = self.has_score.then(|| parse_lenient::<f64>(&record[5]));

            let defaulted = coords.iter().filter(|c| c.is_defaulted()).count()
                + usize::from(score.map(|s| s.is_defaulted()).unwrap_or(false));
            if defaulted > 0 {
                warn!(
                    "元数据行存在无法解析的数值，已按 0 处理 {} (行: {})",
                    path.display(),
                    record.iter().collect::<Vec<_>>().join(",")
                );
                report.defaulted_fields += defaulted;
            }

            let rect = CropRect::new(
                coords[0].value(),
                coords[1].value(),
                coords[2].value(),
                coords[3].value(),
            );
            if rect.far_corner().is_none() {
                warn!(
                    "元数据行坐标溢出，已跳过 {} (行: {})",
                    path.display(),
                    record.iter().collect::<Vec<_>>().join(",")
                );
                report.skipped_rows += 1;
                continue;
            }

            report.descriptors.push(CropDescriptor {
                source: PixelSource::PreCropped(PathBuf::from(&record[0])),
                rect,
                score: score.map(|s| s.value()),
            });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_meta(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("meta.csv");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_with_score_keeps_order_and_score() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_meta(
            dir.path(),
            "relative_crop_path,x,y,width,height,score\n\
             crops/a.jpg,1,2,30,40,0.98\n\
             crops/b.jpg,5,6,70,80,0.51\n",
        );

        let report = MetaRecordReader::with_score().read(&path).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(
            report.descriptors[0],
            CropDescriptor {
                source: PixelSource::PreCropped(PathBuf::from("crops/a.jpg")),
                rect: CropRect::new(1, 2, 30, 40),
                score: Some(0.98),
            }
        );
        assert_eq!(report.descriptors[1].score, Some(0.51));
        assert_eq!(report.skipped_rows, 0);
    }

    #[test]
    fn test_short_rows_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_meta(
            dir.path(),
            "relative_crop_path,x,y,width,height\n\
             crops/a.jpg,1,2\n\
             crops/b.jpg,5,6,70,80\n",
        );

        let report = MetaRecordReader::without_score().read(&path).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.descriptors[0].score, None);
    }

    #[test]
    fn test_score_column_required_when_expected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_meta(dir.path(), "p,x,y,w,h\ncrops/a.jpg,1,2,3,4\n");

        let report = MetaRecordReader::with_score().read(&path).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.skipped_rows, 1);
    }

    #[test]
    fn test_non_numeric_fields_default_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_meta(dir.path(), "p,x,y,w,h\ncrops/a.jpg,abc,2,30,forty\n");

        let report = MetaRecordReader::without_score().read(&path).unwrap();
        assert_eq!(report.descriptors[0].rect, CropRect::new(0, 2, 30, 0));
        assert_eq!(report.defaulted_fields, 2);
    }

    #[test]
    fn test_overflowing_coordinates_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_meta(
            dir.path(),
            "relative_crop_path,x,y,width,height,score\n\
             crops/a.jpg,9223372036854775807,0,10,10,0.9\n\
             crops/b.jpg,0,-9223372036854775808,10,-1,0.8\n\
             crops/c.jpg,1,2,30,40,0.7\n",
        );

        let report = MetaRecordReader::with_score().read(&path).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.skipped_rows, 2);
        assert_eq!(report.descriptors[0].rect, CropRect::new(1, 2, 30, 40));
    }

    #[test]
    fn test_empty_and_header_only_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_meta(dir.path(), "");
        assert!(MetaRecordReader::with_score().read(&path).unwrap().is_empty());

        let path = write_meta(dir.path(), "p,x,y,w,h,score\n");
        assert!(MetaRecordReader::with_score().read(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = MetaRecordReader::without_score().read(&dir.path().join("bing_meta.csv"));
        assert!(matches!(result, Err(MetaError::OpenFailed { .. })));
    }

    #[test]
    fn test_lenient_parse() {
        assert_eq!(parse_lenient::<i64>("42"), Lenient::Parsed(42));
        assert_eq!(parse_lenient::<i64>(" 42"), Lenient::Defaulted(0));
        assert!(parse_lenient::<f64>("x").is_defaulted());
    }
}
