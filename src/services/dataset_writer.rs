//! 汇总 CSV 写入服务 - 业务能力层
//!
//! 只负责"追加一行记录"能力，不关心流程

use crate::error::SetupError;
use crate::models::crop::{DatasetRecord, DATASET_HEADER};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 汇总 CSV 写入器
///
/// 整次运行只有一个实例，所有图片共用；每个阶段结束后 flush，
/// 后续崩溃时已写入的记录仍然保留。
pub struct DatasetWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows_written: usize,
}

impl DatasetWriter {
    /// 创建（覆盖）汇总 CSV 并写入表头
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref().to_path_buf();
        let csv_failed = |source| SetupError::CreateCsvFailed {
            path: path.clone(),
            source,
        };

        let mut writer = csv::Writer::from_path(&path).map_err(csv_failed)?;
        writer.write_record(DATASET_HEADER).map_err(csv_failed)?;
        writer
            .flush()
            .map_err(|e| SetupError::CreateCsvFailed {
                path: path.clone(),
                source: e.into(),
            })?;

        Ok(Self {
            path,
            writer,
            rows_written: 0,
        })
    }

    /// 追加一条记录（不 flush）
    pub fn append(&mut self, record: &DatasetRecord) -> Result<(), csv::Error> {
        debug!(
            "写入记录: {} | 裁剪 {} | 来源 {}",
            record.original_filename, record.crop_index, record.origin
        );
        self.writer.write_record(record.to_row())?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
