use std::path::{Path, PathBuf};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 初始化错误（目录、汇总 CSV），整次运行中止
    #[error("初始化错误: {0}")]
    Setup(#[from] SetupError),
    /// 元数据文件错误
    #[error("元数据错误: {0}")]
    Meta(#[from] MetaError),
    /// 单个裁剪生成失败
    #[error("裁剪错误: {0}")]
    Crop(#[from] CropError),
    /// 外部检测器调用失败
    #[error("检测器错误: {0}")]
    Detector(#[from] DetectorError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 初始化阶段的致命错误
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("无法创建目录 {}: {source}", .path.display())]
    CreateDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("无法创建汇总 CSV {}: {source}", .path.display())]
    CreateCsvFailed { path: PathBuf, source: csv::Error },
    #[error("无法读取画作目录 {}: {source}", .path.display())]
    ReadDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// 元数据文件错误（行级问题不会走到这里，只记录日志）
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("无法打开元数据文件 {}: {source}", .path.display())]
    OpenFailed { path: PathBuf, source: csv::Error },
    #[error("无法读取元数据表头 {}: {source}", .path.display())]
    HeaderFailed { path: PathBuf, source: csv::Error },
}

/// 单个裁剪错误，只影响当前这一张裁剪
#[derive(Debug, Error)]
pub enum CropError {
    #[error("无法读取源裁剪 {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("无法写入目标裁剪 {}: {source}", .path.display())]
    DestinationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("图片解码失败 {}: {source}", .path.display())]
    DecodeFailed {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("图片编码失败 {}: {source}", .path.display())]
    EncodeFailed {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("裁剪区域 ({x},{y},{width}x{height}) 超出图片范围 {image_width}x{image_height}")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        image_width: u32,
        image_height: u32,
    },
    #[error("写入汇总 CSV 失败: {0}")]
    RecordWriteFailed(#[source] csv::Error),
}

/// 外部检测器错误
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("无法启动 {program}: {source}")]
    SpawnFailed {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} 以非零状态退出 ({status}): {stderr}")]
    NonZeroExit {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("{program} 输出的候选数量不是整数: '{output}'")]
    BadCount { program: String, output: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置文件 {} 无法加载: {source}", .path.display())]
    FileFailed { path: PathBuf, source: BoxError },
    #[error("配置项 {field} 无效: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建目录失败
    pub fn create_dir_failed(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        AppError::Setup(SetupError::CreateDirFailed {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }

    /// 配置文件读取或解析失败
    pub fn config_file_failed(
        path: impl AsRef<Path>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Config(ConfigError::FileFailed {
            path: path.as_ref().to_path_buf(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
