use crate::error::{AppError, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 临时目录清理策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempCleanup {
    /// 全部图片处理完成后，按创建顺序的逆序统一删除
    Deferred,
    /// 每张图片处理完成后立即删除
    PerImage,
}

impl std::str::FromStr for TempCleanup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deferred" => Ok(TempCleanup::Deferred),
            "per_image" | "per-image" | "immediate" => Ok(TempCleanup::PerImage),
            other => Err(format!("未知的清理策略: {}", other)),
        }
    }
}

/// 程序配置
///
/// 启动时构建一次，之后以 `&Config` 传给每个组件，运行期间不再修改。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 待处理的画作目录
    pub paintings_dir: PathBuf,
    /// 候选框检测器（FRCNN）使用的 Python 解释器
    pub proposal_interpreter: PathBuf,
    /// 候选框检测器脚本
    pub proposal_script: PathBuf,
    /// 显著性检测器（BING）可执行文件
    pub saliency_executable: PathBuf,
    /// 输出根目录（crops/ 与 combined_data.csv 都在这里）
    pub output_dir: PathBuf,
    /// 每张图片临时工作目录的父目录
    pub temp_base_dir: PathBuf,
    /// 每张图片从检测器获取的裁剪上限
    pub crops_per_painting: usize,
    /// 每张图片额外生成的低显著性裁剪数量
    pub filler_crops: usize,
    pub filler_width: u32,
    pub filler_height: u32,
    pub filler_jpeg_quality: u8,
    pub temp_cleanup: TempCleanup,
    /// 固定随机种子（为空时使用系统熵）
    pub rng_seed: Option<u64>,
    // --- 带标签导出 ---
    pub labeled_crops_dir: PathBuf,
    pub labeled_jpeg_quality: u8,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paintings_dir: PathBuf::from("../images/paintings"),
            proposal_interpreter: PathBuf::from("./frcnn_processor/venv_main_frcnn/bin/python"),
            proposal_script: PathBuf::from("./frcnn_processor/src/rp_rcnn_single.py"),
            saliency_executable: PathBuf::from("./bing_processor/build/BingCropperSingle"),
            output_dir: PathBuf::from("./output"),
            temp_base_dir: PathBuf::from("./temp_processing"),
            crops_per_painting: 20,
            filler_crops: 5,
            filler_width: 224,
            filler_height: 224,
            filler_jpeg_quality: 90,
            temp_cleanup: TempCleanup::Deferred,
            rng_seed: None,
            labeled_crops_dir: PathBuf::from("output_crops"),
            labeled_jpeg_quality: 95,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 按 默认值 → TOML 文件 → 环境变量 的顺序加载配置
    pub fn load(config_file: Option<&Path>) -> Result<Self, AppError> {
        let base = match config_file {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config_file_failed(path, e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| AppError::config_file_failed(path, e))?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 用 `COMBO_*` 环境变量覆盖当前值，无法解析的值保持原样
    pub fn with_env_overrides(self) -> Self {
        fn path_var(name: &str, current: PathBuf) -> PathBuf {
            std::env::var(name).map(PathBuf::from).unwrap_or(current)
        }
        fn parsed_var<T: std::str::FromStr>(name: &str, current: T) -> T {
            std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(current)
        }

        Self {
            paintings_dir: path_var("COMBO_PAINTINGS_DIR", self.paintings_dir),
            proposal_interpreter: path_var("COMBO_PROPOSAL_INTERPRETER", self.proposal_interpreter),
            proposal_script: path_var("COMBO_PROPOSAL_SCRIPT", self.proposal_script),
            saliency_executable: path_var("COMBO_SALIENCY_EXECUTABLE", self.saliency_executable),
            output_dir: path_var("COMBO_OUTPUT_DIR", self.output_dir),
            temp_base_dir: path_var("COMBO_TEMP_BASE_DIR", self.temp_base_dir),
            crops_per_painting: parsed_var("COMBO_CROPS_PER_PAINTING", self.crops_per_painting),
            filler_crops: parsed_var("COMBO_FILLER_CROPS", self.filler_crops),
            filler_width: parsed_var("COMBO_FILLER_WIDTH", self.filler_width),
            filler_height: parsed_var("COMBO_FILLER_HEIGHT", self.filler_height),
            filler_jpeg_quality: parsed_var("COMBO_FILLER_JPEG_QUALITY", self.filler_jpeg_quality),
            temp_cleanup: parsed_var("COMBO_TEMP_CLEANUP", self.temp_cleanup),
            rng_seed: std::env::var("COMBO_RNG_SEED")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(self.rng_seed),
            labeled_crops_dir: path_var("COMBO_LABELED_CROPS_DIR", self.labeled_crops_dir),
            labeled_jpeg_quality: parsed_var("COMBO_LABELED_JPEG_QUALITY", self.labeled_jpeg_quality),
            verbose_logging: parsed_var("VERBOSE_LOGGING", self.verbose_logging),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.crops_per_painting == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crops_per_painting",
                reason: "必须大于 0".to_string(),
            }
            .into());
        }
        if self.filler_width == 0 || self.filler_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "filler_width/filler_height",
                reason: "尺寸必须大于 0".to_string(),
            }
            .into());
        }
        for (field, quality) in [
            ("filler_jpeg_quality", self.filler_jpeg_quality),
            ("labeled_jpeg_quality", self.labeled_jpeg_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("JPEG 质量 {} 不在 1..=100 范围内", quality),
                }
                .into());
            }
        }
        Ok(())
    }

    /// 最终裁剪图片目录
    pub fn crops_dir(&self) -> PathBuf {
        self.output_dir.join("crops")
    }

    /// 汇总 CSV 路径
    pub fn combined_csv(&self) -> PathBuf {
        self.output_dir.join("combined_data.csv")
    }
}
