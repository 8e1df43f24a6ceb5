//! 外部检测器调用 - 基础设施层
//!
//! 持有检测器程序路径，只暴露"运行检测器"的能力。
//! 每次调用都阻塞到子进程退出，没有超时。

use crate::config::Config;
use crate::error::DetectorError;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// 候选框检测器写出的元数据文件名
pub const PROPOSAL_META_FILE: &str = "frcnn_meta.csv";
/// 显著性检测器写出的元数据文件名
pub const SALIENCY_META_FILE: &str = "bing_meta.csv";

/// 一次显著性检测器调用的结果
///
/// 不论退出状态如何，输出都会被保留用于诊断。
#[derive(Debug, Clone)]
pub struct SaliencyRun {
    pub succeeded: bool,
    pub status: String,
    /// stdout 与 stderr 合并后的文本
    pub output: String,
}

/// 两个外部检测器的调用接口
#[allow(async_fn_in_trait)]
pub trait RegionDetectors {
    /// 运行候选框检测器，返回其在标准输出打印的候选数量（原始有符号值）
    ///
    /// 检测器需在 `work_dir` 下写出 [`PROPOSAL_META_FILE`]。
    async fn propose(&self, image: &Path, work_dir: &Path) -> Result<i64, DetectorError>;

    /// 运行显著性检测器，请求 `requested` 个候选
    ///
    /// 检测器需在 `work_dir` 下写出 [`SALIENCY_META_FILE`]。
    async fn saliency(
        &self,
        image: &Path,
        requested: usize,
        work_dir: &Path,
    ) -> Result<SaliencyRun, DetectorError>;
}

/// 以子进程方式运行检测器
pub struct ProcessDetectors {
    proposal_interpreter: PathBuf,
    proposal_script: PathBuf,
    saliency_executable: PathBuf,
}

impl ProcessDetectors {
    pub fn new(config: &Config) -> Self {
        Self {
            proposal_interpreter: config.proposal_interpreter.clone(),
            proposal_script: config.proposal_script.clone(),
            saliency_executable: config.saliency_executable.clone(),
        }
    }

    async fn run(command: &mut Command, program: &str) -> Result<Output, DetectorError> {
        debug!("执行: {:?}", command.as_std());
        command
            .output()
            .await
            .map_err(|source| DetectorError::SpawnFailed {
                program: program.to_string(),
                source,
            })
    }
}

impl RegionDetectors for ProcessDetectors {
    async fn propose(&self, image: &Path, work_dir: &Path) -> Result<i64, DetectorError> {
        let program = self.proposal_script.display().to_string();
        let output = Self::run(
            Command::new(&self.proposal_interpreter)
                .arg(&self.proposal_script)
                .arg(image)
                .arg(work_dir),
            &program,
        )
        .await?;

        if !output.status.success() {
            return Err(DetectorError::NonZeroExit {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_count(&program, &String::from_utf8_lossy(&output.stdout))
    }

    async fn saliency(
        &self,
        image: &Path,
        requested: usize,
        work_dir: &Path,
    ) -> Result<SaliencyRun, DetectorError> {
        let program = self.saliency_executable.display().to_string();
        let spawn_failed = |source| DetectorError::SpawnFailed {
            program: program.clone(),
            source,
        };

        // 检测器以自身所在目录为工作目录运行，所以参数一律用绝对路径
        let executable = absolutize(&self.saliency_executable).map_err(spawn_failed)?;
        let image = absolutize(image).map_err(spawn_failed)?;
        let work_dir = absolutize(work_dir).map_err(spawn_failed)?;

        let mut command = Command::new(&executable);
        command
            .arg(&image)
            .arg(requested.to_string())
            .arg(&work_dir);
        if let Some(parent) = executable.parent() {
            command.current_dir(parent);
        }

        let output = Self::run(&mut command, &program).await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(SaliencyRun {
            succeeded: output.status.success(),
            status: output.status.to_string(),
            output: combined,
        })
    }
}

/// 解析检测器打印的候选数量
pub fn parse_count(program: &str, stdout: &str) -> Result<i64, DetectorError> {
    stdout
        .trim()
        .parse::<i64>()
        .map_err(|_| DetectorError::BadCount {
            program: program.to_string(),
            output: stdout.to_string(),
        })
}

fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("frcnn", "17\n").unwrap(), 17);
        assert_eq!(parse_count("frcnn", "  0 ").unwrap(), 0);
        assert_eq!(parse_count("frcnn", "-2").unwrap(), -2);
        assert!(matches!(
            parse_count("frcnn", "Loading model...\n12"),
            Err(DetectorError::BadCount { .. })
        ));
        assert!(parse_count("frcnn", "").is_err());
    }

    #[test]
    fn test_absolutize_keeps_absolute_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(absolutize(dir.path()).unwrap(), dir.path());
        assert!(absolutize(Path::new("relative/x")).unwrap().is_absolute());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_interpreter_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            proposal_interpreter: dir.path().join("no-such-python"),
            ..Config::default()
        };
        let detectors = ProcessDetectors::new(&config);

        let result = detectors
            .propose(&dir.path().join("a.jpg"), dir.path())
            .await;
        assert!(matches!(result, Err(DetectorError::SpawnFailed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saliency_output_kept_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            saliency_executable: PathBuf::from("/bin/sh"),
            ..Config::default()
        };
        let detectors = ProcessDetectors::new(&config);

        // /bin/sh 把 "图片路径" 当作脚本执行，文件不存在时以非零状态退出并输出错误
        let run = detectors
            .saliency(&dir.path().join("missing.jpg"), 3, dir.path())
            .await
            .unwrap();
        assert!(!run.succeeded);
        assert!(!run.output.is_empty());
    }
}
