//! 集成测试共用的假检测器与测试目录

#![allow(dead_code)]

use combo_cropper::error::DetectorError;
use combo_cropper::{Config, RegionDetectors, SaliencyRun, TempCleanup};
use image::{Rgb, RgbImage};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// 假的候选框检测器行为
#[derive(Debug, Clone)]
pub enum ProposalBehavior {
    /// 打印 `reported`，写出 `rows` 行元数据；`missing` 中的序号不生成裁剪文件
    Rows {
        reported: i64,
        rows: usize,
        missing: Vec<usize>,
    },
    /// 打印 `reported`，原样写出给定的元数据内容
    RawMeta { reported: i64, meta: String },
    /// 进程失败
    Fails,
}

/// 假的显著性检测器行为
#[derive(Debug, Clone)]
pub enum SaliencyBehavior {
    /// 最多产出 `available` 个候选
    Yields { available: usize },
    /// 退出但不写元数据文件
    NoMetaFile,
}

/// 不启动子进程，直接在工作目录写出元数据与裁剪文件
pub struct FakeDetectors {
    pub proposal: ProposalBehavior,
    pub saliency: SaliencyBehavior,
    pub proposal_calls: RefCell<Vec<PathBuf>>,
    pub saliency_calls: RefCell<Vec<usize>>,
    /// 设置后，每次调用检测器时读取一次汇总 CSV
    observed_csv: Option<PathBuf>,
    pub csv_at_propose: RefCell<Vec<Vec<Vec<String>>>>,
    pub csv_at_saliency: RefCell<Vec<Vec<Vec<String>>>>,
}

impl FakeDetectors {
    pub fn new(proposal: ProposalBehavior, saliency: SaliencyBehavior) -> Self {
        Self {
            proposal,
            saliency,
            proposal_calls: RefCell::new(Vec::new()),
            saliency_calls: RefCell::new(Vec::new()),
            observed_csv: None,
            csv_at_propose: RefCell::new(Vec::new()),
            csv_at_saliency: RefCell::new(Vec::new()),
        }
    }

    pub fn observing_csv(mut self, path: PathBuf) -> Self {
        self.observed_csv = Some(path);
        self
    }

    fn snapshot(&self) -> Option<Vec<Vec<String>>> {
        self.observed_csv.as_deref().map(read_rows)
    }
}

/// 读取 CSV 的全部数据行（不含表头）
pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

impl RegionDetectors for FakeDetectors {
    async fn propose(&self, image: &Path, work_dir: &Path) -> Result<i64, DetectorError> {
        self.proposal_calls.borrow_mut().push(image.to_path_buf());
        if let Some(rows) = self.snapshot() {
            self.csv_at_propose.borrow_mut().push(rows);
        }

        match &self.proposal {
            ProposalBehavior::Fails => Err(DetectorError::BadCount {
                program: "fake-frcnn".to_string(),
                output: "Traceback".to_string(),
            }),
            ProposalBehavior::RawMeta { reported, meta } => {
                fs::write(work_dir.join("frcnn_meta.csv"), meta).unwrap();
                Ok(*reported)
            }
            ProposalBehavior::Rows {
                reported,
                rows,
                missing,
            } => {
                let mut meta = String::from("relative_crop_path,x,y,width,height,score\n");
                for i in 0..*rows {
                    let relative = format!("crops/frcnn_{}.jpg", i);
                    if !missing.contains(&i) {
                        fs::write(work_dir.join(&relative), format!("frcnn-{}", i)).unwrap();
                    }
                    meta.push_str(&format!(
                        "{},{},{},{},{},{:.2}\n",
                        relative,
                        i,
                        i * 2,
                        50,
                        40,
                        0.99 - i as f64 * 0.01
                    ));
                }
                fs::write(work_dir.join("frcnn_meta.csv"), meta).unwrap();
                Ok(*reported)
            }
        }
    }

    async fn saliency(
        &self,
        _image: &Path,
        requested: usize,
        work_dir: &Path,
    ) -> Result<SaliencyRun, DetectorError> {
        self.saliency_calls.borrow_mut().push(requested);
        if let Some(rows) = self.snapshot() {
            self.csv_at_saliency.borrow_mut().push(rows);
        }

        match &self.saliency {
            SaliencyBehavior::NoMetaFile => Ok(SaliencyRun {
                succeeded: false,
                status: "exit status: 1".to_string(),
                output: "BING_CPP Error: model not found".to_string(),
            }),
            SaliencyBehavior::Yields { available } => {
                let mut meta = String::from("relative_crop_path,x,y,width,height\n");
                for i in 0..(*available).min(requested) {
                    let relative = format!("crops/bing_{}.jpg", i);
                    fs::write(work_dir.join(&relative), format!("bing-{}", i)).unwrap();
                    meta.push_str(&format!("{},{},{},{},{}\n", relative, 3 * i, 7, 60, 30));
                }
                fs::write(work_dir.join("bing_meta.csv"), meta).unwrap();
                Ok(SaliencyRun {
                    succeeded: true,
                    status: "exit status: 0".to_string(),
                    output: String::new(),
                })
            }
        }
    }
}

/// 测试用目录布局
pub struct Workspace {
    pub root: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("paintings")).unwrap();
        Self { root }
    }

    pub fn paintings_dir(&self) -> PathBuf {
        self.root.path().join("paintings")
    }

    /// 生成一张纯色画作
    pub fn add_painting(&self, file_name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.paintings_dir().join(file_name);
        RgbImage::from_pixel(width, height, Rgb([120, 80, 40]))
            .save(&path)
            .unwrap();
        path
    }

    pub fn config(&self) -> Config {
        Config {
            paintings_dir: self.paintings_dir(),
            output_dir: self.root.path().join("output"),
            temp_base_dir: self.root.path().join("temp_processing"),
            temp_cleanup: TempCleanup::Deferred,
            rng_seed: Some(20240601),
            ..Config::default()
        }
    }

    /// 读取汇总 CSV（不含表头）
    pub fn rows(&self) -> Vec<Vec<String>> {
        read_rows(&self.config().combined_csv())
    }

    pub fn rows_for(&self, file_name: &str) -> Vec<Vec<String>> {
        self.rows()
            .into_iter()
            .filter(|row| row[0] == file_name)
            .collect()
    }
}
