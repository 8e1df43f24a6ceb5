//! 临时工作目录管理 - 基础设施层
//!
//! 每张图片一个 `<base>/<name>_temp/` 目录。默认所有目录在整次运行结束后
//! 按创建顺序的逆序删除；也可以配置为每张图片处理完立即删除。

use crate::config::TempCleanup;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct TempRegistry {
    base_dir: PathBuf,
    policy: TempCleanup,
    /// 等待统一删除的目录（按创建顺序）
    pending: Vec<PathBuf>,
}

impl TempRegistry {
    pub fn new(base_dir: impl Into<PathBuf>, policy: TempCleanup) -> Self {
        Self {
            base_dir: base_dir.into(),
            policy,
            pending: Vec::new(),
        }
    }

    /// 为一张图片创建工作目录（含 `crops/` 子目录）并登记
    pub fn acquire(&mut self, base_name: &str) -> io::Result<PathBuf> {
        let dir = self.base_dir.join(format!("{}_temp", base_name));
        fs::create_dir_all(dir.join("crops"))?;
        if !self.pending.contains(&dir) {
            self.pending.push(dir.clone());
        }
        Ok(dir)
    }

    /// 一张图片处理结束；立即清理策略下删除其目录
    pub fn finish(&mut self, dir: &Path) {
        if self.policy != TempCleanup::PerImage {
            return;
        }
        remove_dir(dir);
        self.pending.retain(|d| d != dir);
    }

    /// 按逆序删除所有仍登记的目录
    pub fn release_all(&mut self) {
        while let Some(dir) = self.pending.pop() {
            remove_dir(&dir);
        }
    }

    pub fn pending(&self) -> &[PathBuf] {
        &self.pending
    }
}

impl Drop for TempRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

fn remove_dir(dir: &Path) {
    match fs::remove_dir_all(dir) {
        Ok(()) => debug!("已删除临时目录: {}", dir.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("⚠️ 删除临时目录失败 {}: {}", dir.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_cleanup_keeps_dirs_until_release() {
        let base = tempfile::tempdir().unwrap();
        let mut registry = TempRegistry::new(base.path(), TempCleanup::Deferred);

        let a = registry.acquire("monet_1").unwrap();
        let b = registry.acquire("monet_2").unwrap();
        assert!(a.join("crops").is_dir());
        assert_eq!(a, base.path().join("monet_1_temp"));

        registry.finish(&a);
        assert!(a.exists());
        assert_eq!(registry.pending(), &[a.clone(), b.clone()]);

        registry.release_all();
        assert!(!a.exists());
        assert!(!b.exists());
        assert!(registry.pending().is_empty());
    }

    #[test]
    fn test_per_image_cleanup_removes_immediately() {
        let base = tempfile::tempdir().unwrap();
        let mut registry = TempRegistry::new(base.path(), TempCleanup::PerImage);

        let a = registry.acquire("monet_1").unwrap();
        registry.finish(&a);
        assert!(!a.exists());
        assert!(registry.pending().is_empty());
    }

    #[test]
    fn test_drop_releases_pending() {
        let base = tempfile::tempdir().unwrap();
        let dir = {
            let mut registry = TempRegistry::new(base.path(), TempCleanup::Deferred);
            registry.acquire("monet_1").unwrap()
        };
        assert!(!dir.exists());
    }
}
