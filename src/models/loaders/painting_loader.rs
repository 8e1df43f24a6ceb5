use crate::error::SetupError;
use crate::models::painting::{is_supported_image, Painting};
use std::path::Path;
use tokio::fs;

/// 扫描画作目录，按目录列举顺序返回支持的图片（不排序）
pub async fn load_paintings(folder: &Path) -> Result<Vec<Painting>, SetupError> {
    let read_dir_failed = |source| SetupError::ReadDirFailed {
        path: folder.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(folder).await.map_err(read_dir_failed)?;
    let mut paintings = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_dir_failed)? {
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(e) => {
                tracing::warn!("无法获取文件类型 {}: {}", entry.path().display(), e);
                continue;
            }
        };
        if file_type.is_dir() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            tracing::warn!("跳过非 UTF-8 文件名: {:?}", file_name);
            continue;
        };
        if !is_supported_image(file_name) {
            continue;
        }

        if let Some(painting) = Painting::new(entry.path()) {
            paintings.push(painting);
        }
    }

    Ok(paintings)
}
