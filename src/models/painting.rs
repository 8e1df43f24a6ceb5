//! 画作（输入图片）模型

use phf::phf_set;
use std::path::PathBuf;

/// 支持的图片扩展名（小写）
static SUPPORTED_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "jpg",
    "jpeg",
    "png",
};

/// 标记错误标注文件的文件名片段（大小写不敏感）
const WRONG_MARKER: &str = "_WRONG";

/// 判断文件名是否为支持的图片格式（按后缀匹配，大小写不敏感）
///
/// 只看最后一个 `.` 之后的部分，所以 `.jpg` 这样的文件名也算图片。
pub fn is_supported_image(file_name: &str) -> bool {
    file_name
        .to_ascii_lowercase()
        .rsplit_once('.')
        .is_some_and(|(_, ext)| SUPPORTED_EXTENSIONS.contains(ext))
}

/// 判断文件名是否带有错误标注标记
pub fn is_mislabeled(file_name: &str) -> bool {
    file_name.to_uppercase().contains(WRONG_MARKER)
}

/// 一张待处理的画作
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Painting {
    /// 完整路径
    pub path: PathBuf,
    /// 原始文件名（含扩展名），写入汇总 CSV
    pub file_name: String,
    /// 去掉扩展名的文件名，用于生成裁剪文件名
    pub base_name: String,
    pub is_wrong: bool,
}

impl Painting {
    pub fn new(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let base_name = match file_name.rfind('.') {
            Some(pos) => file_name[..pos].to_string(),
            None => file_name.clone(),
        };
        let is_wrong = is_mislabeled(&file_name);
        Some(Self {
            path,
            file_name,
            base_name,
            is_wrong,
        })
    }
}
