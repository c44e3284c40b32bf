//! # 输入来源模块
//!
//! ## 设计思路
//!
//! `InputSelection` 表示用户选中的源文件：字节内容、MIME、展示名、长度。
//! 编排器整体替换它，从不原地修改。
//!
//! ## 实现思路
//!
//! - 内容使用 `bytes::Bytes`，构建请求时克隆只增加引用计数。
//! - `from_path`：存在性 → metadata 体积限制 → 读取 → `infer` 嗅探 MIME。
//! - `infer` 无法识别时按扩展名兜底，仍识别不了则为 `None`。

use std::path::Path;

use bytes::Bytes;

use super::TransformError;

/// 用户选择的源文件。
#[derive(Debug, Clone)]
pub struct InputSelection {
    bytes: Bytes,
    mime: Option<String>,
    name: Option<String>,
}

impl InputSelection {
    pub fn new(name: Option<String>, mime: Option<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let mime = mime.or_else(|| sniff_mime(&bytes, name.as_deref()));
        Self { bytes, mime, name }
    }

    /// 从本地路径加载。
    pub fn from_path(path: &Path, max_size: u64) -> Result<Self, TransformError> {
        log::info!("📁 开始读取输入文件 - 路径: {}", path.display());

        if !path.exists() {
            return Err(TransformError::FileSystem(format!(
                "文件不存在：{}",
                path.display()
            )));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| TransformError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if !metadata.is_file() {
            return Err(TransformError::FileSystem(format!(
                "不是普通文件：{}",
                path.display()
            )));
        }

        if metadata.len() > max_size {
            return Err(TransformError::FileSystem(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                max_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| TransformError::FileSystem(format!("无法读取文件：{}", e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty());

        Ok(Self::new(name, None, bytes))
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn sniff_mime(bytes: &[u8], name: Option<&str>) -> Option<String> {
    if let Some(kind) = infer::get(bytes) {
        return Some(kind.mime_type().to_string());
    }

    let ext = name?.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        _ => return None,
    };
    Some(mime.to_string())
}

/// 以 KB 展示字节数，保留两位小数。
pub fn format_size_kb(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}
