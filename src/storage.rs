//! 预览缓存目录管理模块
//!
//! # 设计思路
//!
//! 统一管理资源句柄落盘的缓存目录，支持用户自定义目录，
//! 并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 优先使用配置中的自定义目录。
//! - 未设置时回退到系统缓存目录下的 `media-transform/previews`，再不行用临时目录。
//! - 目录不存在时自动 `create_dir_all`，避免上层判断。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AppError;

const APP_DIR_NAME: &str = "media-transform";
const PREVIEWS_DIR_NAME: &str = "previews";

/// 缓存目录信息
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
}

/// 获取预览缓存目录
///
/// # 参数
/// * `custom_dir` - 用户自定义目录（可选）
///
/// # 返回
/// - `Ok(PathBuf)` — 可用的缓存目录
/// - `Err(AppError::Storage)` — 无法创建目录
pub fn resolve_cache_dir(custom_dir: Option<&str>) -> Result<PathBuf, AppError> {
    if let Some(dir) = custom_dir {
        if !dir.is_empty() {
            let path = PathBuf::from(dir);
            ensure_dir(&path)?;
            return Ok(path);
        }
    }

    let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
    let previews = base.join(APP_DIR_NAME).join(PREVIEWS_DIR_NAME);
    ensure_dir(&previews)?;
    Ok(previews)
}

fn ensure_dir(path: &Path) -> Result<(), AppError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            AppError::Storage(format!("创建目录 '{}' 失败: {}", path.display(), e))
        })?;
    }
    Ok(())
}

/// 获取缓存目录信息（路径 + 占用大小 + 文件数）
pub fn cache_dir_info(dir: &Path) -> StorageInfo {
    let mut total_size: u64 = 0;
    let mut file_count: u64 = 0;

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            if let Ok(metadata) = entry.metadata() {
                if metadata.is_file() {
                    total_size += metadata.len();
                    file_count += 1;
                }
            }
        }
    }

    StorageInfo {
        path: dir.to_string_lossy().to_string(),
        total_size,
        file_count,
    }
}
