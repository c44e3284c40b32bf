//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ServiceConfig`：服务地址、超时、上传体积上限、缓存目录、
//! 导出兜底文件名。编排核心只接收构造好的传输层与存储，不直接读取配置文件。
//!
//! ## 实现思路
//!
//! - `Default` 提供可直接使用的本地开发配置（`http://localhost:8000`）。
//! - `load` 从 JSON 文件读取，文件不存在时回退默认值；字段缺失时逐项取默认值。
//! - `validate` 集中做范围校验，错误统一为 `AppError::Config`。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_EXPORT_FALLBACK_NAME: &str = "compressed_file";

/// 转换服务客户端配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// 转换服务根地址。
    pub base_url: String,
    /// 建立连接超时时间（秒）。
    pub connect_timeout_secs: u64,
    /// 单次请求总超时时间（秒）。视频转码耗时较长，默认值偏大。
    pub request_timeout_secs: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 允许上传的最大文件体积（字节）。
    pub max_upload_size: u64,
    /// 预览缓存目录（可选）。
    pub cache_dir: Option<String>,
    /// 原始文件名不可用时的导出文件名。
    pub export_fallback_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 8,
            request_timeout_secs: 600,
            max_redirects: 5,
            max_upload_size: 512 * 1024 * 1024,
            cache_dir: None,
            export_fallback_name: DEFAULT_EXPORT_FALLBACK_NAME.to_string(),
        }
    }
}

impl ServiceConfig {
    /// 从 JSON 文件加载配置。文件不存在时返回默认配置。
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::info!("⚙️ 配置文件不存在，使用默认配置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str::<Self>(&content)
            .map_err(|e| AppError::Config(format!("解析配置文件失败: {}", e)))?;
        config.validate()?;

        log::info!(
            "⚙️ 已加载配置 - base_url={} connect_timeout={}s request_timeout={}s",
            config.base_url,
            config.connect_timeout_secs,
            config.request_timeout_secs
        );
        Ok(config)
    }

    /// 参数范围校验。
    pub fn validate(&self) -> Result<(), AppError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| AppError::Config(format!("base_url 格式错误: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "base_url 仅支持 http/https：{}",
                self.base_url
            )));
        }
        if !(1..=120).contains(&self.connect_timeout_secs) {
            return Err(AppError::Config("connect_timeout_secs 必须在 1~120 秒之间".to_string()));
        }
        if !(1..=3600).contains(&self.request_timeout_secs) {
            return Err(AppError::Config("request_timeout_secs 必须在 1~3600 秒之间".to_string()));
        }
        if self.max_redirects > 20 {
            return Err(AppError::Config("max_redirects 不能大于 20".to_string()));
        }
        if self.max_upload_size < 1024 * 1024 {
            return Err(AppError::Config("max_upload_size 不能小于 1MB".to_string()));
        }
        let fallback = self.export_fallback_name.trim();
        if fallback.is_empty() || fallback.contains(['/', '\\']) {
            return Err(AppError::Config(
                "export_fallback_name 不能为空且不能包含路径分隔符".to_string(),
            ));
        }
        Ok(())
    }
}
