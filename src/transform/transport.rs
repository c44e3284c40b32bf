//! # 传输模块
//!
//! ## 设计思路
//!
//! 编排器只依赖 `Transport` 抽象：给定 `TransformRequest`，返回状态码、元数据与响应体。
//! 非 2xx 状态不在这里判定为错误，由响应解释模块统一处理。
//!
//! ## 实现思路
//!
//! - `HttpTransport` 基于复用型 `reqwest::Client`，连接/总超时与重定向上限来自 `ServiceConfig`。
//! - 请求统一使用 multipart：`file` 字段 + 变体声明的文本字段。
//! - `Content-Length` 按原样解析，缺失或非法时为 `None`。
//! - `reqwest` 错误映射到 `TransformError`（超时 / 网络）。

use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};

use super::response::TransportResponse;
use super::variant::{FILE_FIELD, TransformRequest};
use super::TransformError;
use crate::config::ServiceConfig;

/// 请求分发抽象。
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: TransformRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransformError>> + Send;
}

/// 基于 reqwest 的 HTTP 传输。
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// 根据配置创建传输层。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use media_transform::config::ServiceConfig;
    /// use media_transform::transform::HttpTransport;
    ///
    /// let transport = HttpTransport::new(&ServiceConfig::default())?;
    /// # Ok::<(), media_transform::transform::TransformError>(())
    /// ```
    pub fn new(config: &ServiceConfig) -> Result<Self, TransformError> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| TransformError::InvalidConfig(format!("服务地址格式错误：{}", e)))?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(concat!("media-transform/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransformError::InvalidConfig(format!("HTTP 客户端初始化失败：{}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, endpoint: &str) -> Result<reqwest::Url, TransformError> {
        reqwest::Url::parse(&format!("{}{}", self.base_url, endpoint))
            .map_err(|e| TransformError::InvalidConfig(format!("URL 格式错误：{}", e)))
    }

    fn build_form(request: &TransformRequest) -> Result<Form, TransformError> {
        // `Bytes` 克隆只增加引用计数；带长度的 stream 保留 Content-Length
        let length = request.content.len() as u64;
        let body = reqwest::Body::from(request.content.clone());
        let mut part =
            Part::stream_with_length(body, length).file_name(request.file_name.clone());
        if let Some(mime) = &request.mime {
            part = part
                .mime_str(mime)
                .map_err(|e| TransformError::InvalidConfig(format!("MIME 无效（{}）：{}", mime, e)))?;
        }

        let mut form = Form::new().part(FILE_FIELD, part);
        for (name, value) in request.variant.form_fields() {
            form = form.text(name, value);
        }
        Ok(form)
    }

    fn map_reqwest_error(err: reqwest::Error) -> TransformError {
        if err.is_timeout() {
            TransformError::Timeout(format!("请求超时：{}", err))
        } else if err.is_connect() {
            TransformError::Network(format!("无法连接转换服务：{}", err))
        } else {
            TransformError::Network(format!("请求失败：{}", err))
        }
    }

    /// 查询服务欢迎信息（`GET /`），用于连通性检查。
    pub async fn service_info(&self) -> Result<String, TransformError> {
        let response = self
            .client
            .get(self.url_for("/")?)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransformError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unexpected Status").to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransformError::Network(format!("读取响应失败：{}", e)))?;
        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| TransformError::Network(format!("服务响应解析失败：{}", e)))?;

        Ok(value
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: TransformRequest) -> Result<TransportResponse, TransformError> {
        let url = self.url_for(request.endpoint())?;
        let form = Self::build_form(&request)?;

        log::debug!(
            "📡 POST {} 字段={:?} 文件={} ({} 字节)",
            url,
            request.field_names(),
            request.file_name,
            request.content.len()
        );

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(str::to_string);
        let content_length = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|cl| cl.to_str().ok())
            .and_then(|cl| cl.parse::<u64>().ok());

        let body = response
            .bytes()
            .await
            .map_err(|e| TransformError::Network(format!("读取响应失败：{}", e)))?;

        Ok(TransportResponse {
            status,
            content_type,
            content_length,
            body,
        })
    }
}
