//! # 响应解释模块
//!
//! ## 设计思路
//!
//! 成功响应的形态取决于变体：Reveal 返回结构化文本，其余返回二进制媒体。
//! 把响应当成错误的形态处理会静默损坏输出，因此分类逻辑集中在 `classify`。
//!
//! ## 实现思路
//!
//! - 非 2xx 状态一律视为传输失败，不解析响应体。
//! - Reveal：解析 JSON 并提取 `hidden_message`，缺字段或无法解析按空文本处理（仅告警）。
//! - 二进制：`Content-Length` 仅用于展示，缺失不影响结果；
//!   若返回 `application/json` 且带 `error` 字段（隐写服务消息过长时的行为），视为服务拒绝。

use bytes::Bytes;

use super::TransformError;
use super::variant::ResponseShape;

/// Reveal 响应中的消息字段名。
pub const HIDDEN_MESSAGE_FIELD: &str = "hidden_message";

/// 传输层返回的原始响应。
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false)
    }
}

/// 分类后的成功载荷。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedPayload {
    Binary {
        body: Bytes,
        mime: Option<String>,
        declared_size: Option<u64>,
    },
    RevealedText(String),
}

/// 按形态解释响应。
pub fn classify(
    shape: ResponseShape,
    response: TransportResponse,
) -> Result<ClassifiedPayload, TransformError> {
    if !response.is_success() {
        return Err(TransformError::HttpStatus {
            status: response.status,
            message: status_message(response.status).to_string(),
        });
    }

    match shape {
        ResponseShape::RevealedText => Ok(ClassifiedPayload::RevealedText(extract_hidden_message(
            &response.body,
        ))),
        ResponseShape::Binary => {
            if response.is_json() {
                if let Some(reason) = extract_service_error(&response.body) {
                    return Err(TransformError::ServiceRejected(reason));
                }
            }

            Ok(ClassifiedPayload::Binary {
                mime: response.content_type,
                declared_size: response.content_length,
                body: response.body,
            })
        }
    }
}

fn extract_hidden_message(body: &[u8]) -> String {
    let value = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("⚠️ Reveal 响应无法解析为 JSON，按空消息处理：{}", e);
            return String::new();
        }
    };

    match value.get(HIDDEN_MESSAGE_FIELD).and_then(serde_json::Value::as_str) {
        Some(message) => message.to_string(),
        None => {
            log::warn!("⚠️ Reveal 响应缺少 `{}` 字段，按空消息处理", HIDDEN_MESSAGE_FIELD);
            String::new()
        }
    }
}

fn extract_service_error(body: &[u8]) -> Option<String> {
    let value = serde_json::from_slice::<serde_json::Value>(body).ok()?;
    value
        .get("error")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

fn status_message(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unexpected Status",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, content_type: Option<&str>, body: &[u8]) -> TransportResponse {
        TransportResponse {
            status,
            content_type: content_type.map(str::to_string),
            content_length: Some(body.len() as u64),
            body: Bytes::copy_from_slice(body),
        }
    }

    #[test]
    fn reveal_extracts_hidden_message() {
        let resp = response(200, Some("application/json"), br#"{"hidden_message": "secret"}"#);
        let payload = classify(ResponseShape::RevealedText, resp).expect("classify should succeed");
        assert_eq!(payload, ClassifiedPayload::RevealedText("secret".into()));
    }

    #[test]
    fn reveal_missing_field_is_empty_text() {
        let resp = response(200, Some("application/json"), br#"{"other": 1}"#);
        let payload = classify(ResponseShape::RevealedText, resp).expect("classify should succeed");
        assert_eq!(payload, ClassifiedPayload::RevealedText(String::new()));
    }

    #[test]
    fn reveal_garbage_body_is_empty_text() {
        let resp = response(200, None, b"\x00\x01not json");
        let payload = classify(ResponseShape::RevealedText, resp).expect("classify should succeed");
        assert_eq!(payload, ClassifiedPayload::RevealedText(String::new()));
    }

    #[test]
    fn binary_keeps_body_and_declared_size() {
        let resp = response(200, Some("image/jpeg"), &[0xFF, 0xD8, 0xFF]);
        let payload = classify(ResponseShape::Binary, resp).expect("classify should succeed");
        assert_eq!(
            payload,
            ClassifiedPayload::Binary {
                body: Bytes::from_static(&[0xFF, 0xD8, 0xFF]),
                mime: Some("image/jpeg".into()),
                declared_size: Some(3),
            }
        );
    }

    #[test]
    fn binary_without_length_is_not_an_error() {
        let mut resp = response(200, Some("video/mp4"), b"....");
        resp.content_length = None;
        let payload = classify(ResponseShape::Binary, resp).expect("classify should succeed");
        assert!(matches!(
            payload,
            ClassifiedPayload::Binary {
                declared_size: None,
                ..
            }
        ));
    }

    #[test]
    fn binary_json_error_is_service_rejection() {
        let resp = response(
            200,
            Some("application/json"),
            br#"{"error": "Message too long to hide in this image."}"#,
        );
        let err = classify(ResponseShape::Binary, resp).expect_err("should be rejected");
        assert!(matches!(err, TransformError::ServiceRejected(_)));
    }

    #[test]
    fn non_success_status_is_transport_failure() {
        let resp = response(500, Some("text/plain"), b"boom");
        let err = classify(ResponseShape::Binary, resp).expect_err("500 should fail");
        assert_eq!(
            err,
            TransformError::HttpStatus {
                status: 500,
                message: "Internal Server Error".into()
            }
        );
        assert!(err.is_transport_failure());

        let resp = response(404, None, b"");
        let err = classify(ResponseShape::RevealedText, resp).expect_err("404 should fail");
        assert!(err.is_transport_failure());
    }
}
