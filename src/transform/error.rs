//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载转换链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! `code()` / `stage()` 提供稳定的机器可读标识，供 `FailureNotice` 与前端展示使用。

/// 转换链路统一错误类型。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("未选择输入文件")]
    InputMissing,

    #[error("已有转换请求正在处理中")]
    AlreadyInFlight,

    #[error("网络错误：{0}")]
    Network(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("服务拒绝处理：{0}")]
    ServiceRejected(String),

    #[error("资源存储错误：{0}")]
    Storage(String),

    #[error("结果尚未就绪：{0}")]
    NotReady(String),

    #[error("配置错误：{0}")]
    InvalidConfig(String),

    #[error("文件错误：{0}")]
    FileSystem(String),
}

impl TransformError {
    /// 稳定错误码，不随提示文案变化。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InputMissing => "input_missing",
            Self::AlreadyInFlight => "already_in_flight",
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::HttpStatus { .. } => "http_status",
            Self::ServiceRejected(_) => "service_rejected",
            Self::Storage(_) => "storage",
            Self::NotReady(_) => "not_ready",
            Self::InvalidConfig(_) => "invalid_config",
            Self::FileSystem(_) => "file_system",
        }
    }

    /// 错误发生的阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InputMissing | Self::AlreadyInFlight => "precondition",
            Self::Network(_) | Self::Timeout(_) | Self::HttpStatus { .. } => "dispatch",
            Self::ServiceRejected(_) => "classify",
            Self::Storage(_) => "materialize",
            Self::NotReady(_) => "export",
            Self::InvalidConfig(_) => "config",
            Self::FileSystem(_) => "load",
        }
    }

    /// 是否属于“传输失败”类别（网络错误、超时或非成功状态码），此类失败可原样重试。
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::HttpStatus { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::TransformError;

    #[test]
    fn transport_failures_are_classified() {
        assert!(TransformError::Network("refused".into()).is_transport_failure());
        assert!(TransformError::Timeout("slow".into()).is_transport_failure());
        assert!(
            TransformError::HttpStatus {
                status: 500,
                message: "Internal Server Error".into()
            }
            .is_transport_failure()
        );
        assert!(!TransformError::InputMissing.is_transport_failure());
        assert!(!TransformError::ServiceRejected("too long".into()).is_transport_failure());
    }

    #[test]
    fn codes_and_stages_are_stable() {
        let err = TransformError::HttpStatus {
            status: 502,
            message: "Bad Gateway".into(),
        };
        assert_eq!(err.code(), "http_status");
        assert_eq!(err.stage(), "dispatch");
        assert_eq!(TransformError::Storage("disk full".into()).stage(), "materialize");
    }
}
