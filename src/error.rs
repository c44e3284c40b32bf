//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级 `AppError` 枚举，承载配置与存储目录的错误，
//! 替代分散的 `.map_err(|e| e.to_string())` 与 `expect()`。
//! 转换链路自身的错误由 `transform::TransformError` 承载。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `std::io::Error` 提供 `From` 转换，无需手动 map。

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置无效
    #[error("配置错误: {0}")]
    Config(String),

    /// 缓存目录不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),
}
