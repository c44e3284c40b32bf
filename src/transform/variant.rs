//! # 转换变体与请求模型
//!
//! ## 设计思路
//!
//! 参数结构、端点、响应形态三者都由“模式 × 子模式”决定。
//! 这里把组合显式展开为 `TransformVariant`，每个变体一个分支，由编译器保证穷尽。
//!
//! ## 实现思路
//!
//! - `TransformVariant::resolve` 是唯一把状态字段折叠为变体的地方。
//! - `TransformRequest` 是传输层的输入：变体 + 文件内容，不含任何 HTTP 细节。

use bytes::Bytes;

use super::mode::{ModeParameters, SteganographySubMode};
use super::source::InputSelection;

pub const ENDPOINT_COMPRESS_IMAGE: &str = "/compress/image";
pub const ENDPOINT_COMPRESS_VIDEO: &str = "/compress/video";
pub const ENDPOINT_COMPRESS_AUDIO: &str = "/compress/audio";
pub const ENDPOINT_STEGO_HIDE: &str = "/steganography/image/hide";
pub const ENDPOINT_STEGO_REVEAL: &str = "/steganography/image/reveal";

/// 上传文件使用的表单字段名。
pub const FILE_FIELD: &str = "file";

/// 响应形态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// 不透明的二进制媒体。
    Binary,
    /// 含 `hidden_message` 字段的结构化文本。
    RevealedText,
}

/// 一次转换请求的完整变体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformVariant {
    CompressImage { quality: u8 },
    CompressVideo { bitrate_kbps: u32 },
    CompressAudio { bitrate_kbps: u32 },
    HideMessage { message: String },
    RevealMessage,
}

impl TransformVariant {
    /// 由当前参数与子模式确定变体。
    pub fn resolve(params: &ModeParameters, sub_mode: SteganographySubMode) -> Self {
        match params {
            ModeParameters::Image { quality } => Self::CompressImage { quality: *quality },
            ModeParameters::Video { bitrate_kbps } => Self::CompressVideo {
                bitrate_kbps: *bitrate_kbps,
            },
            ModeParameters::Audio { bitrate_kbps } => Self::CompressAudio {
                bitrate_kbps: *bitrate_kbps,
            },
            ModeParameters::ImageSteganography { message } => match sub_mode {
                SteganographySubMode::Hide => Self::HideMessage {
                    message: message.clone(),
                },
                SteganographySubMode::Reveal => Self::RevealMessage,
            },
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::CompressImage { .. } => ENDPOINT_COMPRESS_IMAGE,
            Self::CompressVideo { .. } => ENDPOINT_COMPRESS_VIDEO,
            Self::CompressAudio { .. } => ENDPOINT_COMPRESS_AUDIO,
            Self::HideMessage { .. } => ENDPOINT_STEGO_HIDE,
            Self::RevealMessage => ENDPOINT_STEGO_REVEAL,
        }
    }

    /// 除 `file` 之外的文本表单字段。
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::CompressImage { quality } => vec![("quality", quality.to_string())],
            Self::CompressVideo { bitrate_kbps } | Self::CompressAudio { bitrate_kbps } => {
                vec![("bitrate", bitrate_kbps.to_string())]
            }
            Self::HideMessage { message } => vec![("message", message.clone())],
            Self::RevealMessage => Vec::new(),
        }
    }

    pub fn response_shape(&self) -> ResponseShape {
        match self {
            Self::RevealMessage => ResponseShape::RevealedText,
            Self::CompressImage { .. }
            | Self::CompressVideo { .. }
            | Self::CompressAudio { .. }
            | Self::HideMessage { .. } => ResponseShape::Binary,
        }
    }

    /// 操作按钮文案。
    pub fn action_label(&self) -> &'static str {
        match self {
            Self::CompressImage { .. } | Self::CompressVideo { .. } | Self::CompressAudio { .. } => {
                "Compress"
            }
            Self::HideMessage { .. } => "Hide",
            Self::RevealMessage => "Reveal",
        }
    }
}

/// 发往传输层的请求。
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub variant: TransformVariant,
    pub file_name: String,
    pub mime: Option<String>,
    pub content: Bytes,
}

impl TransformRequest {
    pub fn new(variant: TransformVariant, input: &InputSelection) -> Self {
        Self {
            variant,
            file_name: input.name().unwrap_or("upload").to_string(),
            mime: input.mime().map(str::to_string),
            content: input.bytes().clone(),
        }
    }

    pub fn endpoint(&self) -> &'static str {
        self.variant.endpoint()
    }

    /// 完整字段名列表（含 `file`），用于日志与测试断言。
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = vec![FILE_FIELD];
        names.extend(self.variant.form_fields().into_iter().map(|(name, _)| name));
        names
    }
}
