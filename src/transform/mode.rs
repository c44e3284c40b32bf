//! # 模式与参数模块
//!
//! ## 设计思路
//!
//! 模式（`TransformMode`）决定参数结构、请求端点与响应解释规则；
//! 子模式（`SteganographySubMode`）仅对隐写模式有意义。
//!
//! ## 实现思路
//!
//! - `ModeParameters` 每个模式恰好一组参数，默认值与原前端滑块一致。
//! - 取值范围只作为“控件约束”对外公布（`*_RANGE` 常量），编排器本身不做钳制。
//! - `ParameterUpdate` 表示一次“设置某个参数”的动作，由 `ModeParameters::apply`
//!   判断该参数是否属于当前模式。

use std::ops::RangeInclusive;

use serde::Serialize;

pub const IMAGE_QUALITY_RANGE: RangeInclusive<u8> = 0..=100;
pub const VIDEO_BITRATE_RANGE: RangeInclusive<u32> = 300..=5000;
pub const AUDIO_BITRATE_RANGE: RangeInclusive<u32> = 30..=320;

pub const DEFAULT_IMAGE_QUALITY: u8 = 30;
pub const DEFAULT_VIDEO_BITRATE_KBPS: u32 = 1000;
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 128;

/// 媒体转换模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransformMode {
    Image,
    Video,
    Audio,
    ImageSteganography,
}

impl TransformMode {
    /// 模式选择器的展示顺序。
    pub const ALL: [TransformMode; 4] = [
        TransformMode::Image,
        TransformMode::Video,
        TransformMode::Audio,
        TransformMode::ImageSteganography,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::ImageSteganography => "Steganography",
        }
    }

    /// 文件选择器的 MIME 过滤规则（仅作提示）。
    pub fn accept_pattern(self) -> &'static str {
        match self {
            Self::Image | Self::ImageSteganography => "image/*",
            Self::Video => "video/*",
            Self::Audio => "audio/*",
        }
    }

    /// 判断 MIME 是否符合 `accept_pattern`。
    pub fn accepts_mime(self, mime: &str) -> bool {
        let prefix = self.accept_pattern().trim_end_matches('*');
        mime.trim().to_ascii_lowercase().starts_with(prefix)
    }
}

/// 隐写子模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SteganographySubMode {
    #[default]
    Hide,
    Reveal,
}

/// 单次参数设置动作。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterUpdate {
    /// 图片质量（0~100）。
    Quality(u8),
    /// 视频/音频码率（kbps）。
    Bitrate(u32),
    /// 隐写消息。
    Message(String),
}

impl ParameterUpdate {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Quality(_) => "quality",
            Self::Bitrate(_) => "bitrate",
            Self::Message(_) => "message",
        }
    }
}

/// 模式参数，每个模式恰好一组。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ModeParameters {
    Image { quality: u8 },
    Video { bitrate_kbps: u32 },
    Audio { bitrate_kbps: u32 },
    /// `message` 只在 Hide 子模式下参与请求，Reveal 期间保留原值。
    ImageSteganography { message: String },
}

impl ModeParameters {
    /// 指定模式的默认参数。
    pub fn defaults_for(mode: TransformMode) -> Self {
        match mode {
            TransformMode::Image => Self::Image {
                quality: DEFAULT_IMAGE_QUALITY,
            },
            TransformMode::Video => Self::Video {
                bitrate_kbps: DEFAULT_VIDEO_BITRATE_KBPS,
            },
            TransformMode::Audio => Self::Audio {
                bitrate_kbps: DEFAULT_AUDIO_BITRATE_KBPS,
            },
            TransformMode::ImageSteganography => Self::ImageSteganography {
                message: String::new(),
            },
        }
    }

    pub fn mode(&self) -> TransformMode {
        match self {
            Self::Image { .. } => TransformMode::Image,
            Self::Video { .. } => TransformMode::Video,
            Self::Audio { .. } => TransformMode::Audio,
            Self::ImageSteganography { .. } => TransformMode::ImageSteganography,
        }
    }

    /// 应用一次参数设置。
    ///
    /// 参数不属于当前模式时返回 `false` 且不做任何修改。
    pub fn apply(&mut self, update: ParameterUpdate) -> bool {
        match (self, update) {
            (Self::Image { quality }, ParameterUpdate::Quality(value)) => {
                *quality = value;
                true
            }
            (Self::Video { bitrate_kbps }, ParameterUpdate::Bitrate(value))
            | (Self::Audio { bitrate_kbps }, ParameterUpdate::Bitrate(value)) => {
                *bitrate_kbps = value;
                true
            }
            (Self::ImageSteganography { message }, ParameterUpdate::Message(value)) => {
                *message = value;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_slider_defaults() {
        assert_eq!(
            ModeParameters::defaults_for(TransformMode::Image),
            ModeParameters::Image { quality: 30 }
        );
        assert_eq!(
            ModeParameters::defaults_for(TransformMode::Video),
            ModeParameters::Video { bitrate_kbps: 1000 }
        );
        assert_eq!(
            ModeParameters::defaults_for(TransformMode::Audio),
            ModeParameters::Audio { bitrate_kbps: 128 }
        );
        for mode in TransformMode::ALL {
            assert_eq!(ModeParameters::defaults_for(mode).mode(), mode);
        }
    }

    #[test]
    fn apply_rejects_foreign_parameters() {
        let mut params = ModeParameters::defaults_for(TransformMode::Image);
        assert!(!params.apply(ParameterUpdate::Bitrate(500)));
        assert!(!params.apply(ParameterUpdate::Message("hi".into())));
        assert_eq!(params, ModeParameters::Image { quality: 30 });

        assert!(params.apply(ParameterUpdate::Quality(85)));
        assert_eq!(params, ModeParameters::Image { quality: 85 });
    }

    #[test]
    fn apply_does_not_clamp() {
        let mut params = ModeParameters::defaults_for(TransformMode::Audio);
        assert!(params.apply(ParameterUpdate::Bitrate(9_999)));
        assert_eq!(params, ModeParameters::Audio { bitrate_kbps: 9_999 });
    }

    #[test]
    fn accept_pattern_is_advisory_prefix_match() {
        assert!(TransformMode::Image.accepts_mime("image/jpeg"));
        assert!(TransformMode::ImageSteganography.accepts_mime("IMAGE/PNG"));
        assert!(TransformMode::Video.accepts_mime("video/mp4"));
        assert!(!TransformMode::Audio.accepts_mime("video/mp4"));
    }
}
