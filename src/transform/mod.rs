//! # 媒体转换编排模块（transform）
//!
//! ## 设计思路
//!
//! 该模块将“模式选择 → 输入选择 → 参数设置 → 请求分发 → 响应解释 → 结果导出”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `selector`：顶层模式切换，任一时刻只持有一个编排器
//! - `orchestrator`：单模式下的全部状态与调用流程
//! - `mode` / `variant`：模式、参数与“模式 × 子模式”变体
//! - `source`：输入文件模型
//! - `transport`：请求分发（reqwest multipart）
//! - `response`：按变体解释响应
//! - `resource`：资源句柄与可注入存储
//! - `error`：错误模型
//!
//! ## 调用链
//!
//! ```text
//! ModeSelector::select(mode)
//!    ↓
//! Orchestrator（select_input / set_parameter / set_sub_mode）
//!    ↓
//! invoke
//!    ├─ begin_invoke（前置校验 + TransformVariant → TransformRequest）
//!    ├─ PendingInvocation::run（Transport::send）
//!    └─ complete_invoke（generation 校验 → classify → ResourceHandle）
//!    ↓
//! export / dispose
//! ```

mod error;
mod mode;
mod orchestrator;
mod resource;
mod response;
mod selector;
mod source;
mod transport;
mod variant;

pub use error::TransformError;
pub use mode::{
    AUDIO_BITRATE_RANGE, DEFAULT_AUDIO_BITRATE_KBPS, DEFAULT_IMAGE_QUALITY,
    DEFAULT_VIDEO_BITRATE_KBPS, IMAGE_QUALITY_RANGE, ModeParameters, ParameterUpdate,
    SteganographySubMode, TransformMode, VIDEO_BITRATE_RANGE,
};
pub use orchestrator::{
    CompletedInvocation, ControlState, FailureNotice, InvocationStatus, InvokeOutcome,
    Orchestrator, PendingInvocation, TransformResult,
};
pub use resource::{
    EVENT_LOG_CAPACITY, FsResourceStore, MemoryResourceStore, ResourceHandle, ResourceId, ResourceKind,
    ResourceStore, StoreEvent,
};
pub use response::{ClassifiedPayload, HIDDEN_MESSAGE_FIELD, TransportResponse, classify};
pub use selector::{ModeSelector, ModeTab};
pub use source::{InputSelection, format_size_kb};
pub use transport::{HttpTransport, Transport};
pub use variant::{ResponseShape, TransformRequest, TransformVariant};
