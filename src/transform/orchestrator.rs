//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `Orchestrator` 持有单个模式下的全部可变状态：输入、参数、子模式、调用状态、
//! 原始预览句柄与转换结果。外部只能通过方法修改状态。
//!
//! 一次转换的链路固定为：
//! 1. 前置校验（有输入、无在途请求）
//! 2. 构建请求（变体决定端点与字段）
//! 3. 分发并等待响应
//! 4. 按变体解释响应并安装结果
//!
//! ## 实现思路
//!
//! - 每次调用与每次输入/子模式变更都会推进 `generation`，完成时标签不一致的响应直接丢弃。
//! - 结果替换只经过 `replace_result`：先释放旧句柄，再安装新值，错误路径同样如此。
//! - 调用拆分为 `begin_invoke` → `PendingInvocation::run` → `complete_invoke`，
//!   UI 事件循环可把中间一步放到后台任务；`invoke` 是三步的顺序组合。
//!   后台任务被取消时以 `abandon_invoke` 交回未完成的调用。
//! - 记录 `build/dispatch/classify/total` 阶段耗时，便于诊断。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::mode::{ModeParameters, ParameterUpdate, SteganographySubMode, TransformMode};
use super::resource::{ResourceHandle, ResourceKind, ResourceStore};
use super::response::{ClassifiedPayload, TransportResponse, classify};
use super::source::{InputSelection, format_size_kb};
use super::transport::Transport;
use super::variant::{ResponseShape, TransformRequest, TransformVariant};
use super::TransformError;
use crate::config::DEFAULT_EXPORT_FALLBACK_NAME;

const EXPORT_PREFIX: &str = "compressed_";
const BUSY_LABEL: &str = "Processing...";

/// 调用状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum InvocationStatus {
    #[default]
    Idle,
    InFlight,
    Failed,
}

/// 转换结果。
#[derive(Debug, Default)]
pub enum TransformResult {
    /// 尚无结果，或已被新输入/子模式/新调用作废。
    #[default]
    Absent,
    /// 二进制输出。`size_bytes` 来自传输元数据，未上报时为 `None`。
    BinaryOutput {
        handle: ResourceHandle,
        size_bytes: Option<u64>,
    },
    /// Reveal 得到的隐藏文本。
    RevealedText { text: String },
}

impl TransformResult {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn output_handle(&self) -> Option<&ResourceHandle> {
        match self {
            Self::BinaryOutput { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn revealed_text(&self) -> Option<&str> {
        match self {
            Self::RevealedText { text } => Some(text),
            _ => None,
        }
    }

    pub fn size_bytes(&self) -> Option<u64> {
        match self {
            Self::BinaryOutput { size_bytes, .. } => *size_bytes,
            _ => None,
        }
    }
}

/// 面向用户的失败提示。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureNotice {
    pub code: &'static str,
    pub stage: &'static str,
    pub message: String,
    /// 网络 / 超时 / 状态码失败，不改输入直接重试即可能成功。
    pub retryable: bool,
    pub generation: u64,
}

/// 控件状态（由当前状态推导，供界面渲染）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub can_invoke: bool,
    pub can_export: bool,
    pub busy: bool,
    pub action_label: &'static str,
    pub original_size: Option<String>,
    pub output_size: Option<String>,
    pub revealed_text: Option<String>,
}

/// `invoke` / `complete_invoke` 的处理结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeOutcome {
    /// 前置条件不满足，未发出请求，状态未变。
    Rejected(TransformError),
    /// 结果已安装。
    Succeeded,
    /// 失败，状态为 `Failed`，已发出一条提示。
    Failed(TransformError),
    /// 响应已过期（期间输入或子模式发生变化），已丢弃。
    Discarded,
}

/// 已开始、尚未分发的调用。
#[derive(Debug)]
#[must_use = "必须交回 complete_invoke 或 abandon_invoke"]
pub struct PendingInvocation {
    generation: u64,
    request: TransformRequest,
    started_at: Instant,
    build_elapsed: Duration,
}

impl PendingInvocation {
    /// 通过传输层分发请求并等待响应。
    pub async fn run<T: Transport>(self, transport: &T) -> CompletedInvocation {
        let shape = self.request.variant.response_shape();
        let dispatch_start = Instant::now();
        let outcome = transport.send(self.request).await;

        CompletedInvocation {
            generation: self.generation,
            shape,
            outcome,
            started_at: self.started_at,
            build_elapsed: self.build_elapsed,
            dispatch_elapsed: dispatch_start.elapsed(),
        }
    }
}

/// 已返回（成功或失败）、尚未应用的调用。
#[derive(Debug)]
pub struct CompletedInvocation {
    generation: u64,
    shape: ResponseShape,
    outcome: Result<TransportResponse, TransformError>,
    started_at: Instant,
    build_elapsed: Duration,
    dispatch_elapsed: Duration,
}

/// 单模式转换编排器。
pub struct Orchestrator<T> {
    mode: TransformMode,
    sub_mode: SteganographySubMode,
    params: ModeParameters,
    input: Option<InputSelection>,
    input_preview: Option<ResourceHandle>,
    result: TransformResult,
    status: InvocationStatus,
    generation: u64,
    in_flight: Option<u64>,
    notices: Vec<FailureNotice>,
    export_fallback_name: String,
    transport: T,
    store: Arc<dyn ResourceStore>,
}

impl<T: Transport> Orchestrator<T> {
    /// 创建处于 `Idle`、默认参数、无结果状态的编排器。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use media_transform::config::ServiceConfig;
    /// use media_transform::transform::{
    ///     HttpTransport, MemoryResourceStore, Orchestrator, ResourceStore, TransformMode,
    /// };
    ///
    /// let transport = HttpTransport::new(&ServiceConfig::default())?;
    /// let store: Arc<dyn ResourceStore> = Arc::new(MemoryResourceStore::new());
    /// let orchestrator = Orchestrator::new(TransformMode::Image, transport, store);
    /// assert!(orchestrator.result().is_absent());
    /// # Ok::<(), media_transform::transform::TransformError>(())
    /// ```
    pub fn new(mode: TransformMode, transport: T, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            mode,
            sub_mode: SteganographySubMode::default(),
            params: ModeParameters::defaults_for(mode),
            input: None,
            input_preview: None,
            result: TransformResult::Absent,
            status: InvocationStatus::Idle,
            generation: 0,
            in_flight: None,
            notices: Vec::new(),
            export_fallback_name: DEFAULT_EXPORT_FALLBACK_NAME.to_string(),
            transport,
            store,
        }
    }

    pub fn with_export_fallback_name(mut self, name: impl Into<String>) -> Self {
        self.export_fallback_name = name.into();
        self
    }

    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    pub fn sub_mode(&self) -> SteganographySubMode {
        self.sub_mode
    }

    pub fn parameters(&self) -> &ModeParameters {
        &self.params
    }

    pub fn input(&self) -> Option<&InputSelection> {
        self.input.as_ref()
    }

    pub fn input_preview(&self) -> Option<&ResourceHandle> {
        self.input_preview.as_ref()
    }

    pub fn result(&self) -> &TransformResult {
        &self.result
    }

    pub fn status(&self) -> InvocationStatus {
        self.status
    }

    /// 尚未被界面消费的失败提示。
    pub fn notices(&self) -> &[FailureNotice] {
        &self.notices
    }

    /// 取走全部失败提示（每条只会被取走一次）。
    pub fn take_notices(&mut self) -> Vec<FailureNotice> {
        std::mem::take(&mut self.notices)
    }

    /// 当前变体（模式 × 子模式 × 参数）。
    pub fn variant(&self) -> TransformVariant {
        TransformVariant::resolve(&self.params, self.sub_mode)
    }

    pub fn control_state(&self) -> ControlState {
        let busy = self.status == InvocationStatus::InFlight;
        ControlState {
            can_invoke: self.input.is_some() && !busy,
            can_export: !busy && self.result.output_handle().is_some(),
            busy,
            action_label: if busy {
                BUSY_LABEL
            } else {
                self.variant().action_label()
            },
            original_size: self.input.as_ref().map(|i| format_size_kb(i.size())),
            output_size: self.result.size_bytes().map(format_size_kb),
            revealed_text: self.result.revealed_text().map(str::to_string),
        }
    }

    /// 替换结果：先释放旧句柄，再安装新值。
    fn replace_result(&mut self, next: TransformResult) {
        let previous = std::mem::take(&mut self.result);
        if let Some(handle) = previous.output_handle() {
            log::debug!("♻️ 作废旧结果句柄 #{}", handle.id());
        }
        drop(previous);
        self.result = next;
    }

    /// 选择新的输入文件。
    pub fn select_input(&mut self, input: InputSelection) {
        match input.mime() {
            Some(mime) if !self.mode.accepts_mime(mime) => log::warn!(
                "⚠️ 输入类型 {} 不符合 {}（仅提示，不拦截）",
                mime,
                self.mode.accept_pattern()
            ),
            None => log::debug!("❔ 无法识别输入类型，跳过类型提示"),
            _ => {}
        }

        self.generation += 1;
        self.replace_result(TransformResult::Absent);

        // 旧预览必须先于新预览释放
        self.input_preview = None;
        self.input_preview = match ResourceHandle::acquire(
            &self.store,
            ResourceKind::InputPreview,
            input.bytes(),
            input.mime(),
        ) {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::warn!("⚠️ 原始预览创建失败，继续处理：{}", err);
                None
            }
        };

        log::info!(
            "📥 已选择输入 - 模式={:?} 文件={} 大小={}",
            self.mode,
            input.name().unwrap_or("<unnamed>"),
            format_size_kb(input.size())
        );
        self.input = Some(input);

        if self.status == InvocationStatus::Failed {
            self.status = InvocationStatus::Idle;
        }
    }

    /// 设置当前模式的一个参数；参数不属于当前模式时不做任何修改并返回 `false`。
    pub fn set_parameter(&mut self, update: ParameterUpdate) -> bool {
        let key = update.key();
        let applied = self.params.apply(update);
        if !applied {
            log::warn!("⚠️ 模式 {:?} 不支持参数 `{}`，已忽略", self.mode, key);
        }
        applied
    }

    /// 切换隐写子模式；非隐写模式下返回 `false`。
    pub fn set_sub_mode(&mut self, sub_mode: SteganographySubMode) -> bool {
        if self.mode != TransformMode::ImageSteganography {
            log::warn!("⚠️ 模式 {:?} 没有子模式，已忽略", self.mode);
            return false;
        }

        self.generation += 1;
        self.replace_result(TransformResult::Absent);
        self.sub_mode = sub_mode;
        log::info!("🔀 隐写子模式切换为 {:?}", sub_mode);
        true
    }

    /// 开始一次调用：校验前置条件、置为 `InFlight`、构建请求。
    ///
    /// 前置条件不满足时返回错误且不改变任何状态。
    /// 返回的 `PendingInvocation` 必须交回 `complete_invoke` 或 `abandon_invoke`，
    /// 否则在途槽位一直被占用，直到 `dispose`。
    pub fn begin_invoke(&mut self) -> Result<PendingInvocation, TransformError> {
        if self.status == InvocationStatus::InFlight || self.in_flight.is_some() {
            log::warn!("⏳ 已有请求在途，忽略重复调用");
            return Err(TransformError::AlreadyInFlight);
        }

        let Some(input) = self.input.as_ref() else {
            log::warn!("🚫 未选择输入文件，忽略调用");
            return Err(TransformError::InputMissing);
        };

        let started_at = Instant::now();
        let request = TransformRequest::new(self.variant(), input);

        self.generation += 1;
        let generation = self.generation;
        self.in_flight = Some(generation);
        self.status = InvocationStatus::InFlight;
        self.replace_result(TransformResult::Absent);

        log::info!(
            "🚀 开始转换 #{} - {} 字段={:?}",
            generation,
            request.endpoint(),
            request.field_names()
        );

        Ok(PendingInvocation {
            generation,
            request,
            started_at,
            build_elapsed: started_at.elapsed(),
        })
    }

    /// 应用一次已返回的调用。
    pub fn complete_invoke(&mut self, completed: CompletedInvocation) -> InvokeOutcome {
        let tag = completed.generation;

        if self.in_flight == Some(tag) {
            self.in_flight = None;
            if self.status == InvocationStatus::InFlight {
                self.status = InvocationStatus::Idle;
            }
        } else {
            log::debug!("🗑️ 调用 #{} 已不在途，丢弃其响应", tag);
            return InvokeOutcome::Discarded;
        }

        if tag != self.generation {
            log::debug!(
                "🗑️ 调用 #{} 的响应已过期（当前 #{}），丢弃",
                tag,
                self.generation
            );
            return InvokeOutcome::Discarded;
        }

        let classify_start = Instant::now();
        let classified = completed
            .outcome
            .and_then(|response| classify(completed.shape, response));

        let outcome = match classified {
            Err(err) => self.fail(tag, err),
            Ok(ClassifiedPayload::RevealedText(text)) => {
                log::info!("🔍 Reveal 完成，消息长度 {} 字符", text.chars().count());
                self.replace_result(TransformResult::RevealedText { text });
                self.status = InvocationStatus::Idle;
                InvokeOutcome::Succeeded
            }
            Ok(ClassifiedPayload::Binary {
                body,
                mime,
                declared_size,
            }) => {
                self.replace_result(TransformResult::Absent);
                match ResourceHandle::acquire(
                    &self.store,
                    ResourceKind::Output,
                    &body,
                    mime.as_deref(),
                ) {
                    Ok(handle) => {
                        match declared_size {
                            Some(size) => log::info!("📦 收到结果 {}", format_size_kb(size)),
                            None => log::info!("📦 收到结果（服务未上报大小）"),
                        }
                        self.replace_result(TransformResult::BinaryOutput {
                            handle,
                            size_bytes: declared_size,
                        });
                        self.status = InvocationStatus::Idle;
                        InvokeOutcome::Succeeded
                    }
                    Err(err) => self.fail(tag, err),
                }
            }
        };

        log::info!(
            "✅ 转换 #{} 结束 - build={}ms dispatch={}ms classify={}ms total={}ms",
            tag,
            completed.build_elapsed.as_millis(),
            completed.dispatch_elapsed.as_millis(),
            classify_start.elapsed().as_millis(),
            completed.started_at.elapsed().as_millis()
        );

        outcome
    }

    /// 放弃一次未完成的调用（例如后台任务被取消）：释放在途槽位，不安装结果、不发出提示。
    pub fn abandon_invoke(&mut self, pending: PendingInvocation) {
        let tag = pending.generation;
        if self.in_flight != Some(tag) {
            log::debug!("🗑️ 调用 #{} 已不在途，无需放弃", tag);
            return;
        }

        self.in_flight = None;
        if self.status == InvocationStatus::InFlight {
            self.status = InvocationStatus::Idle;
        }
        log::info!("⏹️ 已放弃调用 #{}", tag);
    }

    fn fail(&mut self, generation: u64, err: TransformError) -> InvokeOutcome {
        log::error!("❌ 转换 #{} 失败：{}", generation, err);
        self.replace_result(TransformResult::Absent);
        self.status = InvocationStatus::Failed;
        self.notices.push(FailureNotice {
            code: err.code(),
            stage: err.stage(),
            message: err.to_string(),
            retryable: err.is_transport_failure(),
            generation,
        });
        InvokeOutcome::Failed(err)
    }

    /// 执行一次完整转换。
    pub async fn invoke(&mut self) -> InvokeOutcome {
        let pending = match self.begin_invoke() {
            Ok(pending) => pending,
            Err(err) => return InvokeOutcome::Rejected(err),
        };
        let completed = pending.run(&self.transport).await;
        self.complete_invoke(completed)
    }

    /// 导出文件名：`compressed_<原文件名>`，原文件名不可用时使用兜底名。
    pub fn export_file_name(&self) -> String {
        let original = self
            .input
            .as_ref()
            .and_then(|i| i.name())
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().to_string())
            .filter(|name| !name.is_empty());

        match original {
            Some(name) => format!("{}{}", EXPORT_PREFIX, name),
            None => self.export_fallback_name.clone(),
        }
    }

    /// 将二进制结果导出到目录，返回目标路径。
    pub fn export(&self, dest_dir: &Path) -> Result<PathBuf, TransformError> {
        let Some(handle) = self.result.output_handle() else {
            return Err(TransformError::NotReady("没有可导出的二进制结果".to_string()));
        };

        let dest = dest_dir.join(self.export_file_name());
        let written = handle.export_to(&dest)?;
        log::info!("💾 已导出 {} ({})", dest.display(), format_size_kb(written));
        Ok(dest)
    }

    /// 释放全部句柄；之后到达的响应都会被丢弃。
    pub fn dispose(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.status = InvocationStatus::Idle;
        self.replace_result(TransformResult::Absent);
        self.input_preview = None;
        self.input = None;
        log::debug!("🧹 编排器 {:?} 已释放全部资源", self.mode);
    }
}
