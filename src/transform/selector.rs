//! # 模式选择器
//!
//! 顶层界面状态：任一时刻只挂载一个 `Orchestrator`。
//! 切换模式时销毁旧实例并以默认参数新建，模式之间不保留任何状态。

use std::sync::Arc;

use serde::Serialize;

use super::mode::TransformMode;
use super::orchestrator::Orchestrator;
use super::resource::ResourceStore;
use super::transport::Transport;
use crate::config::DEFAULT_EXPORT_FALLBACK_NAME;

/// 模式标签页。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeTab {
    pub mode: TransformMode,
    pub label: &'static str,
    pub accept: &'static str,
    pub active: bool,
}

pub struct ModeSelector<T> {
    transport: T,
    store: Arc<dyn ResourceStore>,
    export_fallback_name: String,
    active: Orchestrator<T>,
}

impl<T: Transport + Clone> ModeSelector<T> {
    pub fn new(transport: T, store: Arc<dyn ResourceStore>, initial: TransformMode) -> Self {
        let active = Orchestrator::new(initial, transport.clone(), Arc::clone(&store));
        Self {
            transport,
            store,
            export_fallback_name: DEFAULT_EXPORT_FALLBACK_NAME.to_string(),
            active,
        }
    }

    pub fn with_export_fallback_name(mut self, name: impl Into<String>) -> Self {
        self.export_fallback_name = name.into();
        self.active.dispose();
        self.active = self.fresh(self.active.mode());
        self
    }

    fn fresh(&self, mode: TransformMode) -> Orchestrator<T> {
        Orchestrator::new(mode, self.transport.clone(), Arc::clone(&self.store))
            .with_export_fallback_name(self.export_fallback_name.clone())
    }

    pub fn mode(&self) -> TransformMode {
        self.active.mode()
    }

    pub fn active(&self) -> &Orchestrator<T> {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut Orchestrator<T> {
        &mut self.active
    }

    /// 全部模式及其激活状态，按展示顺序排列。
    pub fn tabs(&self) -> Vec<ModeTab> {
        let current = self.mode();
        TransformMode::ALL
            .iter()
            .map(|&mode| ModeTab {
                mode,
                label: mode.label(),
                accept: mode.accept_pattern(),
                active: mode == current,
            })
            .collect()
    }

    /// 切换模式。与当前模式相同时保留现有实例并返回 `false`。
    pub fn select(&mut self, mode: TransformMode) -> bool {
        if mode == self.active.mode() {
            log::debug!("📑 模式 {:?} 已激活，无需切换", mode);
            return false;
        }

        self.active.dispose();
        self.active = self.fresh(mode);
        log::info!("📑 已切换到模式 {:?}", mode);
        true
    }

    /// 销毁当前编排器持有的资源。
    pub fn dispose(&mut self) {
        self.active.dispose();
    }
}
