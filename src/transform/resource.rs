//! # 资源句柄模块
//!
//! ## 设计思路
//!
//! 原始预览与结果预览都以“本地资源句柄”形式存在（相当于浏览器里的 object URL），
//! 必须显式释放，否则会随着反复转换无限累积。
//!
//! ## 实现思路
//!
//! - `ResourceStore` 为可注入存储：`FsResourceStore` 落盘到缓存目录，`MemoryResourceStore` 常驻内存。
//! - `ResourceHandle` 采用 RAII：构造时写入存储，`Drop` 时自动释放。
//!   编排器替换/丢弃句柄的任何路径（包括错误路径）都会经过 `Drop`，不存在遗漏调用点。
//! - 存储内部使用 `Mutex` 保护句柄表，多个编排器可共享同一存储实例。

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use chrono::Local;
use serde::Serialize;

use super::TransformError;

pub type ResourceId = u64;

/// 句柄用途。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    /// 原始文件预览。
    InputPreview,
    /// 转换结果。
    Output,
}

/// 资源存储。
pub trait ResourceStore: Send + Sync + fmt::Debug {
    /// 写入数据并返回新句柄 ID。
    fn put(
        &self,
        kind: ResourceKind,
        data: &[u8],
        mime: Option<&str>,
    ) -> Result<ResourceId, TransformError>;

    /// 释放句柄。未知 ID 忽略。
    fn release(&self, id: ResourceId);

    /// 展示用地址（文件路径或内存地址）。
    fn uri(&self, id: ResourceId) -> Option<String>;

    /// 将资源内容写到目标路径，返回写入字节数。
    fn export_to(&self, id: ResourceId, dest: &Path) -> Result<u64, TransformError>;

    /// 当前存活句柄数。
    fn live_count(&self) -> usize;
}

/// 资源句柄（RAII）。
pub struct ResourceHandle {
    id: ResourceId,
    kind: ResourceKind,
    size: u64,
    store: Arc<dyn ResourceStore>,
}

impl ResourceHandle {
    /// 写入存储并获得句柄。
    pub fn acquire(
        store: &Arc<dyn ResourceStore>,
        kind: ResourceKind,
        data: &[u8],
        mime: Option<&str>,
    ) -> Result<Self, TransformError> {
        let id = store.put(kind, data, mime)?;
        log::debug!("📦 已创建资源句柄 #{} ({:?}, {} 字节)", id, kind, data.len());
        Ok(Self {
            id,
            kind,
            size: data.len() as u64,
            store: Arc::clone(store),
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn uri(&self) -> Option<String> {
        self.store.uri(self.id)
    }

    pub fn export_to(&self, dest: &Path) -> Result<u64, TransformError> {
        self.store.export_to(self.id, dest)
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.store.release(self.id);
        log::debug!("🧹 已释放资源句柄 #{} ({:?})", self.id, self.kind);
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .finish()
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ============================================================================
// 文件系统存储
// ============================================================================

/// 落盘存储：每个句柄对应缓存目录中的一个文件。
#[derive(Debug)]
pub struct FsResourceStore {
    root: PathBuf,
    next_id: AtomicU64,
    entries: Mutex<HashMap<ResourceId, PathBuf>>,
}

impl FsResourceStore {
    /// 在指定目录创建存储（目录不存在时自动创建）。
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, TransformError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            TransformError::Storage(format!("创建缓存目录 '{}' 失败: {}", root.display(), e))
        })?;
        Ok(Self {
            root,
            next_id: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        })
    }

    fn path_of(&self, id: ResourceId) -> Option<PathBuf> {
        lock_or_recover(&self.entries).get(&id).cloned()
    }
}

impl ResourceStore for FsResourceStore {
    fn put(
        &self,
        kind: ResourceKind,
        data: &[u8],
        mime: Option<&str>,
    ) -> Result<ResourceId, TransformError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let timestamp = Local::now().format("%Y%m%d%H%M%S%f");
        let file_name = format!("blob_{}_{}.{}", timestamp, id, blob_extension(data, mime));
        let path = self.root.join(file_name);

        if let Err(e) = std::fs::write(&path, data) {
            // 写入中途失败时文件可能已创建，未登记的文件不会被 release / Drop 清理
            let _ = std::fs::remove_file(&path);
            return Err(TransformError::Storage(format!("写入缓存文件失败: {}", e)));
        }

        lock_or_recover(&self.entries).insert(id, path);
        log::debug!("💾 {:?} 资源已写入缓存 #{}", kind, id);
        Ok(id)
    }

    fn release(&self, id: ResourceId) {
        let removed = lock_or_recover(&self.entries).remove(&id);
        if let Some(path) = removed {
            if let Err(err) = std::fs::remove_file(&path) {
                log::warn!("⚠️ 删除缓存文件失败 {}: {}", path.display(), err);
            }
        }
    }

    fn uri(&self, id: ResourceId) -> Option<String> {
        self.path_of(id).map(|p| p.to_string_lossy().to_string())
    }

    fn export_to(&self, id: ResourceId, dest: &Path) -> Result<u64, TransformError> {
        let source = self
            .path_of(id)
            .ok_or_else(|| TransformError::Storage(format!("资源 #{} 已释放", id)))?;
        std::fs::copy(&source, dest)
            .map_err(|e| TransformError::Storage(format!("导出到 '{}' 失败: {}", dest.display(), e)))
    }

    fn live_count(&self) -> usize {
        lock_or_recover(&self.entries).len()
    }
}

impl Drop for FsResourceStore {
    fn drop(&mut self) {
        let leftovers: Vec<PathBuf> = lock_or_recover(&self.entries).drain().map(|(_, p)| p).collect();
        if !leftovers.is_empty() {
            log::warn!("⚠️ 存储销毁时仍有 {} 个未释放句柄，已清理", leftovers.len());
        }
        for path in leftovers {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn blob_extension(data: &[u8], mime: Option<&str>) -> &'static str {
    if let Some(kind) = infer::get(data) {
        return kind.extension();
    }
    match mime.map(|m| m.split(';').next().unwrap_or(m).trim()) {
        Some("image/jpeg") => "jpg",
        Some("image/png") => "png",
        Some("video/mp4") => "mp4",
        Some("audio/mpeg") => "mp3",
        _ => "bin",
    }
}

// ============================================================================
// 内存存储
// ============================================================================

/// 事件日志上限，超出后丢弃最早的事件。
pub const EVENT_LOG_CAPACITY: usize = 256;

/// 存储事件（按发生顺序记录）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Put(ResourceId, ResourceKind),
    Release(ResourceId),
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<ResourceId, (ResourceKind, Bytes)>,
    events: VecDeque<StoreEvent>,
}

impl MemoryState {
    fn record(&mut self, event: StoreEvent) {
        if self.events.len() >= EVENT_LOG_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// 内存存储：不落盘，记录最近的句柄事件，便于无磁盘环境与诊断。
#[derive(Debug)]
pub struct MemoryResourceStore {
    next_id: AtomicU64,
    state: Mutex<MemoryState>,
}

impl Default for MemoryResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// 指定用途的存活句柄数。
    pub fn live_of_kind(&self, kind: ResourceKind) -> usize {
        lock_or_recover(&self.state)
            .entries
            .values()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// 存活句柄总数。
    pub fn live_count(&self) -> usize {
        lock_or_recover(&self.state).entries.len()
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        lock_or_recover(&self.state).entries.contains_key(&id)
    }

    pub fn contents(&self, id: ResourceId) -> Option<Bytes> {
        lock_or_recover(&self.state)
            .entries
            .get(&id)
            .map(|(_, bytes)| bytes.clone())
    }

    /// 最近事件的快照（至多 `EVENT_LOG_CAPACITY` 条）。
    pub fn events(&self) -> Vec<StoreEvent> {
        lock_or_recover(&self.state).events.iter().copied().collect()
    }

    /// 取走并清空事件日志。
    pub fn take_events(&self) -> Vec<StoreEvent> {
        lock_or_recover(&self.state).events.drain(..).collect()
    }
}

impl ResourceStore for MemoryResourceStore {
    fn put(
        &self,
        kind: ResourceKind,
        data: &[u8],
        _mime: Option<&str>,
    ) -> Result<ResourceId, TransformError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut state = lock_or_recover(&self.state);
        state.entries.insert(id, (kind, Bytes::copy_from_slice(data)));
        state.record(StoreEvent::Put(id, kind));
        Ok(id)
    }

    fn release(&self, id: ResourceId) {
        let mut state = lock_or_recover(&self.state);
        if state.entries.remove(&id).is_some() {
            state.record(StoreEvent::Release(id));
        }
    }

    fn uri(&self, id: ResourceId) -> Option<String> {
        self.is_live(id).then(|| format!("memory://{}", id))
    }

    fn export_to(&self, id: ResourceId, dest: &Path) -> Result<u64, TransformError> {
        let bytes = self
            .contents(id)
            .ok_or_else(|| TransformError::Storage(format!("资源 #{} 已释放", id)))?;
        std::fs::write(dest, &bytes)
            .map_err(|e| TransformError::Storage(format!("导出到 '{}' 失败: {}", dest.display(), e)))?;
        Ok(bytes.len() as u64)
    }

    fn live_count(&self) -> usize {
        MemoryResourceStore::live_count(self)
    }
}
