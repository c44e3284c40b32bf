//! 集成测试公用工具：脚本化传输层与常用响应/输入构造。

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use media_transform::transform::{
    InputSelection, MemoryResourceStore, ResourceStore, TransformError, TransformRequest,
    Transport, TransportResponse,
};

/// 按顺序返回预设响应，并记录收到的每个请求。
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<Result<TransportResponse, TransformError>>>>,
    requests: Arc<Mutex<Vec<TransformRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<TransportResponse, TransformError>) {
        self.responses
            .lock()
            .expect("responses lock poisoned")
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<TransformRequest> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests lock poisoned").len()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: TransformRequest) -> Result<TransportResponse, TransformError> {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(request);
        self.responses
            .lock()
            .expect("responses lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(TransformError::Network("no scripted response".to_string())))
    }
}

pub fn memory_store() -> (Arc<MemoryResourceStore>, Arc<dyn ResourceStore>) {
    let memory = Arc::new(MemoryResourceStore::new());
    let store: Arc<dyn ResourceStore> = memory.clone();
    (memory, store)
}

pub fn binary_response(body: &[u8], mime: &str, declared_size: Option<u64>) -> TransportResponse {
    TransportResponse {
        status: 200,
        content_type: Some(mime.to_string()),
        content_length: declared_size,
        body: Bytes::copy_from_slice(body),
    }
}

pub fn json_response(status: u16, value: serde_json::Value) -> TransportResponse {
    TransportResponse {
        status,
        content_type: Some("application/json".to_string()),
        content_length: None,
        body: Bytes::from(value.to_string()),
    }
}

/// 以 PNG 文件头开头、总长为 `size` 字节的输入。
pub fn png_input(name: &str, size: usize) -> InputSelection {
    let mut data = vec![0u8; size.max(8)];
    data[..8].copy_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    InputSelection::new(Some(name.to_string()), None, data)
}

/// 未知格式的输入。
pub fn opaque_input(name: &str, mime: &str, size: usize) -> InputSelection {
    let mut data = b"opaque-bytes".to_vec();
    data.resize(size.max(data.len()), b'.');
    InputSelection::new(Some(name.to_string()), Some(mime.to_string()), data)
}
