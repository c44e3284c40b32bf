//! # 媒体转换客户端 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            界面 / CLI（main.rs，clap + env_logger）       │
//! │                                                          │
//! │   ModeSelector ── 一次只挂载一个 Orchestrator            │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ select_input / set_parameter / invoke / export
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            编排核心 (transform)                  │
//! │                                                          │
//! │  ┌─ orchestrator ── 状态机 + generation 过期校验         │
//! │  ├─ variant ─────── 模式 × 子模式 → 端点/字段/响应形态   │
//! │  ├─ response ────── 二进制 / Reveal 文本分类             │
//! │  ├─ resource ────── ResourceHandle (RAII) + 存储         │
//! │  └─ transport ───── reqwest multipart                    │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ HTTP
//!   远程转换服务（/compress/*, /steganography/image/*）
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`config`] | 服务地址、超时、上传上限等客户端配置 |
//! | [`storage`] | 预览缓存目录的获取、创建与占用统计 |
//! | [`transform`] | 模式选择、转换编排、请求分发与资源句柄管理 |

pub mod config;
pub mod error;
pub mod storage;
pub mod transform;
