//! # wordrelay
//!
//! 单词翻译中继：把本地命令行翻译工具和其他节点组合成一条带持久化缓存、
//! 可故障转移的翻译管线，并通过 HTTP 对外提供服务。
//!
//! ## 模块组织
//!
//! - `translation` - 翻译管线（后端、翻译池、缓存、配置）
//! - `notify` - 批量发送的通知通道
//! - `env` - 环境变量覆盖
//! - `web` - HTTP 服务（可选）

pub mod env;
pub mod notify;
pub mod translation;
#[cfg(feature = "web")]
pub mod web;

pub use translation::{Translation, TranslationError, TranslationResult, Translator};
