//! 翻译模块
//!
//! 单词级翻译管线，所有组件实现同一个 [`Translator`] 接口，构造时层层包装：
//! - **core**: 数据模型、翻译接口和面向请求的 [`TranslationService`]
//! - **backends**: 外部命令后端和远端节点后端
//! - **pool**: 按策略依次尝试多个后端的翻译池
//! - **storage**: 缓存包装器、键值存储和缓存维护
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wordrelay::notify::Notifier;
//! use wordrelay::translation::{
//!     CachedTranslator, MemoryStore, PoolTranslator, ShellBackend, StraightForward,
//!     TranslationService, Translator,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let shell = ShellBackend::discover("/usr/bin/trans").await?;
//! let pool = PoolTranslator::new(Box::new(StraightForward), vec![Arc::new(shell)]);
//! let cached = CachedTranslator::new(Arc::new(pool), Arc::new(MemoryStore::new()));
//! let service = TranslationService::new(Arc::new(cached), Notifier::disabled());
//!
//! if let Some(tr) = service.translate("es", "hello").await? {
//!     println!("{} {}", tr.word, tr.spell);
//! }
//! service.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod core;
pub mod error;
pub mod pool;
pub mod storage;

pub use backends::{RemoteBackend, ShellBackend};
pub use config::{ConfigManager, ServiceConfig, StrategyKind};
pub use core::{cache_key, normalize, BatchItem, Translation, TranslationService, Translator};
pub use error::{TranslationError, TranslationResult};
pub use pool::{strategy_for, PoolTranslator, Random, StraightForward, Strategy};
pub use storage::{
    purge_invalid, CachedTranslator, KeyValueStore, MemoryStore, PurgeReport, RedbStore,
    StoreError,
};
