//! 存储管理模块 - 翻译缓存与持久化
//!
//! - `store`: 键值存储接口和内存实现
//! - `redb_store`: 基于 redb 的持久化实现
//! - `cached`: 位于任意翻译器之前的缓存包装器
//! - `maintenance`: 清理空值和乱码缓存条目

pub mod cached;
pub mod maintenance;
pub mod redb_store;
pub mod store;

pub use cached::CachedTranslator;
pub use maintenance::{purge_invalid, PurgeReason, PurgeReport};
pub use redb_store::RedbStore;
pub use store::{KeyValueStore, MemoryStore, StoreError, StoreResult};
