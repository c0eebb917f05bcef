//! 键值存储接口
//!
//! 缓存包装器只依赖 `get` / `put` / `close`；`remove` 和 `entries` 供维护任务使用。
//! 单个键上的读写原子性由具体存储负责，调用方不再额外加锁。

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use thiserror::Error;

/// 存储错误
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// 键不存在
    #[error("键不存在")]
    NotFound,

    /// 存储已关闭
    #[error("存储已关闭")]
    Closed,

    /// 底层存储错误
    #[error("存储后端错误: {0}")]
    Backend(String),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        StoreError::Io(error.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 键值存储
///
/// 所有方法都是同步的，异步调用方应放在阻塞线程池中执行。
pub trait KeyValueStore: Send + Sync {
    /// 读取；不存在时返回 [`StoreError::NotFound`]
    fn get(&self, key: &[u8]) -> StoreResult<Vec<u8>>;

    /// 写入（覆盖已有值）
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// 删除，返回键是否存在
    fn remove(&self, key: &[u8]) -> StoreResult<bool>;

    /// 所有条目的快照
    fn entries(&self) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// 关闭存储
    fn close(&self) -> StoreResult<()>;
}

/// 进程内存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<Vec<u8>, Vec<u8>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StoreResult<Vec<u8>> {
        self.ensure_open()?;
        self.entries
            .get(key)
            .map(|value| value.value().clone())
            .ok_or(StoreError::NotFound)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(self.entries.remove(key).is_some())
    }

    fn entries(&self) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.ensure_open()?;
        Ok(self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
