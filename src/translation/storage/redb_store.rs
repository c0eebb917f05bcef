//! 基于 redb 的持久化键值存储
//!
//! 单个数据库文件、单张表，值没有过期时间。每次写入都是一个独立的写事务，
//! 因此同一个键上的并发写入是“最后写入者获胜”。

use std::path::Path;
use std::sync::RwLock;

use redb::{Database, ReadableTable, TableDefinition};

use super::store::{KeyValueStore, StoreError, StoreResult};

const TRANSLATIONS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("translations");

fn backend<E: Into<redb::Error>>(error: E) -> StoreError {
    StoreError::Backend(error.into().to_string())
}

/// redb 存储
pub struct RedbStore {
    db: RwLock<Option<Database>>,
}

impl RedbStore {
    /// 打开（不存在时创建）数据库文件，必要时创建父目录
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path).map_err(backend)?;

        // 提前建表，之后的只读事务不会因为表不存在而失败
        let txn = db.begin_write().map_err(backend)?;
        txn.open_table(TRANSLATIONS).map_err(backend)?;
        txn.commit().map_err(backend)?;

        tracing::info!("打开翻译缓存: {}", path.display());
        Ok(Self {
            db: RwLock::new(Some(db)),
        })
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self
            .db
            .read()
            .map_err(|_| StoreError::Backend("数据库锁已中毒".to_string()))?;
        match guard.as_ref() {
            Some(db) => f(db),
            None => Err(StoreError::Closed),
        }
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &[u8]) -> StoreResult<Vec<u8>> {
        self.with_db(|db| {
            let txn = db.begin_read().map_err(backend)?;
            let table = txn.open_table(TRANSLATIONS).map_err(backend)?;
            let value = table.get(key).map_err(backend)?;
            value
                .map(|guard| guard.value().to_vec())
                .ok_or(StoreError::NotFound)
        })
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.with_db(|db| {
            let txn = db.begin_write().map_err(backend)?;
            {
                let mut table = txn.open_table(TRANSLATIONS).map_err(backend)?;
                table.insert(key, value).map_err(backend)?;
            }
            txn.commit().map_err(backend)
        })
    }

    fn remove(&self, key: &[u8]) -> StoreResult<bool> {
        self.with_db(|db| {
            let txn = db.begin_write().map_err(backend)?;
            let existed = {
                let mut table = txn.open_table(TRANSLATIONS).map_err(backend)?;
                let removed = table.remove(key).map_err(backend)?;
                removed.is_some()
            };
            txn.commit().map_err(backend)?;
            Ok(existed)
        })
    }

    fn entries(&self) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.with_db(|db| {
            let txn = db.begin_read().map_err(backend)?;
            let table = txn.open_table(TRANSLATIONS).map_err(backend)?;
            let mut entries = Vec::new();
            for item in table.iter().map_err(backend)? {
                let (key, value) = item.map_err(backend)?;
                entries.push((key.value().to_vec(), value.value().to_vec()));
            }
            Ok(entries)
        })
    }

    fn close(&self) -> StoreResult<()> {
        let mut guard = self
            .db
            .write()
            .map_err(|_| StoreError::Backend("数据库锁已中毒".to_string()))?;
        // 丢弃 Database 即关闭文件
        guard.take();
        Ok(())
    }
}
