//! 缓存包装器
//!
//! 位于任意 [`Translator`] 之前：先查持久化存储，未命中时委托给被包装的翻译器，
//! 成功后写回存储。缓存只是加速手段，读写失败都不会影响翻译本身的可用性。

use std::sync::Arc;

use async_trait::async_trait;

use super::store::KeyValueStore;
use crate::translation::core::{cache_key, Translation, Translator};
use crate::translation::error::{TranslationError, TranslationResult};

/// 带缓存的翻译器
pub struct CachedTranslator {
    store: Arc<dyn KeyValueStore>,
    wrapped: Arc<dyn Translator>,
}

impl CachedTranslator {
    pub fn new(wrapped: Arc<dyn Translator>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, wrapped }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// 读取并校验缓存
    ///
    /// 任何读取错误都当作未命中；解码失败或不满足有效性约束的旧值同样当作未命中，
    /// 随后的成功翻译会覆盖它。
    async fn lookup(&self, key: &str) -> Option<Translation> {
        let store = Arc::clone(&self.store);
        let owned_key = key.to_string();
        let value = match tokio::task::spawn_blocking(move || store.get(owned_key.as_bytes())).await
        {
            Ok(Ok(value)) => value,
            Ok(Err(_)) => return None,
            Err(e) => {
                tracing::warn!("缓存读取任务失败 {}: {}", key, e);
                return None;
            }
        };

        match Translation::decode(&value) {
            Ok(translation) if translation.is_valid() => Some(translation),
            Ok(_) => {
                tracing::debug!("缓存条目无效，按未命中处理: {}", key);
                None
            }
            Err(e) => {
                tracing::debug!("缓存条目无法解码，按未命中处理 {}: {}", key, e);
                None
            }
        }
    }

    /// 写入存储，存储错误转换为 [`TranslationError::CacheError`]
    async fn save(&self, key: String, value: Vec<u8>) -> TranslationResult<()> {
        let store = Arc::clone(&self.store);
        Ok(tokio::task::spawn_blocking(move || store.put(key.as_bytes(), &value)).await??)
    }
}

#[async_trait]
impl Translator for CachedTranslator {
    async fn translate(&self, lang: &str, word: &str) -> TranslationResult<Translation> {
        let key = cache_key(lang, word);

        if let Some(cached) = self.lookup(&key).await {
            metrics::counter!("wordrelay_cache_hits_total").increment(1);
            tracing::debug!("缓存命中: {}", key);
            return Ok(cached);
        }
        metrics::counter!("wordrelay_cache_misses_total").increment(1);

        let translation = self.wrapped.translate(lang, word).await?;
        if !translation.is_valid() {
            return Err(TranslationError::InvalidResult(format!(
                "{} -> {}: 译文为空",
                word, lang
            )));
        }

        let value = match translation.encode() {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("翻译结果序列化失败 {}: {}", key, e);
                return Err(e);
            }
        };

        if let Err(e) = self.save(key.clone(), value).await {
            metrics::counter!("wordrelay_cache_write_failures_total").increment(1);
            tracing::warn!("写入翻译缓存失败: {}", e.with_context(key));
        }

        Ok(translation)
    }

    async fn close(&self) -> TranslationResult<()> {
        if let Err(e) = self.store.close() {
            tracing::warn!("关闭缓存存储失败: {}", e);
        }
        self.wrapped.close().await
    }
}
