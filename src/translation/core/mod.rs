//! 翻译核心契约
//!
//! 所有后端（外部命令、远端节点）和包装器（翻译池、缓存）都实现同一个
//! [`Translator`] 接口，通过构造时层层包装组合成一条完整的翻译管线：
//!
//! ```text
//! TranslationService (service.rs)
//!     └── CachedTranslator (storage/cached.rs)
//!             └── PoolTranslator (pool.rs)
//!                     ├── ShellBackend (backends/shell.rs)
//!                     └── RemoteBackend (backends/remote.rs) ...
//! ```

pub mod service;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::translation::error::{TranslationError, TranslationResult};

pub use service::{BatchItem, TranslationService};

/// 单个单词的翻译结果
///
/// `original` 和 `lang` 回显请求，`word` 是主要译文，`spell` 是可选的音标或
/// 其他拼写形式（没有时为空字符串）。构造后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Translation {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub spell: String,
}

impl Translation {
    pub fn new(
        original: impl Into<String>,
        lang: impl Into<String>,
        word: impl Into<String>,
        spell: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            lang: lang.into(),
            word: word.into(),
            spell: spell.into(),
        }
    }

    /// 有效性约束：`word`、`lang`、`original` 均非空
    ///
    /// 不满足约束的翻译既不能写入缓存，也不能作为成功结果返回。
    pub fn is_valid(&self) -> bool {
        !self.word.is_empty() && !self.lang.is_empty() && !self.original.is_empty()
    }

    /// 编码为缓存值
    pub fn encode(&self) -> TranslationResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// 从缓存值解码
    pub fn decode(bytes: &[u8]) -> TranslationResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// 统一的翻译接口
///
/// `lang` 和 `word` 由调用方预先规范化（小写、去除首尾空白），实现不再重复处理。
/// 无法给出结果时必须返回错误，而不是一个降级的 [`Translation`]。
#[async_trait]
pub trait Translator: Send + Sync {
    /// 翻译单个单词
    async fn translate(&self, lang: &str, word: &str) -> TranslationResult<Translation>;

    /// 释放资源，只在关闭时调用一次
    async fn close(&self) -> TranslationResult<()> {
        Ok(())
    }

    /// 带超时的翻译
    ///
    /// 超时后内部 future 被丢弃：正在运行的外部命令会被杀掉，进行中的 HTTP
    /// 请求会被中止。
    async fn translate_with_timeout(
        &self,
        lang: &str,
        word: &str,
        deadline: Duration,
    ) -> TranslationResult<Translation> {
        tokio::time::timeout(deadline, self.translate(lang, word))
            .await
            .map_err(|e| {
                TranslationError::from(e)
                    .with_context(format!("{} -> {} 超过 {:?}", word, lang, deadline))
            })?
    }

    /// 可取消的翻译，令牌触发时立即返回 [`TranslationError::Cancelled`]
    async fn translate_cancellable(
        &self,
        lang: &str,
        word: &str,
        cancel: &CancellationToken,
    ) -> TranslationResult<Translation> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TranslationError::Cancelled),
            result = self.translate(lang, word) => result,
        }
    }
}

/// 规范化请求参数：去除首尾空白并转为小写
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// 生成缓存键 `lang:word`
pub fn cache_key(lang: &str, word: &str) -> String {
    format!("{}:{}", normalize(lang), normalize(word))
}
