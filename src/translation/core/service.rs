//! 翻译服务
//!
//! 请求进入翻译管线前的最后一层：规范化参数，空输入直接返回，失败时把消息发到
//! 通知通道。HTTP 处理器只和这一层打交道。

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use super::{normalize, Translation, Translator};
use crate::notify::Notifier;
use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 批量翻译中的单项结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub original: String,
    pub translation: Option<Translation>,
}

/// 翻译服务
#[derive(Clone)]
pub struct TranslationService {
    translator: Arc<dyn Translator>,
    notifier: Notifier,
    batch_limit: Option<usize>,
}

impl TranslationService {
    pub fn new(translator: Arc<dyn Translator>, notifier: Notifier) -> Self {
        Self {
            translator,
            notifier,
            batch_limit: None,
        }
    }

    /// 限制单次批量翻译的单词数
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = Some(limit);
        self
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// 翻译单个单词
    ///
    /// 规范化后 `lang` 或 `word` 为空时返回 `Ok(None)`，不会触及缓存或任何后端。
    pub async fn translate(&self, lang: &str, word: &str) -> TranslationResult<Option<Translation>> {
        let lang = normalize(lang);
        let word = normalize(word);
        if lang.is_empty() || word.is_empty() {
            return Ok(None);
        }

        match self.translator.translate(&lang, &word).await {
            Ok(translation) => Ok(Some(translation)),
            Err(e) => {
                metrics::counter!(
                    "wordrelay_translation_failures_total",
                    "category" => format!("{:?}", e.category())
                )
                .increment(1);
                self.notifier.error(format!("{} (to {}) {}", word, lang, e));
                helpers::log_error(e)
            }
        }
    }

    /// 简短形式：只返回译文
    ///
    /// 失败时回显规范化后的原词，空输入返回空字符串。
    pub async fn translate_word(&self, lang: &str, word: &str) -> String {
        match self.translate(lang, word).await {
            Ok(Some(translation)) => translation.word,
            Ok(None) => String::new(),
            Err(_) => normalize(word),
        }
    }

    /// 并发翻译一组单词，结果顺序与输入一致
    ///
    /// 单词数超过上限时返回 [`TranslationError::InvalidInput`]，不翻译任何单词。
    pub async fn translate_batch(
        &self,
        lang: &str,
        words: &[String],
    ) -> TranslationResult<Vec<BatchItem>> {
        if let Some(limit) = self.batch_limit {
            if words.len() > limit {
                return Err(TranslationError::InvalidInput(format!(
                    "too many words: {} (limit {})",
                    words.len(),
                    limit
                )));
            }
        }

        let tasks = words.iter().map(|word| async move {
            BatchItem {
                original: word.clone(),
                translation: self.translate(lang, word).await.ok().flatten(),
            }
        });
        Ok(join_all(tasks).await)
    }

    pub async fn close(&self) -> TranslationResult<()> {
        self.translator.close().await
    }
}
