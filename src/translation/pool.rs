//! 翻译池
//!
//! 持有一组 [`Translator`]，每次请求由 [`Strategy`] 给出尝试顺序，依次尝试，
//! 第一个成功的结果立即返回，剩余成员不再调用。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::translation::config::StrategyKind;
use crate::translation::core::{Translation, Translator};
use crate::translation::error::{TranslationError, TranslationResult};

/// 尝试顺序策略
///
/// 返回值必须是输入的一个排列：不多不少，每个成员恰好出现一次。
pub trait Strategy: Send + Sync {
    fn order(&self, members: &[Arc<dyn Translator>]) -> Vec<Arc<dyn Translator>>;

    fn name(&self) -> &'static str;
}

/// 按声明顺序尝试
#[derive(Debug, Default, Clone, Copy)]
pub struct StraightForward;

impl Strategy for StraightForward {
    fn order(&self, members: &[Arc<dyn Translator>]) -> Vec<Arc<dyn Translator>> {
        members.to_vec()
    }

    fn name(&self) -> &'static str {
        "straightforward"
    }
}

/// 每次调用随机排列，各排列等概率
///
/// 随机数生成器属于策略实例本身，排列的是副本，共享的成员列表不会被修改。
#[derive(Debug)]
pub struct Random {
    rng: Mutex<StdRng>,
}

impl Random {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// 固定种子，排列序列可复现
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for Random {
    fn order(&self, members: &[Arc<dyn Translator>]) -> Vec<Arc<dyn Translator>> {
        let mut ordered = members.to_vec();
        match self.rng.lock() {
            Ok(mut rng) => ordered.shuffle(&mut *rng),
            Err(poisoned) => ordered.shuffle(&mut *poisoned.into_inner()),
        }
        ordered
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// 根据配置构造策略
pub fn strategy_for(kind: StrategyKind, seed: Option<u64>) -> Box<dyn Strategy> {
    match (kind, seed) {
        (StrategyKind::StraightForward, _) => Box::new(StraightForward),
        (StrategyKind::Random, Some(seed)) => Box::new(Random::seeded(seed)),
        (StrategyKind::Random, None) => Box::new(Random::new()),
    }
}

/// 翻译池
pub struct PoolTranslator {
    strategy: Box<dyn Strategy>,
    members: Vec<Arc<dyn Translator>>,
}

impl PoolTranslator {
    pub fn new(strategy: Box<dyn Strategy>, members: Vec<Arc<dyn Translator>>) -> Self {
        tracing::info!(
            "翻译池: {} 个成员，策略 {}",
            members.len(),
            strategy.name()
        );
        Self { strategy, members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[async_trait]
impl Translator for PoolTranslator {
    async fn translate(&self, lang: &str, word: &str) -> TranslationResult<Translation> {
        for (attempt, member) in self.strategy.order(&self.members).iter().enumerate() {
            match member.translate(lang, word).await {
                Ok(translation) if translation.is_valid() => return Ok(translation),
                Ok(_) => tracing::warn!("池成员 #{} 返回了无效结果: {} -> {}", attempt, word, lang),
                Err(e) if e.is_retryable() => tracing::warn!("池成员 #{} 失败: {}", attempt, e),
                Err(e) => tracing::error!("池成员 #{} 出现不可恢复的错误: {}", attempt, e),
            }
        }

        metrics::counter!("wordrelay_pool_exhausted_total").increment(1);
        Err(TranslationError::NoTranslatorAvailable)
    }

    /// 关闭所有成员，返回遇到的第一个错误
    async fn close(&self) -> TranslationResult<()> {
        let mut first_error = None;
        for member in &self.members {
            if let Err(e) = member.close().await {
                tracing::warn!("关闭池成员失败: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
