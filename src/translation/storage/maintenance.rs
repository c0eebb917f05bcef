//! 缓存维护
//!
//! 启动时扫描一遍缓存，删除空值、无法解码、不满足有效性约束或包含不可显示字符的
//! 条目，并把统计结果发到通知通道。

use std::collections::BTreeMap;
use std::fmt;

use super::store::{KeyValueStore, StoreError, StoreResult};
use crate::notify::Notifier;
use crate::translation::core::Translation;

/// 删除原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PurgeReason {
    /// 空值
    Empty,
    /// 无法解码
    Undecodable,
    /// 不满足有效性约束
    Invalid,
    /// 包含不可显示字符
    NonGraphic,
}

impl fmt::Display for PurgeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PurgeReason::Empty => "empty",
            PurgeReason::Undecodable => "undecodable",
            PurgeReason::Invalid => "invalid",
            PurgeReason::NonGraphic => "non-graphic",
        };
        f.write_str(name)
    }
}

/// 清理统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub scanned: usize,
    pub removed: usize,
    pub by_reason: BTreeMap<PurgeReason, usize>,
    pub by_lang: BTreeMap<String, usize>,
}

impl PurgeReport {
    fn record(&mut self, key: &[u8], reason: PurgeReason) {
        self.removed += 1;
        *self.by_reason.entry(reason).or_insert(0) += 1;

        let key = String::from_utf8_lossy(key);
        let lang = key.split(':').next().unwrap_or_default().to_string();
        *self.by_lang.entry(lang).or_insert(0) += 1;
    }

    /// 可读的摘要，一行总数加每种语言一行
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "清理了 {} 条无效缓存（共扫描 {} 条）",
            self.removed, self.scanned
        )];
        for (reason, count) in &self.by_reason {
            lines.push(format!("{}: {}", reason, count));
        }
        for (lang, count) in &self.by_lang {
            lines.push(format!("{}: {} removes", lang, count));
        }
        lines.join("\n")
    }
}

fn is_graphic(c: char) -> bool {
    !c.is_control() && c != char::REPLACEMENT_CHARACTER
}

/// 判断缓存值是否需要删除
pub fn classify(value: &[u8]) -> Option<PurgeReason> {
    if value.iter().all(|b| b.is_ascii_whitespace()) {
        return Some(PurgeReason::Empty);
    }
    let translation = match Translation::decode(value) {
        Ok(translation) => translation,
        Err(_) => return Some(PurgeReason::Undecodable),
    };
    if !translation.is_valid() {
        return Some(PurgeReason::Invalid);
    }
    if !translation.word.chars().all(is_graphic) || !translation.spell.chars().all(is_graphic) {
        return Some(PurgeReason::NonGraphic);
    }
    None
}

/// 扫描并删除无效缓存条目
///
/// 同步执行，异步调用方应放在阻塞线程池中运行。删除前重新读取条目，
/// 快照之后被改写为有效值或已不存在的键会保留。
pub fn purge_invalid(store: &dyn KeyValueStore, notifier: &Notifier) -> StoreResult<PurgeReport> {
    let mut report = PurgeReport::default();

    for (key, value) in store.entries()? {
        report.scanned += 1;
        if classify(&value).is_none() {
            continue;
        }

        let value = match store.get(&key) {
            Ok(current) => current,
            Err(StoreError::NotFound) => continue,
            Err(e) => return Err(e),
        };
        let Some(reason) = classify(&value) else {
            tracing::debug!("缓存条目已被改写，跳过: {}", String::from_utf8_lossy(&key));
            continue;
        };

        if store.remove(&key)? {
            tracing::debug!(
                "删除缓存条目 [{}] {} | {}",
                reason,
                String::from_utf8_lossy(&key),
                String::from_utf8_lossy(&value)
            );
            report.record(&key, reason);
        }
    }

    if report.removed > 0 {
        let summary = report.summary();
        tracing::info!("{}", summary);
        notifier.info(summary);
    }
    Ok(report)
}
