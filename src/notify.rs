//! 通知模块
//!
//! 核心只负责把人类可读的消息“发出去”：[`Notifier`] 句柄把消息放进有界队列后立即
//! 返回，从不阻塞。唯一的后台任务按固定间隔把积累的消息合并成一条，交给
//! [`NotificationSink`] 投递；投递失败只在后台任务里记录，不会影响发送方。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::translation::config::constants;

/// 通知投递错误
#[derive(Error, Debug, Clone)]
pub enum NotifyError {
    #[error("通知请求失败: {0}")]
    Request(String),

    #[error("通知接口返回 {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for NotifyError {
    fn from(error: reqwest::Error) -> Self {
        NotifyError::Request(error.to_string())
    }
}

/// 通知投递目标
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError>;
}

/// 只写日志的投递目标
#[derive(Debug, Default, Clone)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        tracing::info!("通知批次:\n{}", text);
        Ok(())
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Telegram 机器人投递目标
pub struct TelegramSink {
    client: reqwest::Client,
    endpoint: String,
    chat_id: i64,
}

impl TelegramSink {
    pub fn new(token: &str, chat_id: i64) -> Self {
        Self::with_api_url(constants::TELEGRAM_API_URL, token, chat_id)
    }

    pub fn with_api_url(api_url: &str, token: &str, chat_id: i64) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/bot{}/sendMessage", api_url.trim_end_matches('/'), token),
            chat_id,
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(&SendMessage {
            chat_id: self.chat_id,
            text,
            disable_web_page_preview: true,
        })
        .map_err(|e| NotifyError::Request(e.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);

/// 通知句柄，可随意克隆
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Option<mpsc::Sender<String>>,
}

impl Notifier {
    /// 启动后台合并任务
    ///
    /// 所有句柄都被丢弃后，任务会把剩余消息投递一次再退出。
    /// `interval` 至少为 1 毫秒。
    pub fn spawn(
        sink: Arc<dyn NotificationSink>,
        interval: Duration,
        capacity: usize,
    ) -> (Notifier, JoinHandle<()>) {
        let interval = interval.max(MIN_FLUSH_INTERVAL);
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_loop(rx, sink, interval));
        (Notifier { tx: Some(tx) }, handle)
    }

    /// 不投递任何内容的句柄
    pub fn disabled() -> Self {
        Notifier { tx: None }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(format!("[info] {}", message.as_ref()));
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(format!("[error] {}", message.as_ref()));
    }

    /// 非阻塞发送；队列已满或已关闭时丢弃消息
    pub fn emit(&self, message: String) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(e) = tx.try_send(message) {
            tracing::debug!("丢弃通知: {}", e);
        }
    }
}

async fn run_loop(
    mut rx: mpsc::Receiver<String>,
    sink: Arc<dyn NotificationSink>,
    interval: Duration,
) {
    let mut batch: Vec<String> = Vec::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // 第一次 tick 立即完成，跳过
    ticker.tick().await;

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(message) => {
                    tracing::debug!("{}", message);
                    batch.push(message);
                    if batch.len() > constants::MAX_PENDING_NOTIFICATIONS {
                        let overflow = batch.len() - constants::MAX_PENDING_NOTIFICATIONS;
                        batch.drain(..overflow);
                    }
                }
                None => {
                    flush(sink.as_ref(), &mut batch).await;
                    break;
                }
            },
            _ = ticker.tick() => flush(sink.as_ref(), &mut batch).await,
        }
    }
}

async fn flush(sink: &dyn NotificationSink, batch: &mut Vec<String>) {
    if batch.is_empty() {
        return;
    }
    let text = format!(
        "{}\n{}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        batch.join("\n")
    );
    match sink.deliver(&text).await {
        Ok(()) => {
            tracing::debug!("通知批次已发送 ({} 条)", batch.len());
            batch.clear();
        }
        // 保留批次，下一个周期重试
        Err(e) => tracing::warn!("通知发送失败: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        batches: Mutex<Vec<String>>,
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl NotificationSink for Recording {
        async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(NotifyError::Request("offline".to_string()));
            }
            self.batches.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_messages_are_batched_into_one_delivery() {
        let sink = Arc::new(Recording::default());
        let (notifier, handle) = Notifier::spawn(sink.clone(), Duration::from_secs(3600), 16);

        notifier.info("backend started");
        notifier.error("hello (to es) failed");
        drop(notifier);
        handle.await.unwrap();

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].contains("[info] backend started"));
        assert!(batches[0].contains("[error] hello (to es) failed"));
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_batch() {
        let sink = Arc::new(Recording::default());
        sink.failures_left.store(1, Ordering::SeqCst);
        let (notifier, handle) = Notifier::spawn(sink.clone(), Duration::from_millis(20), 16);

        notifier.info("first");
        tokio::time::sleep(Duration::from_millis(60)).await;
        notifier.info("second");
        drop(notifier);
        handle.await.unwrap();

        let batches = sink.batches.lock().unwrap();
        let all = batches.join("\n");
        assert!(all.contains("first"));
        assert!(all.contains("second"));
    }

    #[tokio::test]
    async fn test_emit_never_blocks_when_queue_is_full() {
        let sink = Arc::new(Recording::default());
        let (notifier, handle) = Notifier::spawn(sink.clone(), Duration::from_secs(3600), 1);
        for i in 0..100 {
            notifier.info(format!("message {}", i));
        }
        drop(notifier);
        handle.await.unwrap();
        assert!(!sink.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_interval_still_delivers() {
        let sink = Arc::new(Recording::default());
        let (notifier, handle) = Notifier::spawn(sink.clone(), Duration::ZERO, 16);

        notifier.info("zero interval");
        tokio::time::sleep(Duration::from_millis(20)).await;
        notifier.info("still running");
        drop(notifier);
        handle.await.unwrap();

        let all = sink.batches.lock().unwrap().join("\n");
        assert!(all.contains("zero interval"));
        assert!(all.contains("still running"));
    }

    #[test]
    fn test_disabled_notifier_is_noop() {
        let notifier = Notifier::disabled();
        notifier.info("nothing");
        notifier.error("happens");
    }
}
