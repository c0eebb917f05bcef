// 集成测试公共模块
//
// 提供测试用的翻译器、伪造的外部翻译命令和进程内 HTTP 节点

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use wordrelay::notify::Notifier;
use wordrelay::translation::{
    Translation, TranslationError, TranslationResult, TranslationService, Translator,
};
use wordrelay::web::{create_router, AppState, WebConfig};

/// 行为可控的测试翻译器，记录调用次数
pub struct StubTranslator {
    reply: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubTranslator {
    /// 总是返回给定译文
    pub fn answering(word: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(word.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    /// 总是失败
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    /// 返回前等待一段时间
    pub fn slow(word: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(word.to_string()),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for StubTranslator {
    async fn translate(&self, lang: &str, word: &str) -> TranslationResult<Translation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.reply {
            Some(reply) => Ok(Translation::new(word, lang, reply.as_str(), "")),
            None => Err(TranslationError::CommandError("stub backend offline".to_string())),
        }
    }
}

/// 写一个可执行的 shell 脚本充当外部翻译命令
#[cfg(unix)]
pub fn fake_engine(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write fake engine");
    let mut perms = std::fs::metadata(&path).expect("stat fake engine").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod fake engine");
    path
}

/// 进程内启动的 HTTP 节点
pub struct TestPeer {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for TestPeer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 在 127.0.0.1 的随机端口上为给定翻译器启动 HTTP 服务
pub async fn spawn_peer(translator: Arc<dyn Translator>, max_batch_words: usize) -> TestPeer {
    let state = Arc::new(AppState {
        service: TranslationService::new(translator, Notifier::disabled())
            .with_batch_limit(max_batch_words),
        engines: vec!["stub".to_string()],
    });
    let config = WebConfig {
        listen: "127.0.0.1:0".to_string(),
        request_timeout: Duration::from_secs(5),
        max_batch_words,
    };
    spawn_router(create_router(state, &config)).await
}

/// 在 127.0.0.1 的随机端口上运行任意路由，用于模拟行为异常的对端
pub async fn spawn_router(app: axum::Router) -> TestPeer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test peer");
    let addr = listener.local_addr().expect("peer address");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestPeer {
        base_url: format!("http://{}", addr),
        handle,
    }
}
