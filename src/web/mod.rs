//! Web 服务器模块
//!
//! 通过 HTTP 提供单词翻译服务，同时作为其他节点 `RemoteBackend` 的对端。

pub mod config;
pub mod handlers;
pub mod routes;
pub mod types;

pub use config::*;
pub use routes::*;
pub use types::*;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::translation::{TranslationError, TranslationResult, TranslationService};

/// Web 服务器
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    /// 创建新的 Web 服务器，批量上限取自 `config`
    pub fn new(config: WebConfig, service: TranslationService, engines: Vec<String>) -> Self {
        let state = Arc::new(AppState {
            service: service.with_batch_limit(config.max_batch_words),
            engines,
        });
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state), &self.config)
    }

    /// 绑定配置的地址
    pub async fn bind(&self) -> TranslationResult<TcpListener> {
        TcpListener::bind(&self.config.listen).await.map_err(|e| {
            TranslationError::ConfigError(format!("无法绑定 {}: {}", self.config.listen, e))
        })
    }

    /// 在给定的监听器上运行，直到 `shutdown` 完成
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> TranslationResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Web server listening on http://{}", addr);
        }

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| TranslationError::InternalError(format!("Server error: {}", e)))
    }
}

/// 创建路由器并挂上日志、超时和 CORS 中间件
pub fn create_router(app_state: Arc<AppState>, config: &WebConfig) -> Router {
    create_routes()
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(CorsLayer::permissive())
}
