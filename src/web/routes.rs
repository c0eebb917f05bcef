//! Web 路由定义

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::web::{handlers::*, types::AppState};

/// 创建路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/translate/:word/to/:lang", get(translate_brief))
        // 其他节点的 RemoteBackend 调用这个接口
        .route("/translate/:word/to/:lang/full", get(translate_full))
        .route("/batch/to/:lang", post(translate_batch))
        .route("/health", get(health))
}
