//! Web 模块的数据类型定义

use serde::Serialize;

use crate::translation::TranslationService;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub service: TranslationService,
    /// 外部命令后端发现的引擎，健康检查时返回
    pub engines: Vec<String>,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub engines: Vec<String>,
}
