//! 翻译相关处理器

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::translation::{BatchItem, TranslationError};
use crate::web::types::AppState;

/// 简短形式：纯文本译文，失败时回显原词
pub async fn translate_brief(
    State(state): State<Arc<AppState>>,
    Path((word, lang)): Path<(String, String)>,
) -> String {
    state.service.translate_word(&lang, &word).await
}

/// 完整形式：JSON 编码的翻译结果
///
/// 空输入返回空响应体，翻译失败返回 502 和纯文本错误信息。
pub async fn translate_full(
    State(state): State<Arc<AppState>>,
    Path((word, lang)): Path<(String, String)>,
) -> Response {
    match state.service.translate(&lang, &word).await {
        Ok(Some(translation)) => Json(translation).into_response(),
        Ok(None) => StatusCode::OK.into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    }
}

/// 批量翻译，单词数超限返回 413
pub async fn translate_batch(
    State(state): State<Arc<AppState>>,
    Path(lang): Path<String>,
    Json(words): Json<Vec<String>>,
) -> Result<Json<Vec<BatchItem>>, (StatusCode, String)> {
    tracing::debug!("批量翻译 {} 个单词 -> {}", words.len(), lang);
    match state.service.translate_batch(&lang, &words).await {
        Ok(items) => Ok(Json(items)),
        Err(e @ TranslationError::InvalidInput(_)) => {
            Err((StatusCode::PAYLOAD_TOO_LARGE, e.to_string()))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
