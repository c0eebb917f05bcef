//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;

use thiserror::Error;

use crate::translation::storage::StoreError;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 引擎列表获取失败
    #[error("无法获取翻译引擎列表: {0}")]
    EngineDiscovery(String),

    /// 外部命令执行失败
    #[error("外部命令失败: {0}")]
    CommandError(String),

    /// 后端没有给出可用结果
    #[error("没有翻译结果: {0}")]
    NoResult(String),

    /// 后端返回了不满足有效性约束的翻译
    #[error("翻译结果无效: {0}")]
    InvalidResult(String),

    /// 所有引擎都失败
    #[error("无法使用任何引擎将 {word} 翻译为 {lang}")]
    AllEnginesFailed { word: String, lang: String },

    /// 翻译池耗尽
    #[error("no suitable translator available")]
    NoTranslatorAvailable,

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 远端返回非 2xx 状态
    #[error("远端返回 {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 缓存错误
    #[error("缓存错误: {0}")]
    CacheError(String),

    /// 超时错误
    #[error("操作超时: {0}")]
    TimeoutError(String),

    /// 调用方取消
    #[error("翻译已取消")]
    Cancelled,

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl TranslationError {
    /// 检查错误是否可重试（换一个后端或稍后再试）
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::CommandError(_) => true,
            TranslationError::NoResult(_) => true,
            TranslationError::InvalidResult(_) => true,
            TranslationError::NetworkError(_) => true,
            TranslationError::RemoteStatus { status, .. } => *status >= 500,
            TranslationError::TimeoutError(_) => true,
            TranslationError::CacheError(_) => true,
            TranslationError::AllEnginesFailed { .. } => true,
            TranslationError::NoTranslatorAvailable => true,
            TranslationError::SerializationError(_) => false,
            TranslationError::ConfigError(_) => false,
            TranslationError::EngineDiscovery(_) => false,
            TranslationError::InvalidInput(_) => false,
            TranslationError::Cancelled => false,
            TranslationError::InternalError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::EngineDiscovery(_) => ErrorSeverity::Critical,
            TranslationError::InternalError(_) => ErrorSeverity::Critical,
            TranslationError::AllEnginesFailed { .. } => ErrorSeverity::Error,
            TranslationError::NoTranslatorAvailable => ErrorSeverity::Error,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::CommandError(_) => ErrorSeverity::Warning,
            TranslationError::NoResult(_) => ErrorSeverity::Warning,
            TranslationError::InvalidResult(_) => ErrorSeverity::Warning,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::RemoteStatus { .. } => ErrorSeverity::Warning,
            TranslationError::CacheError(_) => ErrorSeverity::Warning,
            TranslationError::TimeoutError(_) => ErrorSeverity::Warning,
            TranslationError::InvalidInput(_) => ErrorSeverity::Info,
            TranslationError::Cancelled => ErrorSeverity::Info,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::EngineDiscovery(_) => ErrorCategory::Configuration,
            TranslationError::CommandError(_) => ErrorCategory::Backend,
            TranslationError::NetworkError(_) => ErrorCategory::Backend,
            TranslationError::RemoteStatus { .. } => ErrorCategory::Backend,
            TranslationError::NoResult(_) => ErrorCategory::Parsing,
            TranslationError::InvalidResult(_) => ErrorCategory::Parsing,
            TranslationError::SerializationError(_) => ErrorCategory::Parsing,
            TranslationError::AllEnginesFailed { .. } => ErrorCategory::Exhausted,
            TranslationError::NoTranslatorAvailable => ErrorCategory::Exhausted,
            TranslationError::InvalidInput(_) => ErrorCategory::Input,
            TranslationError::CacheError(_) => ErrorCategory::Cache,
            TranslationError::TimeoutError(_) => ErrorCategory::Timeout,
            TranslationError::Cancelled => ErrorCategory::Timeout,
            TranslationError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 是否为“没有任何后端给出结果”的情况
    pub fn is_exhausted(&self) -> bool {
        self.category() == ErrorCategory::Exhausted
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let current_msg = self.to_string();
        let new_msg = format!("{} (上下文: {})", current_msg, context);

        match &mut self {
            TranslationError::ConfigError(ref mut msg)
            | TranslationError::EngineDiscovery(ref mut msg)
            | TranslationError::CommandError(ref mut msg)
            | TranslationError::NoResult(ref mut msg)
            | TranslationError::InvalidResult(ref mut msg)
            | TranslationError::NetworkError(ref mut msg)
            | TranslationError::InvalidInput(ref mut msg)
            | TranslationError::CacheError(ref mut msg)
            | TranslationError::TimeoutError(ref mut msg)
            | TranslationError::SerializationError(ref mut msg)
            | TranslationError::InternalError(ref mut msg) => *msg = new_msg,
            TranslationError::RemoteStatus { ref mut body, .. } => {
                *body = format!("{} (上下文: {})", body, context)
            }
            TranslationError::AllEnginesFailed { .. }
            | TranslationError::NoTranslatorAvailable
            | TranslationError::Cancelled => {}
        }

        self
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Backend,
    Parsing,
    Exhausted,
    Input,
    Cache,
    Timeout,
    Internal,
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::CommandError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TranslationError::TimeoutError(error.to_string())
        } else if error.is_decode() {
            TranslationError::SerializationError(error.to_string())
        } else {
            TranslationError::NetworkError(error.to_string())
        }
    }
}

impl From<StoreError> for TranslationError {
    fn from(error: StoreError) -> Self {
        TranslationError::CacheError(error.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for TranslationError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        TranslationError::TimeoutError(format!("异步操作超时: {}", error))
    }
}

impl From<tokio::task::JoinError> for TranslationError {
    fn from(error: tokio::task::JoinError) -> Self {
        TranslationError::InternalError(format!("后台任务失败: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 记录并返回错误
    pub fn log_error<T>(error: TranslationError) -> TranslationResult<T> {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }

        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_is_retryable_but_not_fatal() {
        let err = TranslationError::NoTranslatorAvailable;
        assert!(err.is_exhausted());
        assert!(err.is_retryable());
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert_eq!(err.to_string(), "no suitable translator available");
    }

    #[test]
    fn test_remote_status_retry_depends_on_code() {
        let server = TranslationError::RemoteStatus {
            status: 503,
            body: "busy".to_string(),
        };
        let client = TranslationError::RemoteStatus {
            status: 404,
            body: "missing".to_string(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert_eq!(client.category(), ErrorCategory::Backend);
    }

    #[test]
    fn test_with_context() {
        let err = TranslationError::CommandError("exit 1".to_string()).with_context("engine=bing");
        assert!(err.to_string().contains("engine=bing"));

        let untouched = TranslationError::Cancelled.with_context("ignored");
        assert!(matches!(untouched, TranslationError::Cancelled));
    }

    #[test]
    fn test_all_engines_failed_message_names_request() {
        let err = TranslationError::AllEnginesFailed {
            word: "hello".to_string(),
            lang: "es".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("hello"));
        assert!(msg.contains("es"));
    }
}
