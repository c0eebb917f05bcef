//! Web 服务器配置

use std::net::SocketAddr;
use std::time::Duration;

use crate::env::{server, EnvError, EnvResult, EnvVar};
use crate::translation::config::ServerSettings;

/// Web 服务器配置
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// 监听地址，形如 `0.0.0.0:8888`
    pub listen: String,
    /// 单个请求的处理时限，超时后进行中的翻译被取消
    pub request_timeout: Duration,
    /// 批量接口一次最多接受的单词数
    pub max_batch_words: usize,
}

impl WebConfig {
    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        if self.listen.parse::<SocketAddr>().is_err() {
            return Err(EnvError {
                variable: server::Listen::NAME.to_string(),
                message: format!("'{}' is not a socket address", self.listen),
            });
        }

        if self.request_timeout.is_zero() {
            return Err(EnvError {
                variable: server::RequestTimeout::NAME.to_string(),
                message: "Request timeout cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

impl From<&ServerSettings> for WebConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            listen: settings.listen.clone(),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            max_batch_words: settings.max_batch_words,
        }
    }
}
