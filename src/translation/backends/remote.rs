//! 远端节点翻译后端
//!
//! 把请求转发给另一个运行同一服务的节点，调用其完整形式的接口
//! `GET <base>/translate/<word>/to/<lang>/full`，响应体是 JSON 编码的 [`Translation`]。

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use crate::translation::config::constants;
use crate::translation::core::{Translation, Translator};
use crate::translation::error::{TranslationError, TranslationResult};

/// 路径段中需要转义的字符
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// 远端节点后端
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    base: String,
    client: reqwest::Client,
}

impl RemoteBackend {
    /// 使用默认超时创建
    pub fn new(base_url: &str) -> TranslationResult<Self> {
        Self::with_timeout(base_url, constants::DEFAULT_PEER_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建 HTTP 客户端失败: {}", e)))?;
        Self::with_client(base_url, client)
    }

    /// 使用外部提供的客户端创建
    pub fn with_client(base_url: &str, client: reqwest::Client) -> TranslationResult<Self> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| TranslationError::ConfigError(format!("无效的节点地址 {}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TranslationError::ConfigError(format!(
                "节点地址必须是 http(s): {}",
                base_url
            )));
        }

        Ok(Self {
            base: parsed.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// 某个请求对应的完整 URL
    pub fn endpoint(&self, lang: &str, word: &str) -> String {
        format!(
            "{}/translate/{}/to/{}/full",
            self.base,
            utf8_percent_encode(word, PATH_SEGMENT),
            utf8_percent_encode(lang, PATH_SEGMENT)
        )
    }
}

#[async_trait]
impl Translator for RemoteBackend {
    async fn translate(&self, lang: &str, word: &str) -> TranslationResult<Translation> {
        let url = self.endpoint(lang, word);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(TranslationError::RemoteStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        let translation = Translation::decode(&body)
            .map_err(|e| e.with_context(format!("节点 {}", self.base)))?;
        if !translation.is_valid() {
            return Err(TranslationError::InvalidResult(format!(
                "节点 {} 返回了空译文: {} -> {}",
                self.base, word, lang
            )));
        }
        Ok(translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_escapes_path_segments() {
        let backend = RemoteBackend::new("http://peer:8888/").unwrap();
        assert_eq!(
            backend.endpoint("es", "hello"),
            "http://peer:8888/translate/hello/to/es/full"
        );
        assert_eq!(
            backend.endpoint("pt-br", "a/b c?"),
            "http://peer:8888/translate/a%2Fb%20c%3F/to/pt-br/full"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            RemoteBackend::new("not a url"),
            Err(TranslationError::ConfigError(_))
        ));
        assert!(matches!(
            RemoteBackend::new("ftp://peer"),
            Err(TranslationError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_network_error() {
        let backend =
            RemoteBackend::with_timeout("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = backend.translate("es", "hello").await.unwrap_err();
        assert!(matches!(
            err,
            TranslationError::NetworkError(_) | TranslationError::TimeoutError(_)
        ));
    }
}
