//! 简化的配置管理器
//!
//! 按搜索路径加载配置文件，再应用环境变量覆盖

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译池顺序策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// 按声明顺序
    #[default]
    #[serde(alias = "straight-forward", alias = "straight_forward")]
    StraightForward,
    /// 每次调用重新随机排列
    Random,
}

impl FromStr for StrategyKind {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "straightforward" | "straight-forward" | "straight_forward" | "fixed" => {
                Ok(StrategyKind::StraightForward)
            }
            "random" | "shuffle" => Ok(StrategyKind::Random),
            other => Err(TranslationError::ConfigError(format!(
                "未知的策略 '{}'，可选: straightforward, random",
                other
            ))),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::StraightForward => write!(f, "straightforward"),
            StrategyKind::Random => write!(f, "random"),
        }
    }
}

/// 缓存存储类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// 持久化的 redb 文件
    #[default]
    Redb,
    /// 进程内存（重启后丢失）
    Memory,
}

impl FromStr for CacheBackend {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redb" | "disk" | "file" => Ok(CacheBackend::Redb),
            "memory" | "mem" => Ok(CacheBackend::Memory),
            other => Err(TranslationError::ConfigError(format!(
                "未知的缓存类型 '{}'，可选: redb, memory",
                other
            ))),
        }
    }
}

/// HTTP 服务配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen: String,
    pub request_timeout_secs: u64,
    pub max_batch_words: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: constants::DEFAULT_LISTEN.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_batch_words: constants::DEFAULT_MAX_BATCH_WORDS,
        }
    }
}

/// 外部命令后端配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShellSettings {
    pub enabled: bool,
    pub command: String,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            command: constants::DEFAULT_COMMAND.to_string(),
        }
    }
}

/// 翻译池配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolSettings {
    pub strategy: StrategyKind,
    pub seed: Option<u64>,
    pub peer_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            seed: None,
            peer_timeout_secs: constants::DEFAULT_PEER_TIMEOUT.as_secs(),
        }
    }
}

/// 缓存配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub path: String,
    pub purge_on_start: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: constants::DEFAULT_CACHE_PATH.to_string(),
            purge_on_start: true,
        }
    }
}

impl CacheSettings {
    /// 展开 `~` 之后的缓存文件路径
    pub fn expanded_path(&self) -> String {
        shellexpand::tilde(&self.path).into_owned()
    }
}

/// 通知配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifySettings {
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    pub interval_secs: u64,
    pub capacity: usize,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            telegram_token: None,
            telegram_chat_id: None,
            interval_secs: constants::DEFAULT_NOTIFICATION_INTERVAL.as_secs(),
            capacity: constants::DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl NotifySettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// 同时配置了 token 和 chat id 时才启用 Telegram 通知
    pub fn telegram(&self) -> Option<(&str, i64)> {
        match (&self.telegram_token, self.telegram_chat_id) {
            (Some(token), Some(chat_id)) if !token.is_empty() => Some((token.as_str(), chat_id)),
            _ => None,
        }
    }
}

/// 服务配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
    pub server: ServerSettings,
    pub shell: ShellSettings,
    /// 远端节点的基础地址，例如 `http://peer:8888`
    pub peers: Vec<String>,
    pub pool: PoolSettings,
    pub cache: CacheSettings,
    pub notify: NotifySettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerSettings::default(),
            shell: ShellSettings::default(),
            peers: Vec::new(),
            pool: PoolSettings::default(),
            cache: CacheSettings::default(),
            notify: NotifySettings::default(),
        }
    }
}

impl ServiceConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.server.listen.trim().is_empty() {
            return Err(TranslationError::ConfigError("监听地址不能为空".to_string()));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时必须大于0".to_string()));
        }

        if self.server.max_batch_words == 0 {
            return Err(TranslationError::ConfigError("批量单词数上限不能为0".to_string()));
        }

        if !self.shell.enabled && self.peers.is_empty() {
            return Err(TranslationError::ConfigError(
                "至少需要启用外部命令或配置一个远端节点".to_string(),
            ));
        }

        if self.shell.enabled && self.shell.command.trim().is_empty() {
            return Err(TranslationError::ConfigError("外部命令不能为空".to_string()));
        }

        for peer in &self.peers {
            let parsed = url::Url::parse(peer).map_err(|e| {
                TranslationError::ConfigError(format!("远端节点地址无效 '{}': {}", peer, e))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(TranslationError::ConfigError(format!(
                    "远端节点地址必须以 http:// 或 https:// 开头: {}",
                    peer
                )));
            }
        }

        if self.cache.backend == CacheBackend::Redb && self.cache.path.trim().is_empty() {
            return Err(TranslationError::ConfigError("缓存文件路径不能为空".to_string()));
        }

        if self.notify.interval_secs == 0 {
            return Err(TranslationError::ConfigError("通知间隔必须大于0".to_string()));
        }

        if self.notify.capacity == 0 {
            return Err(TranslationError::ConfigError("通知队列容量不能为0".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖（使用类型安全环境变量系统）
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{cache, core, notify, pool, server, shell, EnvVar};

        if let Ok(level) = core::LogLevel::get() {
            self.log_level = level;
        }

        if let Ok(listen) = server::Listen::get() {
            self.server.listen = listen;
        }

        if let Ok(timeout) = server::RequestTimeout::get() {
            self.server.request_timeout_secs = timeout.as_secs();
        }

        if let Ok(enabled) = shell::Enabled::get() {
            self.shell.enabled = enabled;
        }

        if let Ok(command) = shell::Command::get() {
            self.shell.command = command;
        }

        if let Ok(peers) = pool::Peers::get() {
            if !peers.is_empty() {
                tracing::info!("环境变量覆盖远端节点: {}", peers.join(", "));
                self.peers = peers;
            }
        }

        if let Ok(strategy) = pool::Strategy::get() {
            self.pool.strategy = strategy;
        }

        if let Ok(seed) = pool::Seed::get() {
            self.pool.seed = Some(seed);
        }

        if let Ok(path) = cache::Path::get() {
            self.cache.path = path;
        }

        if let Ok(backend) = cache::Backend::get() {
            self.cache.backend = backend;
        }

        if let Ok(token) = notify::TelegramToken::get() {
            self.notify.telegram_token = Some(token);
        }

        if let Ok(chat_id) = notify::TelegramChatId::get() {
            self.notify.telegram_chat_id = Some(chat_id);
        }

        if let Ok(interval) = notify::Interval::get() {
            self.notify.interval_secs = interval.as_secs();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_secs(self.pool.peer_timeout_secs)
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: ServiceConfig,
}

impl ConfigManager {
    /// 从默认搜索路径加载配置并应用环境变量覆盖
    ///
    /// 不做校验：命令行参数还可能改写配置，调用方在合并完成后调用
    /// [`ServiceConfig::validate`]。
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();

        Ok(Self { config })
    }

    /// 从指定文件加载配置，同样不做校验
    pub fn from_path(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded = shellexpand::tilde(path);
        let mut config = Self::load_from_file(&expanded)?;
        config.apply_env_overrides();

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn into_config(self) -> ServiceConfig {
        self.config
    }

    /// 查找并加载配置文件
    fn load_config() -> TranslationResult<ServiceConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(ServiceConfig::default())
    }

    /// 从指定文件解析配置，按扩展名区分 TOML 与 JSON
    fn load_from_file(path: &str) -> TranslationResult<ServiceConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        Self::parse(path, &content)
    }

    fn parse(path: &str, content: &str) -> TranslationResult<ServiceConfig> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            Ok(toml::from_str(content)?)
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = ServiceConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
