//! 服务配置管理模块
//!
//! 配置文件加载、环境变量覆盖和常量定义

pub mod manager;

// 重新导出主要类型
pub use manager::{
    CacheBackend, CacheSettings, ConfigManager, NotifySettings, PoolSettings, ServerSettings,
    ServiceConfig, ShellSettings, StrategyKind,
};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 外部命令相关
    pub const DEFAULT_COMMAND: &str = "/usr/bin/trans";
    pub const LIST_ENGINES_FLAG: &str = "-S";
    pub const PREFERRED_ENGINE: &str = "google";
    pub const EXCLUDED_ENGINE: &str = "aspell";
    pub const MIN_ENGINE_NAME_LEN: usize = 3;

    /// 翻译时传给外部命令的参数（位于 `-e <engine>` 之后、`:<lang> <word>` 之前）
    pub const TRANSLATE_FLAGS: &[&str] = &[
        "-show-original-phonetics",
        "n",
        "-no-ansi",
        "-show-languages",
        "n",
        "-show-original-dictionary",
        "n",
        "-show-original",
        "n",
        "-show-alternatives",
        "n",
        "-show-dictionary",
        "n",
    ];

    // 远端节点
    pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(10);

    // Web 服务
    pub const DEFAULT_LISTEN: &str = "0.0.0.0:8888";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_MAX_BATCH_WORDS: usize = 200;

    // 缓存
    pub const DEFAULT_CACHE_PATH: &str = "~/.cache/wordrelay/translations.redb";

    // 通知
    pub const DEFAULT_NOTIFICATION_INTERVAL: Duration = Duration::from_secs(60);
    pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 1024;
    pub const MAX_PENDING_NOTIFICATIONS: usize = 500;
    pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "wordrelay.toml",
        ".wordrelay.toml",
        "~/.config/wordrelay/config.toml",
        "/etc/wordrelay/config.toml",
    ];
}
