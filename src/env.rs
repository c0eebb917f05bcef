//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量管理

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "WORDRELAY_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// Web服务器相关环境变量
pub mod server {
    use super::*;

    /// 监听地址
    pub struct Listen;
    impl EnvVar<String> for Listen {
        const NAME: &'static str = "WORDRELAY_LISTEN";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Address to listen on, e.g. 0.0.0.0:8888";

        fn parse(value: &str) -> EnvResult<String> {
            let addr = value.trim();
            if addr.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Address cannot be empty".to_string(),
                });
            }
            Ok(addr.to_string())
        }
    }

    /// 请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "WORDRELAY_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = None;
        const DESCRIPTION: &'static str = "Per-request deadline in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1, 600)
        }
    }
}

/// 外部命令相关环境变量
pub mod shell {
    use super::*;

    /// 外部命令启用状态
    pub struct Enabled;
    impl EnvVar<bool> for Enabled {
        const NAME: &'static str = "WORDRELAY_SHELL_ENABLED";
        const DEFAULT: Option<bool> = None;
        const DESCRIPTION: &'static str = "Enable the local command-line translation backend";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 外部命令路径
    pub struct Command;
    impl EnvVar<String> for Command {
        const NAME: &'static str = "WORDRELAY_COMMAND";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Translation command to run";

        fn parse(value: &str) -> EnvResult<String> {
            let command = value.trim();
            if command.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Command cannot be empty".to_string(),
                });
            }
            Ok(shellexpand::tilde(command).into_owned())
        }
    }
}

/// 翻译池相关环境变量
pub mod pool {
    use super::*;
    use crate::translation::config::StrategyKind;

    /// 远端节点列表
    pub struct Peers;
    impl EnvVar<Vec<String>> for Peers {
        const NAME: &'static str = "WORDRELAY_PEERS";
        const DEFAULT: Option<Vec<String>> = None;
        const DESCRIPTION: &'static str = "Peer base URLs (comma-separated)";

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            let peers: Vec<String> = value
                .split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect();

            for peer in &peers {
                if !peer.starts_with("http://") && !peer.starts_with("https://") {
                    return Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: format!("Peer URL must start with http:// or https://: {}", peer),
                    });
                }
            }
            Ok(peers)
        }
    }

    /// 顺序策略
    pub struct Strategy;
    impl EnvVar<StrategyKind> for Strategy {
        const NAME: &'static str = "WORDRELAY_STRATEGY";
        const DEFAULT: Option<StrategyKind> = None;
        const DESCRIPTION: &'static str = "Pool strategy: straightforward, random";

        fn parse(value: &str) -> EnvResult<StrategyKind> {
            value.parse().map_err(|e| EnvError {
                variable: Self::NAME.to_string(),
                message: format!("{}", e),
            })
        }
    }

    /// 随机策略种子
    pub struct Seed;
    impl EnvVar<u64> for Seed {
        const NAME: &'static str = "WORDRELAY_POOL_SEED";
        const DEFAULT: Option<u64> = None;
        const DESCRIPTION: &'static str = "Seed for the random pool strategy";

        fn parse(value: &str) -> EnvResult<u64> {
            value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be an unsigned integer".to_string(),
            })
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;
    use crate::translation::config::CacheBackend;

    /// 缓存文件路径
    pub struct Path;
    impl EnvVar<String> for Path {
        const NAME: &'static str = "WORDRELAY_CACHE_PATH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Path of the persistent translation cache file";

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path cannot be empty".to_string(),
                });
            }
            Ok(path.to_string())
        }
    }

    /// 缓存类型
    pub struct Backend;
    impl EnvVar<CacheBackend> for Backend {
        const NAME: &'static str = "WORDRELAY_CACHE_BACKEND";
        const DEFAULT: Option<CacheBackend> = None;
        const DESCRIPTION: &'static str = "Cache backend: redb, memory";

        fn parse(value: &str) -> EnvResult<CacheBackend> {
            value.parse().map_err(|e| EnvError {
                variable: Self::NAME.to_string(),
                message: format!("{}", e),
            })
        }
    }
}

/// 通知相关环境变量
pub mod notify {
    use super::*;

    /// Telegram 机器人 token
    pub struct TelegramToken;
    impl EnvVar<String> for TelegramToken {
        const NAME: &'static str = "WORDRELAY_TG_TOKEN";
        const DEFAULT: Option<String> = None; // 无默认值，不设置则不发送
        const DESCRIPTION: &'static str = "Telegram bot API token for notifications";

        fn parse(value: &str) -> EnvResult<String> {
            let token = value.trim();
            if !token.contains(':') {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Token must look like <id>:<secret>".to_string(),
                });
            }
            Ok(token.to_string())
        }
    }

    /// Telegram 聊天 ID
    pub struct TelegramChatId;
    impl EnvVar<i64> for TelegramChatId {
        const NAME: &'static str = "WORDRELAY_TG_CHAT_ID";
        const DEFAULT: Option<i64> = None;
        const DESCRIPTION: &'static str = "Telegram chat ID";

        fn parse(value: &str) -> EnvResult<i64> {
            value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid integer chat id".to_string(),
            })
        }
    }

    /// 通知合并间隔
    pub struct Interval;
    impl EnvVar<Duration> for Interval {
        const NAME: &'static str = "WORDRELAY_NOTIFICATION_INTERVAL";
        const DEFAULT: Option<Duration> = None;
        const DESCRIPTION: &'static str =
            "Merge notifications into one message during this many seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1, 86400)
        }
    }
}

fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_seconds(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<Duration> {
    let seconds: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of seconds".to_string(),
    })?;

    if seconds < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", seconds, min),
        });
    }

    if seconds > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", seconds, max),
        });
    }

    Ok(Duration::from_secs(seconds))
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let entries: &[(&str, &str)] = &[
        (core::LogLevel::NAME, core::LogLevel::DESCRIPTION),
        (server::Listen::NAME, server::Listen::DESCRIPTION),
        (server::RequestTimeout::NAME, server::RequestTimeout::DESCRIPTION),
        (shell::Enabled::NAME, shell::Enabled::DESCRIPTION),
        (shell::Command::NAME, shell::Command::DESCRIPTION),
        (pool::Peers::NAME, pool::Peers::DESCRIPTION),
        (pool::Strategy::NAME, pool::Strategy::DESCRIPTION),
        (pool::Seed::NAME, pool::Seed::DESCRIPTION),
        (cache::Path::NAME, cache::Path::DESCRIPTION),
        (cache::Backend::NAME, cache::Backend::DESCRIPTION),
        (notify::TelegramToken::NAME, notify::TelegramToken::DESCRIPTION),
        (notify::TelegramChatId::NAME, notify::TelegramChatId::DESCRIPTION),
        (notify::Interval::NAME, notify::Interval::DESCRIPTION),
    ];

    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");
    for (name, description) in entries {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    }
    docs
}
