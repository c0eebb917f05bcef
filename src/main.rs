//! wordrelay 服务主程序入口

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{prelude::*, reload, EnvFilter};

use wordrelay::notify::{LogSink, NotificationSink, Notifier, TelegramSink};
use wordrelay::translation::config::{CacheBackend, ConfigManager, ServiceConfig, StrategyKind};
use wordrelay::translation::storage::{purge_invalid, KeyValueStore, MemoryStore, RedbStore};
use wordrelay::translation::{
    strategy_for, CachedTranslator, PoolTranslator, RemoteBackend, ShellBackend,
    TranslationService, Translator,
};
use wordrelay::web::{WebConfig, WebServer};

#[derive(Parser, Debug)]
#[command(
    name = "wordrelay",
    version,
    about = "Word translation relay with engine failover, peers and a persistent cache"
)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, env = "WORDRELAY_CONFIG")]
    config: Option<String>,

    /// Address to listen on
    #[arg(short, long)]
    listen: Option<String>,

    /// External translation command
    #[arg(long)]
    command: Option<String>,

    /// Do not use the external translation command
    #[arg(long)]
    no_shell: bool,

    /// Peer base URL, may be repeated
    #[arg(short, long = "peer")]
    peers: Vec<String>,

    /// Pool strategy: straightforward or random
    #[arg(short, long)]
    strategy: Option<StrategyKind>,

    /// Cache database file
    #[arg(long)]
    cache_path: Option<String>,

    /// Keep the cache in memory only
    #[arg(long)]
    memory_cache: bool,

    /// Log level, overridden by RUST_LOG
    #[arg(long)]
    log_level: Option<String>,

    /// Print the supported environment variables and exit
    #[arg(long)]
    print_env: bool,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "PATH")]
    generate_config: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(listen) = &self.listen {
            config.server.listen = listen.clone();
        }
        if let Some(command) = &self.command {
            config.shell.command = command.clone();
        }
        if self.no_shell {
            config.shell.enabled = false;
        }
        if !self.peers.is_empty() {
            config.peers = self.peers.clone();
        }
        if let Some(strategy) = self.strategy {
            config.pool.strategy = strategy;
        }
        if let Some(path) = &self.cache_path {
            config.cache.path = path.clone();
        }
        if self.memory_cache {
            config.cache.backend = CacheBackend::Memory;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.print_env {
        println!("{}", wordrelay::env::generate_env_docs());
        return Ok(());
    }
    if let Some(path) = &cli.generate_config {
        ConfigManager::generate_example_config(path)?;
        println!("Example configuration written to {}", path);
        return Ok(());
    }

    // 先按 RUST_LOG 或 --log-level 安装日志，加载配置时的日志才不会丢失
    let env_filter = EnvFilter::try_from_default_env().ok();
    let filter_from_env = env_filter.is_some();
    let (filter, filter_handle) = reload::Layer::new(env_filter.unwrap_or_else(|| {
        EnvFilter::new(cli.log_level.as_deref().unwrap_or("info"))
    }));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let manager = match &cli.config {
        Some(path) => ConfigManager::from_path(path)?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.into_config();
    cli.apply(&mut config);
    config.validate()?;

    if !filter_from_env {
        if let Err(e) = filter_handle.reload(EnvFilter::new(&config.log_level)) {
            tracing::warn!("无法应用日志级别 {}: {}", config.log_level, e);
        }
    }

    let sink: Arc<dyn NotificationSink> = match config.notify.telegram() {
        Some((token, chat_id)) => Arc::new(TelegramSink::new(token, chat_id)),
        None => Arc::new(LogSink),
    };
    let (notifier, notifier_task) =
        Notifier::spawn(sink, config.notify.interval(), config.notify.capacity);

    let (members, engines) = build_members(&config, &notifier).await;
    if members.is_empty() {
        tracing::warn!("没有可用的翻译后端，所有请求都会失败");
    }
    let pool = PoolTranslator::new(strategy_for(config.pool.strategy, config.pool.seed), members);

    let store: Arc<dyn KeyValueStore> = match config.cache.backend {
        CacheBackend::Redb => Arc::new(RedbStore::open(config.cache.expanded_path())?),
        CacheBackend::Memory => Arc::new(MemoryStore::new()),
    };

    // 开始服务前完成清理
    if config.cache.purge_on_start {
        let store = Arc::clone(&store);
        let purge_notifier = notifier.clone();
        match tokio::task::spawn_blocking(move || purge_invalid(store.as_ref(), &purge_notifier))
            .await
        {
            Ok(Ok(report)) => tracing::debug!("缓存扫描完成: {} 条", report.scanned),
            Ok(Err(e)) => tracing::error!("清理缓存失败: {}", e),
            Err(e) => tracing::error!("缓存清理任务异常退出: {}", e),
        }
    }

    let cached = CachedTranslator::new(Arc::new(pool), store);
    let service = TranslationService::new(Arc::new(cached), notifier.clone());
    notifier.info(format!("wordrelay 启动，监听 {}", config.server.listen));

    let web_config = WebConfig::from(&config.server);
    web_config.validate()?;
    let server = WebServer::new(web_config, service.clone(), engines);
    let listener = server.bind().await?;
    server.serve(listener, shutdown_signal()).await?;

    if let Err(e) = service.close().await {
        tracing::error!("关闭翻译管线失败: {}", e);
    }

    // 所有句柄释放后通知任务会发出最后一批消息
    drop(service);
    drop(notifier);
    if let Err(e) = notifier_task.await {
        tracing::warn!("通知任务异常退出: {}", e);
    }

    tracing::info!("wordrelay 已退出");
    Ok(())
}

/// 按配置构造池成员：外部命令在前，远端节点按声明顺序在后
async fn build_members(
    config: &ServiceConfig,
    notifier: &Notifier,
) -> (Vec<Arc<dyn Translator>>, Vec<String>) {
    let mut members: Vec<Arc<dyn Translator>> = Vec::new();
    let mut engines = Vec::new();

    if config.shell.enabled {
        match ShellBackend::discover(&config.shell.command).await {
            Ok(shell) => {
                engines = shell.engines().to_vec();
                notifier.info(format!("translation engines: {}", engines.join(", ")));
                members.push(Arc::new(shell));
            }
            Err(e) => {
                tracing::warn!("外部命令后端不可用: {}", e);
                notifier.error(format!("shell backend unavailable: {}", e));
            }
        }
    }

    for peer in &config.peers {
        match RemoteBackend::with_timeout(peer, config.peer_timeout()) {
            Ok(remote) => members.push(Arc::new(remote)),
            Err(e) => tracing::warn!("忽略节点 {}: {}", peer, e),
        }
    }

    (members, engines)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("无法监听 Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在关闭");
}
