//! 外部命令后端集成测试
//!
//! 用 shell 脚本模拟命令行翻译工具

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use wordrelay::translation::{
    PoolTranslator, ShellBackend, StraightForward, TranslationError, Translator,
};

mod common;

use common::{fake_engine, StubTranslator};

/// 列出 bing、google（默认）、aspell；google 总是失败，其他引擎输出 `<lang>/<word>`
fn engine_script(log: &std::path::Path) -> String {
    format!(
        r#"if [ "$1" = "-S" ]; then
  printf '  bing\n* \033[1mgoogle\033[22m\n  aspell\n'
  exit 0
fi
engine="$2"
for arg; do lang="$word"; word="$arg"; done
echo "$engine" >> "{log}"
if [ "$engine" = "google" ]; then
  echo "google is rate limited" >&2
  exit 1
fi
printf '%s/%s\n\n(spell-%s)\n' "${{lang#:}}" "$word" "$engine""#,
        log = log.display()
    )
}

#[tokio::test]
async fn test_discovery_orders_engines() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_engine(dir.path(), "trans", &engine_script(&dir.path().join("log")));

    let backend = ShellBackend::discover(script.to_string_lossy()).await.unwrap();
    assert_eq!(backend.engines(), ["google", "bing"]);
}

#[tokio::test]
async fn test_falls_through_failing_engine() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("log");
    let script = fake_engine(dir.path(), "trans", &engine_script(&log));

    let backend = ShellBackend::discover(script.to_string_lossy()).await.unwrap();
    let tr = backend.translate("es", "hello").await.unwrap();

    assert_eq!(tr.original, "hello");
    assert_eq!(tr.lang, "es");
    assert_eq!(tr.word, "es/hello");
    assert_eq!(tr.spell, "spell-bing");

    let attempts = std::fs::read_to_string(&log).unwrap();
    assert_eq!(attempts.lines().collect::<Vec<_>>(), vec!["google", "bing"]);
}

#[tokio::test]
async fn test_discovery_fails_on_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_engine(dir.path(), "trans", "echo broken >&2\nexit 3");

    let err = ShellBackend::discover(script.to_string_lossy())
        .await
        .unwrap_err();
    assert!(matches!(err, TranslationError::EngineDiscovery(_)));
}

#[tokio::test]
async fn test_discovery_fails_on_empty_list() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_engine(dir.path(), "trans", "echo aspell");

    let err = ShellBackend::discover(script.to_string_lossy())
        .await
        .unwrap_err();
    assert!(matches!(err, TranslationError::EngineDiscovery(_)));
}

#[tokio::test]
async fn test_single_line_output_counts_as_failure() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_engine(dir.path(), "trans", "printf 'hola'");

    let backend = ShellBackend::with_engines(script.to_string_lossy(), ["bing"]);
    let err = backend.translate("es", "hello").await.unwrap_err();
    assert!(matches!(err, TranslationError::AllEnginesFailed { .. }));
}

#[tokio::test]
async fn test_hung_command_is_killed_on_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_engine(dir.path(), "trans", "sleep 30\necho late");

    let backend = ShellBackend::with_engines(script.to_string_lossy(), ["bing"]);
    let started = std::time::Instant::now();
    let err = backend
        .translate_with_timeout("es", "hello", Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, TranslationError::TimeoutError(_)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_pool_falls_back_from_shell_to_next_member() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_engine(dir.path(), "trans", "exit 1");
    let shell = ShellBackend::with_engines(script.to_string_lossy(), ["bing"]);
    let fallback = StubTranslator::answering("hola");

    let members: Vec<Arc<dyn Translator>> = vec![Arc::new(shell), fallback.clone()];
    let pool = PoolTranslator::new(Box::new(StraightForward), members);
    let tr = pool.translate("es", "hello").await.unwrap();
    assert_eq!(tr.word, "hola");
    assert_eq!(fallback.calls(), 1);
}
