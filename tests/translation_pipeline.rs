//! 翻译管线集成测试
//!
//! 服务 → 缓存包装器 → 翻译池 → 后端 整条链路的行为

use std::sync::Arc;
use std::time::Duration;

use wordrelay::notify::Notifier;
use wordrelay::translation::storage::{KeyValueStore, MemoryStore, RedbStore, StoreError};
use wordrelay::translation::{
    cache_key, CachedTranslator, PoolTranslator, Random, StraightForward, Translation,
    TranslationError, TranslationService, Translator,
};

mod common;

use common::StubTranslator;

fn pipeline(
    members: Vec<Arc<dyn Translator>>,
    store: Arc<dyn KeyValueStore>,
) -> TranslationService {
    let pool = PoolTranslator::new(Box::new(StraightForward), members);
    let cached = CachedTranslator::new(Arc::new(pool), store);
    TranslationService::new(Arc::new(cached), Notifier::disabled())
}

#[tokio::test]
async fn test_cache_hit_skips_backends() {
    let backend = StubTranslator::answering("hola");
    let store = Arc::new(MemoryStore::new());
    let service = pipeline(vec![backend.clone()], store.clone());

    let first = service.translate("es", "hello").await.unwrap().unwrap();
    let second = service.translate("ES", " Hello").await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.calls(), 1);
    let stored = store.get(cache_key("es", "hello").as_bytes()).unwrap();
    assert_eq!(Translation::decode(&stored).unwrap(), first);
}

#[tokio::test]
async fn test_preloaded_entry_is_served_without_backend() {
    let backend = StubTranslator::answering("unused");
    let store = Arc::new(MemoryStore::new());
    let cached = Translation::new("hello", "es", "hola", "ˈo.la");
    store.put(b"es:hello", &cached.encode().unwrap()).unwrap();

    let service = pipeline(vec![backend.clone()], store);
    let tr = service.translate("es", "hello").await.unwrap().unwrap();
    assert_eq!(tr, cached);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_invalid_cache_entry_behaves_like_miss() {
    let backend = StubTranslator::answering("hola");
    let store = Arc::new(MemoryStore::new());
    store
        .put(
            b"es:hello",
            &Translation::new("hello", "es", "", "").encode().unwrap(),
        )
        .unwrap();

    let service = pipeline(vec![backend.clone()], store.clone());
    let tr = service.translate("es", "hello").await.unwrap().unwrap();
    assert_eq!(tr.word, "hola");
    assert_eq!(backend.calls(), 1);

    // 失效条目被成功结果覆盖
    let stored = Translation::decode(&store.get(b"es:hello").unwrap()).unwrap();
    assert!(stored.is_valid());
}

#[tokio::test]
async fn test_garbage_cache_entry_behaves_like_miss() {
    let backend = StubTranslator::answering("hola");
    let store = Arc::new(MemoryStore::new());
    store.put(b"es:hello", b"\x00\x01not json").unwrap();

    let service = pipeline(vec![backend.clone()], store);
    assert_eq!(
        service.translate("es", "hello").await.unwrap().unwrap().word,
        "hola"
    );
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_failover_short_circuits_after_first_success() {
    let a = StubTranslator::failing();
    let b = StubTranslator::answering("hola");
    let c = StubTranslator::answering("buenas");
    let service = pipeline(
        vec![a.clone(), b.clone(), c.clone()],
        Arc::new(MemoryStore::new()),
    );

    let tr = service.translate("es", "hello").await.unwrap().unwrap();
    assert_eq!(tr.word, "hola");
    assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 0));
}

#[tokio::test]
async fn test_all_backends_failing_writes_nothing() {
    let a = StubTranslator::failing();
    let b = StubTranslator::failing();
    let store = Arc::new(MemoryStore::new());
    let service = pipeline(vec![a.clone(), b.clone()], store.clone());

    let err = service.translate("es", "hello").await.unwrap_err();
    assert!(matches!(err, TranslationError::NoTranslatorAvailable));
    assert!(store.is_empty());
    assert!(matches!(store.get(b"es:hello"), Err(StoreError::NotFound)));

    // 下一次请求仍然是未命中，会再次尝试所有后端
    assert!(service.translate("es", "hello").await.is_err());
    assert_eq!((a.calls(), b.calls()), (2, 2));
}

#[tokio::test]
async fn test_random_strategy_tries_every_member_before_giving_up() {
    let members: Vec<Arc<StubTranslator>> = (0..4).map(|_| StubTranslator::failing()).collect();
    let pool = PoolTranslator::new(
        Box::new(Random::seeded(99)),
        members.iter().map(|m| Arc::clone(m) as Arc<dyn Translator>).collect(),
    );

    assert!(pool.translate("fr", "cat").await.is_err());
    assert!(members.iter().all(|m| m.calls() == 1));
}

#[tokio::test]
async fn test_empty_input_never_reaches_pipeline() {
    let backend = StubTranslator::answering("hola");
    let store = Arc::new(MemoryStore::new());
    let service = pipeline(vec![backend.clone()], store.clone());

    assert_eq!(service.translate("es", "").await.unwrap(), None);
    assert_eq!(service.translate("  ", "hello").await.unwrap(), None);
    assert_eq!(backend.calls(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_concurrent_requests_leave_one_valid_entry() {
    let backend = StubTranslator::slow("hola", Duration::from_millis(20));
    let store = Arc::new(MemoryStore::new());
    let service = pipeline(vec![backend.clone()], store.clone());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.translate("es", "hello").await })
        })
        .collect();

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap().unwrap().unwrap());
    }
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(store.len(), 1);
    let stored = Translation::decode(&store.get(b"es:hello").unwrap()).unwrap();
    assert_eq!(stored, results[0]);
}

#[tokio::test]
async fn test_redb_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("translations.redb");

    {
        let backend = StubTranslator::answering("Katze");
        let store = Arc::new(RedbStore::open(&path).unwrap());
        let service = pipeline(vec![backend], store);
        service.translate("de", "cat").await.unwrap();
        service.close().await.unwrap();
    }

    let backend = StubTranslator::failing();
    let store = Arc::new(RedbStore::open(&path).unwrap());
    let service = pipeline(vec![backend.clone()], store);
    let tr = service.translate("de", "cat").await.unwrap().unwrap();
    assert_eq!(tr.word, "Katze");
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_request_deadline_cancels_slow_backend() {
    let backend = StubTranslator::slow("late", Duration::from_secs(30));
    let pool = PoolTranslator::new(Box::new(StraightForward), vec![backend]);

    let err = pool
        .translate_with_timeout("es", "hello", Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, TranslationError::TimeoutError(_)));
}
