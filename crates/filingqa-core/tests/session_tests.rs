use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use filingqa_core::session::SessionCache;
use filingqa_core::Error;

#[tokio::test]
async fn factory_runs_once_per_key() {
    let cache: SessionCache<&'static str, String> = SessionCache::new();
    let counter = AtomicUsize::new(0);
    let calls = &counter;

    for _ in 0..3 {
        let v = cache
            .get_or_try_init(&"session", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>("handle".to_string())
            })
            .await
            .expect("init");
        assert_eq!(v.as_str(), "handle");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);

    cache.get_or_init(&"other", || async { "second".to_string() }).await;
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn failed_factory_is_not_cached() {
    let cache: SessionCache<u8, u32> = SessionCache::new();
    let err = cache
        .get_or_try_init(&1, || async { Err::<u32, _>(Error::connection("refused")) })
        .await
        .expect_err("first attempt fails");
    assert!(err.is_fatal());
    assert!(cache.get(&1).is_none());
    assert!(cache.is_empty());

    let v = cache.get_or_try_init(&1, || async { Ok::<_, Error>(7) }).await.expect("second attempt");
    assert_eq!(*v, 7);
    assert_eq!(cache.get(&1).map(|v| *v), Some(7));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_access_runs_factory_once() {
    let cache: Arc<SessionCache<&'static str, usize>> = Arc::new(SessionCache::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        let calls = calls.clone();
        tasks.push(tokio::spawn(async move {
            cache
                .get_or_init(&"session", || async move {
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    calls.fetch_add(1, Ordering::SeqCst) + 1
                })
                .await
        }));
    }
    for t in tasks {
        assert_eq!(*t.await.expect("join"), 1);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
