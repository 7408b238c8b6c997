//! Integration Tests for the refreshing cache
//!
//! Exercises the public API end to end with real timers.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use refresh_cache::{RefreshError, RefreshingCache};
use tokio_test::assert_ok;

// == Helper Functions ==

fn counting_cache(interval: Duration) -> (Arc<AtomicUsize>, RefreshingCache<usize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let cache = RefreshingCache::new(interval, move || counter.fetch_add(1, Ordering::SeqCst) + 1);
    (calls, cache)
}

// == Population ==

#[tokio::test]
async fn test_fetch_after_start_returns_first_value() {
    let cache = RefreshingCache::new(Duration::from_secs(60), || "first".to_string());
    assert_eq!(cache.fetch(), None);

    assert_ok!(cache.start());
    assert_eq!(cache.fetch().as_deref(), Some("first"));
    assert_ok!(cache.stop());
}

#[tokio::test]
async fn test_start_then_stop_keeps_synchronous_value() {
    for _ in 0..5 {
        let num = chrono::Utc::now().timestamp_subsec_nanos();
        let cache = RefreshingCache::new(Duration::from_secs(1), move || num);

        assert_ok!(cache.start());
        assert_ok!(cache.stop());
        assert_eq!(cache.fetch(), Some(num));
    }
}

// == Periodicity ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refresh_count_follows_interval() {
    let (calls, cache) = counting_cache(Duration::from_millis(25));

    assert_ok!(cache.start());
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_ok!(cache.stop());

    // 1 + floor(250 / 25), allowing for timer jitter
    let count = calls.load(Ordering::SeqCst);
    assert!((8..=12).contains(&count), "unexpected call count {}", count);
}

// == Stop ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_halts_refreshes() {
    let (calls, cache) = counting_cache(Duration::from_millis(100));

    assert_ok!(cache.start());
    assert_ok!(cache.stop());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!cache.is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_halts_refreshes_mid_run() {
    let (calls, cache) = counting_cache(Duration::from_millis(10));

    assert_ok!(cache.start());
    tokio::time::sleep(Duration::from_millis(55)).await;
    assert_ok!(cache.stop());

    // At most one call that was already in flight may still finish
    tokio::time::sleep(Duration::from_millis(15)).await;
    let after_stop = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_stop);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelling_returned_token_halts_refreshes() {
    let (calls, cache) = counting_cache(Duration::from_millis(10));

    let token = assert_ok!(cache.start());
    token.cancel();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!cache.is_running());
}

#[tokio::test]
async fn test_misuse_is_reported() {
    let (calls, cache) = counting_cache(Duration::from_millis(100));

    assert_eq!(cache.stop().unwrap_err(), RefreshError::NotRunning);
    assert_ok!(cache.start());
    assert_eq!(cache.start().unwrap_err(), RefreshError::AlreadyRunning);
    assert_ok!(cache.stop());
    assert_eq!(cache.stop().unwrap_err(), RefreshError::NotRunning);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// == Visibility ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fetch_never_rolls_back() {
    let sequence = Arc::new(AtomicU64::new(0));
    let counter = sequence.clone();
    let cache = Arc::new(RefreshingCache::new(Duration::from_millis(2), move || {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }));
    assert_ok!(cache.start());

    let mut readers = Vec::new();
    for _ in 0..4 {
        let cache = cache.clone();
        readers.push(tokio::spawn(async move {
            let mut last = 0;
            for _ in 0..200 {
                let completed = cache.stats().refreshes;
                let value = cache.fetch().unwrap();
                assert!(value >= last, "value rolled back from {} to {}", last, value);
                assert!(value >= completed, "stale value {} after {} refreshes", value, completed);
                last = value;
                tokio::time::sleep(Duration::from_micros(250)).await;
            }
        }));
    }
    for reader in readers {
        reader.await.unwrap();
    }

    assert_ok!(cache.stop_and_wait().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_reads_never_see_torn_values() {
    let sequence = Arc::new(AtomicU64::new(0));
    let counter = sequence.clone();
    let cache = Arc::new(RefreshingCache::new(Duration::from_millis(1), move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        vec![n; 256]
    }));
    assert_ok!(cache.start());

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut reads = 0u64;
                while !done.load(Ordering::Relaxed) {
                    let value = cache.fetch().unwrap();
                    assert!(value.iter().all(|n| *n == value[0]), "torn value observed");
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(200)).await;
    done.store(true, Ordering::Relaxed);
    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }

    assert_ok!(cache.stop());
    assert!(cache.stats().refreshes > 1);
}

// == Restart ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restart_applies_new_interval() {
    let calls: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = calls.clone();
    let cache = RefreshingCache::new(Duration::from_millis(500), move || {
        recorder.lock().unwrap().push(Instant::now());
    });

    assert_ok!(cache.start());
    assert_ok!(cache.stop());
    assert_ok!(cache.set_interval(Duration::from_millis(20)));

    let restarted = calls.lock().unwrap().len();
    assert_ok!(cache.start());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_ok!(cache.stop_and_wait().await);

    let calls = calls.lock().unwrap();
    let after_restart = &calls[restarted..];
    assert!(after_restart.len() >= 5, "only {} calls after restart", after_restart.len());
    for pair in after_restart.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap < Duration::from_millis(100), "gap {:?} follows old interval", gap);
    }
    assert_eq!(cache.stats().starts, 2);
}
