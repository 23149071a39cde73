//! Page-to-worker messages.

mod common;

use common::{FlakyStorage, config};
use shellcache::backend::CacheStorage;
use shellcache::{Worker, WorkerMessage, WorkerReply};
use shellcache_memory::MemoryStorage;
use tokio::sync::oneshot;

/// Test 1: SKIP_WAITING sets the flag and has no reply
#[tokio::test]
async fn test_skip_waiting() {
    let worker = Worker::new(config(), MemoryStorage::new()).unwrap();

    let reply = worker.on_message(WorkerMessage::SkipWaiting).await;

    assert!(reply.is_none());
    assert!(worker.skip_waiting_requested());
}

/// Test 2: CHECK_VERSION replies with the configured version on the reply channel
#[tokio::test]
async fn test_check_version_reply_channel() {
    let worker = Worker::new(config(), MemoryStorage::new()).unwrap();
    let (tx, rx) = oneshot::channel();

    let message = WorkerMessage::from_json(r#"{"type":"CHECK_VERSION"}"#).unwrap();
    worker.on_message_with_reply(message, tx).await;

    let reply = rx.await.unwrap();
    assert_eq!(
        reply,
        WorkerReply::Version {
            version: "v8".to_owned()
        }
    );
    assert_eq!(reply.to_json().unwrap(), r#"{"type":"VERSION","version":"v8"}"#);
}

/// Test 3: a message without reply drops the reply channel
#[tokio::test]
async fn test_no_reply_drops_sender() {
    let worker = Worker::new(config(), MemoryStorage::new()).unwrap();
    let (tx, rx) = oneshot::channel();

    worker.on_message_with_reply(WorkerMessage::SkipWaiting, tx).await;

    assert!(rx.await.is_err());
}

/// Test 4: a dropped receiver is ignored
#[tokio::test]
async fn test_dropped_receiver_is_ignored() {
    let worker = Worker::new(config(), MemoryStorage::new()).unwrap();
    let (tx, rx) = oneshot::channel();
    drop(rx);

    worker.on_message_with_reply(WorkerMessage::CheckVersion, tx).await;
}

/// Test 5: CLEAR_CACHES deletes owned partitions and lists them
#[tokio::test]
async fn test_clear_caches() {
    let storage = MemoryStorage::new();
    storage.open("leapmultix-runtime-v8").await.unwrap();
    storage.open("otherapp-runtime-v1").await.unwrap();
    let worker = Worker::new(config(), storage.clone()).unwrap();

    let reply = worker.on_message(WorkerMessage::ClearCaches).await;

    assert_eq!(
        reply,
        Some(WorkerReply::CachesCleared {
            deleted: vec!["leapmultix-runtime-v8".into()]
        })
    );
    assert!(!storage.has("leapmultix-runtime-v8").await.unwrap());
    assert!(storage.has("otherapp-runtime-v1").await.unwrap());
}

/// Test 6: CLEAR_CACHES reports a storage failure
#[tokio::test]
async fn test_clear_caches_failure() {
    let storage = FlakyStorage::new();
    storage.fail_keys();
    let worker = Worker::new(config(), storage).unwrap();

    let reply = worker.on_message(WorkerMessage::ClearCaches).await;

    assert!(matches!(reply, Some(WorkerReply::Error { .. })));
}
