//! Transaction conflict detection, isolation, and edge case tests.
//!
//! Tests cover: read-set validation, prefix-set (phantom) validation,
//! CAS semantics, empty transactions, abort isolation, and concurrent
//! conflict detection. These tests run against `MemoryBackend`.

#![allow(clippy::expect_used, clippy::panic)]

use bytes::Bytes;
use rollbook_storage::{MemoryBackend, StorageBackend, StorageError, Transaction as _};
use tokio::task::JoinSet;

// ============================================================================
// Conflict Detection
// ============================================================================

/// Two transactions reading and writing the same key — the second to commit
/// must receive `StorageError::Conflict`.
#[tokio::test]
async fn second_commit_on_same_key_conflicts() {
    let backend = MemoryBackend::new();
    backend.set(b"counter".to_vec(), b"0".to_vec()).await.expect("initial set");

    let mut txn_a = backend.transaction().await.expect("txn_a creation");
    let read_a = txn_a.get(b"counter").await.expect("txn_a read");
    assert_eq!(read_a, Some(Bytes::from("0")));
    txn_a.set(b"counter".to_vec(), b"1".to_vec());

    let mut txn_b = backend.transaction().await.expect("txn_b creation");
    let _ = txn_b.get(b"counter").await.expect("txn_b read");
    txn_b.set(b"counter".to_vec(), b"2".to_vec());

    txn_a.commit().await.expect("first commit should succeed");

    let result_b = txn_b.commit().await;
    assert!(
        matches!(result_b, Err(StorageError::Conflict)),
        "second transaction should get Conflict, got: {result_b:?}"
    );

    let final_value = backend.get(b"counter").await.expect("final get");
    assert_eq!(final_value, Some(Bytes::from("1")));
}

/// Many concurrent read-modify-write transactions — every commit either
/// succeeds or conflicts, and the surviving value comes from a winner.
#[tokio::test]
async fn concurrent_read_modify_write_has_winners_only() {
    const CONCURRENCY: usize = 8;

    let backend = MemoryBackend::new();
    backend.set(b"race".to_vec(), b"seed".to_vec()).await.expect("seed");

    let mut set = JoinSet::new();
    for task_id in 0..CONCURRENCY {
        let backend = backend.clone();
        set.spawn(async move {
            let mut txn = backend.transaction().await.expect("txn creation");
            let _ = txn.get(b"race").await.expect("read");
            txn.set(b"race".to_vec(), format!("task{task_id}").into_bytes());
            txn.commit().await
        });
    }

    let mut winners = 0_usize;
    while let Some(joined) = set.join_next().await {
        match joined.expect("task panicked") {
            Ok(()) => winners += 1,
            Err(StorageError::Conflict) => {},
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert!(winners >= 1, "at least one transaction must win");

    let value = backend.get(b"race").await.expect("get").expect("present");
    assert!(value.starts_with(b"task"), "final value must come from a committed task");
}

/// A key deleted by a concurrent commit invalidates a transaction that read it.
#[tokio::test]
async fn concurrent_delete_of_read_key_conflicts() {
    let backend = MemoryBackend::new();
    backend.set(b"k".to_vec(), b"v".to_vec()).await.expect("set");

    let mut txn = backend.transaction().await.expect("txn");
    let _ = txn.get(b"k").await.expect("read");
    txn.set(b"other".to_vec(), b"w".to_vec());

    backend.delete(b"k").await.expect("concurrent delete");

    assert!(matches!(txn.commit().await, Err(StorageError::Conflict)));
}

/// A phantom key appearing inside a scanned prefix invalidates the commit.
/// This is the property the class-day invariant repair relies on.
#[tokio::test]
async fn phantom_in_scanned_prefix_conflicts() {
    let backend = MemoryBackend::new();
    backend.set(b"absence/0010/2024-03-04/0007".to_vec(), b"{}".to_vec()).await.expect("seed");

    let mut txn = backend.transaction().await.expect("txn");
    let scan = txn.get_prefix(b"absence/0010/2024-03-04/").await.expect("scan");
    assert_eq!(scan.len(), 1);

    // Concurrent writer adds a second record to the same class-day.
    backend.set(b"absence/0010/2024-03-04/0008".to_vec(), b"{}".to_vec()).await.expect("insert");

    txn.delete(b"absence/0010/2024-03-04/0007".to_vec());
    txn.set(b"marker/0010/2024-03-04".to_vec(), b"dummy".to_vec());
    assert!(matches!(txn.commit().await, Err(StorageError::Conflict)));
}

// ============================================================================
// Isolation
// ============================================================================

/// Buffered writes are invisible to other readers until commit.
#[tokio::test]
async fn uncommitted_writes_are_invisible() {
    let backend = MemoryBackend::new();

    let mut txn = backend.transaction().await.expect("txn");
    txn.set(b"staged".to_vec(), b"v".to_vec());

    assert_eq!(backend.get(b"staged").await.expect("get"), None);

    txn.commit().await.expect("commit");
    assert_eq!(backend.get(b"staged").await.expect("get"), Some(Bytes::from("v")));
}

/// Dropping a transaction abandons its writes.
#[tokio::test]
async fn dropped_transaction_writes_nothing() {
    let backend = MemoryBackend::new();
    {
        let mut txn = backend.transaction().await.expect("txn");
        txn.set(b"ghost".to_vec(), b"v".to_vec());
        // dropped without commit
    }
    assert_eq!(backend.get(b"ghost").await.expect("get"), None);
}

/// An empty transaction commits cleanly and changes nothing.
#[tokio::test]
async fn empty_transaction_commits() {
    let backend = MemoryBackend::new();
    let txn = backend.transaction().await.expect("txn");
    txn.commit().await.expect("empty commit");
}

/// All writes in a transaction land atomically: either both keys are
/// visible or neither is.
#[tokio::test]
async fn commit_is_atomic_across_keys() {
    let backend = MemoryBackend::new();

    let mut txn = backend.transaction().await.expect("txn");
    txn.set(b"pair/a".to_vec(), b"1".to_vec());
    txn.set(b"pair/b".to_vec(), b"2".to_vec());
    txn.commit().await.expect("commit");

    let scan = backend.get_prefix(b"pair/").await.expect("scan");
    assert_eq!(scan.len(), 2);
}

// ============================================================================
// Compare-and-set
// ============================================================================

/// `expected: Some` only succeeds on an exact byte match.
#[tokio::test]
async fn cas_update_requires_exact_match() {
    let backend = MemoryBackend::new();
    backend.set(b"k".to_vec(), b"v1".to_vec()).await.expect("set");

    let err = backend
        .compare_and_set(b"k".to_vec(), Some(b"stale".to_vec()), b"v2".to_vec())
        .await
        .expect_err("mismatched expectation must conflict");
    assert!(matches!(err, StorageError::Conflict));

    backend
        .compare_and_set(b"k".to_vec(), Some(b"v1".to_vec()), b"v2".to_vec())
        .await
        .expect("matching expectation must succeed");
    assert_eq!(backend.get(b"k").await.expect("get"), Some(Bytes::from("v2")));
}

/// `expected: None` against a deleted key succeeds (insert-if-absent).
#[tokio::test]
async fn cas_insert_after_delete_succeeds() {
    let backend = MemoryBackend::new();
    backend.set(b"k".to_vec(), b"v".to_vec()).await.expect("set");
    backend.delete(b"k").await.expect("delete");
    backend
        .compare_and_set(b"k".to_vec(), None, b"v2".to_vec())
        .await
        .expect("insert-if-absent after delete");
}
