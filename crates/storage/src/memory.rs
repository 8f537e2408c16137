//! In-memory storage backend implementation.
//!
//! This module provides [`MemoryBackend`], an in-memory implementation of
//! [`StorageBackend`] suitable for testing, development and single-process
//! deployments.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Ordered storage**: Keys are stored in a [`BTreeMap`] for efficient prefix scans
//! - **Transaction support**: Optimistic concurrency with read-set validation
//!
//! # Conflict Detection
//!
//! Every committed write bumps a version counter on the affected keys. A
//! transaction records the version of every key it reads (including every
//! key observed by a prefix scan, plus the scanned key *set* itself) and
//! validates those observations at commit time. Any mismatch — a changed
//! value, a vanished key, or a phantom key appearing inside a scanned
//! prefix — fails the commit with
//! [`StorageError::Conflict`](crate::StorageError::Conflict).
//!
//! Prefix-set validation matters for read-then-conditionally-write repair:
//! a transaction that scans a class-day and decides "no records remain"
//! must not commit if a concurrent transaction slipped a new record into
//! that prefix.
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - No replication or distributed features

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::{
    backend::StorageBackend,
    error::{StorageError, StorageResult},
    transaction::Transaction,
    types::KeyValue,
};

#[derive(Clone)]
struct Entry {
    value: Bytes,
    version: u64,
}

#[derive(Default)]
struct Inner {
    entries: BTreeMap<Vec<u8>, Entry>,
    /// Monotonic commit counter; every committed mutation stamps its keys
    /// with a fresh value.
    commit_seq: u64,
}

impl Inner {
    fn next_version(&mut self) -> u64 {
        self.commit_seq += 1;
        self.commit_seq
    }

    fn scan_prefix(&self, prefix: &[u8]) -> impl Iterator<Item = (&Vec<u8>, &Entry)> {
        self.entries.range(prefix.to_vec()..).take_while(move |(k, _)| k.starts_with(prefix))
    }
}

/// In-memory storage backend using [`BTreeMap`].
///
/// # Cloning
///
/// `MemoryBackend` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying data store.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        Ok(self.inner.read().entries.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        let mut inner = self.inner.write();
        let version = inner.next_version();
        inner.entries.insert(key, Entry { value: Bytes::from(value), version });
        Ok(())
    }

    async fn compare_and_set(
        &self,
        key: Vec<u8>,
        expected: Option<Vec<u8>>,
        new_value: Vec<u8>,
    ) -> StorageResult<()> {
        let mut inner = self.inner.write();
        let current = inner.entries.get(&key).map(|e| e.value.clone());
        let matches = match (&expected, &current) {
            (None, None) => true,
            (Some(exp), Some(cur)) => exp.as_slice() == cur.as_ref(),
            _ => false,
        };
        if !matches {
            return Err(StorageError::Conflict);
        }
        let version = inner.next_version();
        inner.entries.insert(key, Entry { value: Bytes::from(new_value), version });
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        let mut inner = self.inner.write();
        if inner.entries.remove(key).is_some() {
            inner.next_version();
        }
        Ok(())
    }

    async fn get_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<KeyValue>> {
        let inner = self.inner.read();
        Ok(inner
            .scan_prefix(prefix)
            .map(|(k, e)| KeyValue::new(Bytes::from(k.clone()), e.value.clone()))
            .collect())
    }

    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>> {
        Ok(Box::new(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            reads: HashMap::new(),
            prefix_reads: Vec::new(),
            writes: BTreeMap::new(),
        }))
    }
}

/// A buffered write: `Some` = set, `None` = delete.
type PendingWrite = Option<Vec<u8>>;

struct MemoryTransaction {
    inner: Arc<RwLock<Inner>>,
    /// Key → version observed at first read (`None` = key was absent).
    reads: HashMap<Vec<u8>, Option<u64>>,
    /// Prefix → full set of (key, version) observed by the scan.
    prefix_reads: Vec<(Vec<u8>, BTreeMap<Vec<u8>, u64>)>,
    writes: BTreeMap<Vec<u8>, PendingWrite>,
}

impl MemoryTransaction {
    fn record_read(&mut self, key: &[u8], version: Option<u64>) {
        // Only the first observation counts; later reads see buffered writes.
        self.reads.entry(key.to_vec()).or_insert(version);
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn get(&mut self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        if let Some(pending) = self.writes.get(key) {
            return Ok(pending.as_ref().map(|v| Bytes::from(v.clone())));
        }
        let observed = {
            let inner = self.inner.read();
            inner.entries.get(key).map(|e| (e.value.clone(), e.version))
        };
        match observed {
            Some((value, version)) => {
                self.record_read(key, Some(version));
                Ok(Some(value))
            },
            None => {
                self.record_read(key, None);
                Ok(None)
            },
        }
    }

    async fn get_prefix(&mut self, prefix: &[u8]) -> StorageResult<Vec<KeyValue>> {
        let stored: BTreeMap<Vec<u8>, (Bytes, u64)> = {
            let inner = self.inner.read();
            inner
                .scan_prefix(prefix)
                .map(|(k, e)| (k.clone(), (e.value.clone(), e.version)))
                .collect()
        };
        let observed: BTreeMap<Vec<u8>, u64> =
            stored.iter().map(|(k, (_, v))| (k.clone(), *v)).collect();
        self.prefix_reads.push((prefix.to_vec(), observed));

        // Merge buffered writes over the stored state.
        let mut merged: BTreeMap<Vec<u8>, Bytes> =
            stored.into_iter().map(|(k, (value, _))| (k, value)).collect();
        for (key, pending) in self.writes.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match pending {
                Some(value) => {
                    merged.insert(key.clone(), Bytes::from(value.clone()));
                },
                None => {
                    merged.remove(key);
                },
            }
        }
        Ok(merged.into_iter().map(|(k, v)| KeyValue::new(Bytes::from(k), v)).collect())
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let MemoryTransaction { inner, reads, prefix_reads, writes } = *self;
        let mut inner = inner.write();

        // Validate point reads.
        for (key, observed) in &reads {
            let current = inner.entries.get(key).map(|e| e.version);
            if current != *observed {
                tracing::trace!(key = %String::from_utf8_lossy(key), "commit conflict on read key");
                return Err(StorageError::Conflict);
            }
        }

        // Validate prefix scans: the key set and every version must be
        // unchanged. A phantom insert into a scanned prefix is a conflict.
        for (prefix, observed) in &prefix_reads {
            let current: BTreeMap<Vec<u8>, u64> =
                inner.scan_prefix(prefix).map(|(k, e)| (k.clone(), e.version)).collect();
            if current != *observed {
                return Err(StorageError::Conflict);
            }
        }

        if writes.is_empty() {
            return Ok(());
        }
        let version = inner.next_version();
        for (key, pending) in writes {
            match pending {
                Some(value) => {
                    inner.entries.insert(key, Entry { value: Bytes::from(value), version });
                },
                None => {
                    inner.entries.remove(&key);
                },
            }
        }
        Ok(())
    }
}
