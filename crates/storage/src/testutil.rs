//! Shared test utilities for storage backend testing.
//!
//! This module provides common helpers for creating test backends and
//! generating test data. It is feature-gated behind `testutil` to prevent
//! leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! rollbook-storage = { path = "../storage", features = ["testutil"] }
//! ```

use crate::{StorageBackend, memory::MemoryBackend};

/// Create a deterministic test key from a prefix and index.
///
/// Produces keys like `"prefix/000042"` (zero-padded to 6 digits) encoded
/// as UTF-8 bytes. The zero-padding ensures lexicographic ordering matches
/// numeric ordering, which is important for prefix scan tests.
#[must_use]
pub fn make_key(prefix: &str, idx: usize) -> Vec<u8> {
    format!("{prefix}/{idx:06}").into_bytes()
}

/// Create a test value tagged with a task ID and sequence number.
///
/// Produces values like `"task3-val042"` encoded as UTF-8 bytes. Useful for
/// concurrent tests where you need to identify which task wrote which value.
#[must_use]
pub fn make_tagged_value(task: usize, seq: usize) -> Vec<u8> {
    format!("task{task}-val{seq}").into_bytes()
}

/// Create a [`MemoryBackend`] pre-populated with `count` keys under `prefix`.
pub async fn populated_backend(prefix: &str, count: usize) -> MemoryBackend {
    let backend = MemoryBackend::new();
    for idx in 0..count {
        backend
            .set(make_key(prefix, idx), make_tagged_value(0, idx))
            .await
            .expect("populating a fresh MemoryBackend cannot fail");
    }
    backend
}
