//! Token lifecycle: issuance uniqueness, validation caching, revocation
//! and banned-set retention.

#![allow(clippy::expect_used, clippy::panic)]

use std::{sync::Arc, time::Duration};

use rollbook_authz::TokenService;
use rollbook_storage::{MemoryBackend, StorageBackend, UserId};

fn service() -> (Arc<MemoryBackend>, TokenService) {
    let backend = Arc::new(MemoryBackend::new());
    (backend.clone(), TokenService::new(backend))
}

#[tokio::test]
async fn issued_token_validates() {
    let (_backend, service) = service();
    let token = service.issue(UserId(3), None).await.expect("issue");
    assert!(service.check_token(UserId(3), &token).await.expect("check"));
}

#[tokio::test]
async fn issuance_produces_distinct_tokens() {
    let (_backend, service) = service();
    let a = service.issue(UserId(3), None).await.expect("issue a");
    let b = service.issue(UserId(3), Some("android".into())).await.expect("issue b");
    assert_ne!(a, b);
}

#[tokio::test]
async fn token_is_bound_to_its_owner() {
    let (_backend, service) = service();
    let token = service.issue(UserId(3), None).await.expect("issue");
    assert!(!service.check_token(UserId(4), &token).await.expect("check"));
}

#[tokio::test]
async fn unknown_token_is_invalid() {
    let (_backend, service) = service();
    assert!(!service.check_token(UserId(3), "never-issued").await.expect("check"));
}

/// Revocation invalidates the positive cache synchronously: the check
/// immediately after `revoke_one` must see `false`, even though a warm
/// cache entry existed moments before.
#[tokio::test]
async fn revoke_one_defeats_warm_cache() {
    let (_backend, service) = service();
    let token = service.issue(UserId(3), None).await.expect("issue");

    // Warm the positive cache.
    assert!(service.check_token(UserId(3), &token).await.expect("warm"));

    assert!(service.revoke_one(UserId(3), &token, Some("logout")).await.expect("revoke"));
    assert!(
        !service.check_token(UserId(3), &token).await.expect("check"),
        "revoked token must be invalid immediately, stale cache or not"
    );
}

/// Revoked tokens are moved to the banned set with a reason, never deleted.
#[tokio::test]
async fn revoked_token_is_retained_with_reason() {
    let (_backend, service) = service();
    let token = service.issue(UserId(3), None).await.expect("issue");

    service.revoke_one(UserId(3), &token, Some("device lost")).await.expect("revoke");
    assert_eq!(
        service.banned_reason(&token).await.expect("lookup"),
        Some("device lost".to_owned())
    );
}

#[tokio::test]
async fn revoke_reason_defaults_to_unknown() {
    let (_backend, service) = service();
    let token = service.issue(UserId(3), None).await.expect("issue");
    service.revoke_one(UserId(3), &token, None).await.expect("revoke");
    assert_eq!(service.banned_reason(&token).await.expect("lookup"), Some("Unknown".to_owned()));
}

#[tokio::test]
async fn revoke_missing_token_reports_false() {
    let (_backend, service) = service();
    assert!(!service.revoke_one(UserId(3), "never-issued", None).await.expect("revoke"));
}

#[tokio::test]
async fn revoke_all_bans_every_token_and_counts() {
    let (_backend, service) = service();
    let tokens: Vec<String> = {
        let mut out = Vec::new();
        for _ in 0..3 {
            out.push(service.issue(UserId(3), None).await.expect("issue"));
        }
        out
    };
    let other = service.issue(UserId(4), None).await.expect("issue other");

    // Warm the cache for every token, then bulk revoke.
    for token in &tokens {
        assert!(service.check_token(UserId(3), token).await.expect("warm"));
    }
    let revoked =
        service.revoke_all(UserId(3), Some("AUTO_CREDENTIALS_INVALID")).await.expect("revoke all");
    assert_eq!(revoked, 3);

    for token in &tokens {
        assert!(!service.check_token(UserId(3), token).await.expect("check"));
        assert_eq!(
            service.banned_reason(token).await.expect("lookup"),
            Some("AUTO_CREDENTIALS_INVALID".to_owned())
        );
    }
    // Another user's token is untouched.
    assert!(service.check_token(UserId(4), &other).await.expect("check other"));
}

#[tokio::test]
async fn revoke_all_with_no_tokens_is_zero_not_error() {
    let (_backend, service) = service();
    assert_eq!(service.revoke_all(UserId(99), None).await.expect("revoke all"), 0);
}

/// The positive cache may short-circuit the store within its TTL, but the
/// durable store is authoritative once the entry expires.
#[tokio::test]
async fn positive_cache_expires_back_to_the_store() {
    let backend = Arc::new(MemoryBackend::new());
    let service = TokenService::with_cache_ttl(backend.clone(), Duration::from_millis(100));

    let token = service.issue(UserId(3), None).await.expect("issue");
    assert!(service.check_token(UserId(3), &token).await.expect("warm"));

    // Delete behind the service's back; only the cache still says valid.
    let key = format!("token/{:06}/{token}", 3);
    backend.delete(key.as_bytes()).await.expect("raw delete");
    assert!(service.check_token(UserId(3), &token).await.expect("cached"), "within TTL");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!service.check_token(UserId(3), &token).await.expect("expired"), "after TTL");
}
