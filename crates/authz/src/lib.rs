//! # Rollbook Authorization
//!
//! Access tokens and class-scoped role computation for Rollbook services.
//!
//! This crate provides:
//! - **Token lifecycle**: opaque-token issuance, validation, revocation with a retained banned set
//! - **Validation cache**: short-TTL positive-result cache on the per-request path
//! - **Role computation**: a pure function over grants, class membership and today's timetable
//! - **Role cache**: per-user cache whose entry TTL never outlives a time-bounded role
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use rollbook_authz::TokenService;
//! use rollbook_storage::{MemoryBackend, UserId};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let service = TokenService::new(Arc::new(MemoryBackend::new()));
//!
//! let token = service.issue(UserId(3), None).await?;
//! assert!(service.check_token(UserId(3), &token).await?);
//!
//! service.revoke_one(UserId(3), &token, Some("logout")).await?;
//! assert!(!service.check_token(UserId(3), &token).await?);
//! # Ok::<(), rollbook_authz::AuthError>(())
//! # });
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod grants;
mod keys;
pub mod role_cache;
pub mod roles;
pub mod service;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use grants::GrantStore;
pub use role_cache::{DEFAULT_ROLE_CACHE_CAPACITY, DEFAULT_ROLE_TTL, RoleCache};
pub use roles::{LessonSlot, RoleAssignment, RoleGrant, RoleKind, UserKind, compute_roles};
pub use service::{RoleDirectory, RoleService};
pub use token::{
    AccessToken, BannedToken, DEFAULT_TOKEN_CACHE_CAPACITY, DEFAULT_TOKEN_CACHE_TTL, TokenService,
};
