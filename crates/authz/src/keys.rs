//! Key encoding for tokens, the banned set and persisted role grants.
//!
//! | Prefix | Value |
//! |--------|-------|
//! | `token/{user}/{token}` | [`AccessToken`](crate::token::AccessToken) |
//! | `token-ix/{token}` | owning [`UserId`] (global uniqueness index) |
//! | `banned/{token}` | [`BannedToken`](crate::token::BannedToken) |
//! | `grant/{user}/{kind}/{class}` | [`RoleGrant`](crate::roles::RoleGrant) |
//!
//! The live-token index exists so issuance can assert global uniqueness
//! with one insert-if-absent, and so a token string alone identifies its
//! owner during bans.

use rollbook_storage::{ClassId, UserId};

use crate::roles::RoleKind;

const ID_WIDTH: usize = 6;

pub(crate) fn token_key(user: UserId, token: &str) -> Vec<u8> {
    format!("token/{:0ID_WIDTH$}/{token}", user.0).into_bytes()
}

pub(crate) fn user_tokens_prefix(user: UserId) -> Vec<u8> {
    format!("token/{:0ID_WIDTH$}/", user.0).into_bytes()
}

pub(crate) fn token_index_key(token: &str) -> Vec<u8> {
    format!("token-ix/{token}").into_bytes()
}

pub(crate) fn banned_key(token: &str) -> Vec<u8> {
    format!("banned/{token}").into_bytes()
}

pub(crate) fn grant_key(user: UserId, kind: RoleKind, class: ClassId) -> Vec<u8> {
    format!("grant/{:0ID_WIDTH$}/{}/{:0ID_WIDTH$}", user.0, kind.storage_tag(), class.0)
        .into_bytes()
}

pub(crate) fn user_grants_prefix(user: UserId) -> Vec<u8> {
    format!("grant/{:0ID_WIDTH$}/", user.0).into_bytes()
}
