//! Storage capabilities the authentication flow depends on
//!
//! Handlers only see these traits. Production wiring plugs in
//! [`crate::repositories::UserRepository`] and
//! [`crate::session::RedisSessionStore`]; tests plug in in-memory doubles.

use anyhow::Result;
use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{NewUser, User};

/// Lookup and creation of user accounts
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Insert a user. A taken email yields `DatabaseError::UniqueViolation`.
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;
}

/// Refresh-token sessions and token revocation
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Record `refresh_token` as the live session of `user_id`
    async fn create_session(&self, user_id: Uuid, refresh_token: &str, ttl: u64) -> Result<()>;

    /// True when `refresh_token` is the live session of `user_id`
    async fn is_session_valid(&self, user_id: Uuid, refresh_token: &str) -> Result<bool>;

    async fn delete_session(&self, user_id: Uuid) -> Result<()>;

    /// Reject `token` for the next `ttl` seconds. Atomic: true only for
    /// the one call that revoked it.
    async fn revoke_token(&self, token: &str, ttl: u64) -> Result<bool>;

    async fn is_token_revoked(&self, token: &str) -> Result<bool>;
}
