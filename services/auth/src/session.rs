//! Session management using Redis

use anyhow::Result;
use async_trait::async_trait;
use common::cache::RedisPool;
use tracing::info;
use uuid::Uuid;

use crate::store::SessionStore;

fn session_key(user_id: Uuid) -> String {
    format!("session:{}", user_id)
}

fn revoked_key(token: &str) -> String {
    format!("revoked_token:{}", token)
}

/// Redis-backed session store
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_pool: RedisPool,
}

impl RedisSessionStore {
    /// Create a new session store
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }

    /// Get Redis health status
    pub async fn health_check(&self) -> Result<bool> {
        self.redis_pool.health_check().await
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create_session(&self, user_id: Uuid, refresh_token: &str, ttl: u64) -> Result<()> {
        info!("Creating session for user: {}", user_id);

        self.redis_pool
            .set(&session_key(user_id), refresh_token, Some(ttl))
            .await
    }

    async fn is_session_valid(&self, user_id: Uuid, refresh_token: &str) -> Result<bool> {
        let stored_token = self.redis_pool.get(&session_key(user_id)).await?;

        Ok(stored_token.as_deref() == Some(refresh_token))
    }

    async fn delete_session(&self, user_id: Uuid) -> Result<()> {
        info!("Deleting session for user: {}", user_id);

        self.redis_pool.delete(&session_key(user_id)).await
    }

    async fn revoke_token(&self, token: &str, ttl: u64) -> Result<bool> {
        self.redis_pool.set_nx(&revoked_key(token), "1", ttl).await
    }

    async fn is_token_revoked(&self, token: &str) -> Result<bool> {
        self.redis_pool.exists(&revoked_key(token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        let id = Uuid::nil();
        assert_eq!(
            session_key(id),
            "session:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(revoked_key("abc"), "revoked_token:abc");
    }
}
