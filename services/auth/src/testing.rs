//! In-memory doubles of the storage capabilities, for handler tests

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use rules::Role;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::{
    AppState,
    jwt::{JwtConfig, JwtService},
    models::{NewUser, User},
    password::hash_password,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    store::{SessionStore, UserStore},
};

pub const PASSWORD: &str = "Secret#2024";

pub fn jwt_service() -> JwtService {
    JwtService::new(JwtConfig {
        private_key: include_str!("../../../fixtures/jwt/private.pem").to_string(),
        public_key: include_str!("../../../fixtures/jwt/public.pem").to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 3600,
    })
    .expect("fixture keys are valid")
}

pub fn sample_user(email: &str, role: Role, active: bool) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: "Awa Ndiaye".to_string(),
        role,
        department: Some("DAGE".to_string()),
        phone: None,
        active,
        password_hash: String::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    /// Seed an account whose password is [`PASSWORD`]
    pub fn with_user(self, email: &str, role: Role, active: bool) -> Self {
        let mut user = sample_user(email, role, active);
        user.password_hash = hash_password(PASSWORD).expect("hashing works");
        self.users.lock().expect("lock").push(user);
        self
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut users = self.users.lock().expect("lock");
        if users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(DatabaseError::UniqueViolation("users_email_key".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            full_name: new_user.full_name.clone(),
            role: new_user.role,
            department: new_user.department.clone(),
            phone: new_user.phone.clone(),
            active: true,
            password_hash: new_user.password_hash.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.lock().expect("lock");
        Ok(users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let users = self.users.lock().expect("lock");
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<Uuid, String>>,
    revoked: Mutex<HashSet<String>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, user_id: Uuid, refresh_token: &str, _ttl: u64) -> Result<()> {
        self.sessions
            .lock()
            .expect("lock")
            .insert(user_id, refresh_token.to_string());
        Ok(())
    }

    async fn is_session_valid(&self, user_id: Uuid, refresh_token: &str) -> Result<bool> {
        let sessions = self.sessions.lock().expect("lock");
        Ok(sessions.get(&user_id).map(String::as_str) == Some(refresh_token))
    }

    async fn delete_session(&self, user_id: Uuid) -> Result<()> {
        self.sessions.lock().expect("lock").remove(&user_id);
        Ok(())
    }

    async fn revoke_token(&self, token: &str, _ttl: u64) -> Result<bool> {
        Ok(self.revoked.lock().expect("lock").insert(token.to_string()))
    }

    async fn is_token_revoked(&self, token: &str) -> Result<bool> {
        Ok(self.revoked.lock().expect("lock").contains(token))
    }
}

/// Session store whose reads all happen before any rotation lands, as
/// with two refreshes of the same token racing each other
#[derive(Default)]
pub struct StaleReadSessionStore {
    inner: InMemorySessionStore,
}

#[async_trait]
impl SessionStore for StaleReadSessionStore {
    async fn create_session(&self, user_id: Uuid, refresh_token: &str, ttl: u64) -> Result<()> {
        self.inner.create_session(user_id, refresh_token, ttl).await
    }

    async fn is_session_valid(&self, _user_id: Uuid, _refresh_token: &str) -> Result<bool> {
        Ok(true)
    }

    async fn delete_session(&self, user_id: Uuid) -> Result<()> {
        self.inner.delete_session(user_id).await
    }

    async fn revoke_token(&self, token: &str, ttl: u64) -> Result<bool> {
        self.inner.revoke_token(token, ttl).await
    }

    async fn is_token_revoked(&self, _token: &str) -> Result<bool> {
        Ok(false)
    }
}

pub fn test_state(users: InMemoryUserStore, limiter: RateLimiterConfig) -> AppState {
    AppState {
        users: Arc::new(users),
        sessions: Arc::new(InMemorySessionStore::default()),
        jwt_service: jwt_service(),
        rate_limiter: RateLimiter::new(limiter),
    }
}
