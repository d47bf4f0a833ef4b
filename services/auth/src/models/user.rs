//! User model and related functionality

use chrono::{DateTime, Utc};
use rules::{Role, Subject};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subject for User {
    fn role(&self) -> Role {
        self.role
    }
}

/// New user creation payload. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
}
