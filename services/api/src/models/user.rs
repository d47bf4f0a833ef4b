//! User account models exposed to administrators

use chrono::{DateTime, Utc};
use rules::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for user operations
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for updating a user's profile, role or status
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: String,
    pub role: Role,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
}
