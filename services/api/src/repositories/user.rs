//! User account administration

use async_trait::async_trait;
use common::error::DatabaseResult;
use rules::Role;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::parse_column;
use crate::models::user::{UpdateUserRequest, UserResponse};

const USER_COLUMNS: &str =
    "id, email, full_name, role, department, phone, active, created_at, updated_at";

/// Current state of the account behind an access token
///
/// Tokens outlive role changes and deactivations, so every request
/// resolves its caller through this lookup.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_account(&self, id: Uuid) -> DatabaseResult<Option<UserResponse>>;
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

fn user_from_row(row: &PgRow) -> DatabaseResult<UserResponse> {
    let role: String = row.try_get("role")?;

    Ok(UserResponse {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        role: parse_column::<Role>("role", &role)?,
        department: row.try_get("department")?,
        phone: row.try_get("phone")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get all users
    pub async fn get_all(&self) -> DatabaseResult<Vec<UserResponse>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY full_name, email"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<UserResponse>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: &UpdateUserRequest,
    ) -> DatabaseResult<Option<UserResponse>> {
        info!("Updating user {} (role {})", id, payload.role);

        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET full_name = $2, role = $3, department = $4, phone = $5, active = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.full_name.trim())
        .bind(payload.role.as_str())
        .bind(&payload.department)
        .bind(&payload.phone)
        .bind(payload.active)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting user {}", id);

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AccountDirectory for UserRepository {
    async fn find_account(&self, id: Uuid) -> DatabaseResult<Option<UserResponse>> {
        self.find_by_id(id).await
    }
}
