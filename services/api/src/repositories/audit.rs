//! Audit trail repository

use common::error::DatabaseResult;
use rules::{Action, Resource};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::parse_column;
use crate::models::audit::{AuditEntry, AuditQuery};

const DEFAULT_AUDIT_LIMIT: i64 = 200;

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        user_id: Uuid,
        action: Action,
        resource: Resource,
        resource_id: Option<Uuid>,
    ) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (user_id, action, resource, resource_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(action.as_str())
        .bind(resource.as_str())
        .bind(resource_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent entries first
    pub async fn list(&self, query: &AuditQuery) -> DatabaseResult<Vec<AuditEntry>> {
        let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT).clamp(1, 1000);

        let rows = sqlx::query(
            r#"
            SELECT id, user_id, action, resource, resource_id, created_at
            FROM audit_logs
            WHERE ($1::text IS NULL OR resource = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(query.resource.map(Resource::as_str))
        .bind(query.user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DatabaseResult<AuditEntry> {
                let action: String = row.try_get("action")?;
                let resource: String = row.try_get("resource")?;
                Ok(AuditEntry {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    action: parse_column("action", &action)?,
                    resource: parse_column("resource", &resource)?,
                    resource_id: row.try_get("resource_id")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
