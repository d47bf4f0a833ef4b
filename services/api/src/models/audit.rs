//! Audit trail entries

use chrono::{DateTime, Utc};
use rules::{Action, Resource};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: Action,
    pub resource: Resource,
    pub resource_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub resource: Option<Resource>,
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
}
