//! Employee records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An employee of the ministry
#[derive(Debug, Clone, Serialize)]
pub struct Employe {
    pub id: Uuid,
    pub matricule: String,
    pub nom: String,
    pub prenom: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub fonction: Option<String>,
    pub grade_id: Option<Uuid>,
    pub bureau_id: Option<Uuid>,
    pub direction_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub etage_id: Option<Uuid>,
    pub date_embauche: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Body of create and update requests
#[derive(Debug, Clone, Deserialize)]
pub struct EmployePayload {
    pub matricule: String,
    pub nom: String,
    pub prenom: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub fonction: Option<String>,
    pub grade_id: Option<Uuid>,
    pub bureau_id: Option<Uuid>,
    pub direction_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub etage_id: Option<Uuid>,
    pub date_embauche: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Filters for employee listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeQuery {
    /// Matches matricule, nom or prenom, case-insensitively
    pub search: Option<String>,
    pub direction_id: Option<Uuid>,
    pub active: Option<bool>,
}
