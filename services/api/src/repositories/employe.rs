//! Employee repository

use common::error::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::employe::{Employe, EmployePayload, EmployeQuery};

const EMPLOYE_COLUMNS: &str = "id, matricule, nom, prenom, email, telephone, fonction, \
                               grade_id, bureau_id, direction_id, division_id, etage_id, \
                               date_embauche, active, created_at, updated_at";

#[derive(Clone)]
pub struct EmployeRepository {
    pool: PgPool,
}

fn employe_from_row(row: &PgRow) -> DatabaseResult<Employe> {
    Ok(Employe {
        id: row.try_get("id")?,
        matricule: row.try_get("matricule")?,
        nom: row.try_get("nom")?,
        prenom: row.try_get("prenom")?,
        email: row.try_get("email")?,
        telephone: row.try_get("telephone")?,
        fonction: row.try_get("fonction")?,
        grade_id: row.try_get("grade_id")?,
        bureau_id: row.try_get("bureau_id")?,
        direction_id: row.try_get("direction_id")?,
        division_id: row.try_get("division_id")?,
        etage_id: row.try_get("etage_id")?,
        date_embauche: row.try_get("date_embauche")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl EmployeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List employees matching the optional filters
    pub async fn list(&self, query: &EmployeQuery) -> DatabaseResult<Vec<Employe>> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let rows = sqlx::query(&format!(
            r#"
            SELECT {EMPLOYE_COLUMNS}
            FROM employes
            WHERE ($1::text IS NULL
                   OR matricule ILIKE $1 OR nom ILIKE $1 OR prenom ILIKE $1)
              AND ($2::uuid IS NULL OR direction_id = $2)
              AND ($3::boolean IS NULL OR active = $3)
            ORDER BY nom, prenom
            "#
        ))
        .bind(search)
        .bind(query.direction_id)
        .bind(query.active)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(employe_from_row).collect()
    }

    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Employe>> {
        let row = sqlx::query(&format!(
            "SELECT {EMPLOYE_COLUMNS} FROM employes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(employe_from_row).transpose()
    }

    pub async fn create(&self, payload: &EmployePayload) -> DatabaseResult<Employe> {
        info!("Creating employe {}", payload.matricule);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO employes (matricule, nom, prenom, email, telephone, fonction,
                                  grade_id, bureau_id, direction_id, division_id, etage_id,
                                  date_embauche, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {EMPLOYE_COLUMNS}
            "#
        ))
        .bind(payload.matricule.trim())
        .bind(payload.nom.trim())
        .bind(payload.prenom.trim())
        .bind(&payload.email)
        .bind(&payload.telephone)
        .bind(&payload.fonction)
        .bind(payload.grade_id)
        .bind(payload.bureau_id)
        .bind(payload.direction_id)
        .bind(payload.division_id)
        .bind(payload.etage_id)
        .bind(payload.date_embauche)
        .bind(payload.active)
        .fetch_one(&self.pool)
        .await?;

        employe_from_row(&row)
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: &EmployePayload,
    ) -> DatabaseResult<Option<Employe>> {
        info!("Updating employe {}", id);

        let row = sqlx::query(&format!(
            r#"
            UPDATE employes
            SET matricule = $2, nom = $3, prenom = $4, email = $5, telephone = $6,
                fonction = $7, grade_id = $8, bureau_id = $9, direction_id = $10,
                division_id = $11, etage_id = $12, date_embauche = $13, active = $14,
                updated_at = now()
            WHERE id = $1
            RETURNING {EMPLOYE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.matricule.trim())
        .bind(payload.nom.trim())
        .bind(payload.prenom.trim())
        .bind(&payload.email)
        .bind(&payload.telephone)
        .bind(&payload.fonction)
        .bind(payload.grade_id)
        .bind(payload.bureau_id)
        .bind(payload.direction_id)
        .bind(payload.division_id)
        .bind(payload.etage_id)
        .bind(payload.date_embauche)
        .bind(payload.active)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(employe_from_row).transpose()
    }

    pub async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting employe {}", id);

        let result = sqlx::query("DELETE FROM employes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
