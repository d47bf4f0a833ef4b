//! Marché and bande de livraison repository

use common::error::DatabaseResult;
use rules::alerts::{BandeSchedule, BandeStatut, MarcheSchedule, MarcheStatut};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::parse_column;
use crate::models::marche::{Bande, BandePayload, Marche, MarchePayload, MarcheQuery};

const MARCHE_COLUMNS: &str = "id, reference, objet, titulaire, budget, date_debut, \
                              date_fin_prevue, statut, created_at, updated_at";

const BANDE_COLUMNS: &str = "id, marche_id, numero, designation, quantite, date_prevue, \
                             date_livraison, statut, observations, created_at, updated_at";

#[derive(Clone)]
pub struct MarcheRepository {
    pool: PgPool,
}

fn marche_from_row(row: &PgRow) -> DatabaseResult<Marche> {
    let statut: String = row.try_get("statut")?;

    Ok(Marche {
        id: row.try_get("id")?,
        reference: row.try_get("reference")?,
        objet: row.try_get("objet")?,
        titulaire: row.try_get("titulaire")?,
        budget: row.try_get("budget")?,
        date_debut: row.try_get("date_debut")?,
        date_fin_prevue: row.try_get("date_fin_prevue")?,
        statut: parse_column::<MarcheStatut>("statut", &statut)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn bande_from_row(row: &PgRow) -> DatabaseResult<Bande> {
    let statut: String = row.try_get("statut")?;

    Ok(Bande {
        id: row.try_get("id")?,
        marche_id: row.try_get("marche_id")?,
        numero: row.try_get("numero")?,
        designation: row.try_get("designation")?,
        quantite: row.try_get("quantite")?,
        date_prevue: row.try_get("date_prevue")?,
        date_livraison: row.try_get("date_livraison")?,
        statut: parse_column::<BandeStatut>("statut", &statut)?,
        observations: row.try_get("observations")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl MarcheRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &MarcheQuery) -> DatabaseResult<Vec<Marche>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MARCHE_COLUMNS}
            FROM marches
            WHERE ($1::text IS NULL OR statut = $1)
            ORDER BY date_fin_prevue, reference
            "#
        ))
        .bind(query.statut.map(MarcheStatut::as_str))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(marche_from_row).collect()
    }

    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Marche>> {
        let row = sqlx::query(&format!(
            "SELECT {MARCHE_COLUMNS} FROM marches WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(marche_from_row).transpose()
    }

    pub async fn create(&self, payload: &MarchePayload) -> DatabaseResult<Marche> {
        info!("Creating marche {}", payload.reference);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO marches (reference, objet, titulaire, budget, date_debut,
                                 date_fin_prevue, statut)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MARCHE_COLUMNS}
            "#
        ))
        .bind(payload.reference.trim())
        .bind(payload.objet.trim())
        .bind(&payload.titulaire)
        .bind(payload.budget)
        .bind(payload.date_debut)
        .bind(payload.date_fin_prevue)
        .bind(payload.statut.as_str())
        .fetch_one(&self.pool)
        .await?;

        marche_from_row(&row)
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: &MarchePayload,
    ) -> DatabaseResult<Option<Marche>> {
        info!("Updating marche {} ({})", id, payload.statut);

        let row = sqlx::query(&format!(
            r#"
            UPDATE marches
            SET reference = $2, objet = $3, titulaire = $4, budget = $5, date_debut = $6,
                date_fin_prevue = $7, statut = $8, updated_at = now()
            WHERE id = $1
            RETURNING {MARCHE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.reference.trim())
        .bind(payload.objet.trim())
        .bind(&payload.titulaire)
        .bind(payload.budget)
        .bind(payload.date_debut)
        .bind(payload.date_fin_prevue)
        .bind(payload.statut.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(marche_from_row).transpose()
    }

    /// Delete a marché. Its bandes go with it (ON DELETE CASCADE).
    pub async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting marche {}", id);

        let result = sqlx::query("DELETE FROM marches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_bandes(&self, marche_id: Uuid) -> DatabaseResult<Vec<Bande>> {
        let rows = sqlx::query(&format!(
            "SELECT {BANDE_COLUMNS} FROM bandes_livraison WHERE marche_id = $1 ORDER BY numero"
        ))
        .bind(marche_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(bande_from_row).collect()
    }

    pub async fn create_bande(
        &self,
        marche_id: Uuid,
        payload: &BandePayload,
    ) -> DatabaseResult<Bande> {
        info!("Creating bande {} for marche {}", payload.numero, marche_id);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO bandes_livraison (marche_id, numero, designation, quantite, date_prevue,
                                          date_livraison, statut, observations)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {BANDE_COLUMNS}
            "#
        ))
        .bind(marche_id)
        .bind(payload.numero)
        .bind(payload.designation.trim())
        .bind(payload.quantite)
        .bind(payload.date_prevue)
        .bind(payload.date_livraison)
        .bind(payload.statut.as_str())
        .bind(&payload.observations)
        .fetch_one(&self.pool)
        .await?;

        bande_from_row(&row)
    }

    pub async fn update_bande(
        &self,
        id: Uuid,
        payload: &BandePayload,
    ) -> DatabaseResult<Option<Bande>> {
        info!("Updating bande {} ({})", id, payload.statut);

        let row = sqlx::query(&format!(
            r#"
            UPDATE bandes_livraison
            SET numero = $2, designation = $3, quantite = $4, date_prevue = $5,
                date_livraison = $6, statut = $7, observations = $8, updated_at = now()
            WHERE id = $1
            RETURNING {BANDE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.numero)
        .bind(payload.designation.trim())
        .bind(payload.quantite)
        .bind(payload.date_prevue)
        .bind(payload.date_livraison)
        .bind(payload.statut.as_str())
        .bind(&payload.observations)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(bande_from_row).transpose()
    }

    /// Delete a bande, returning the marché it belonged to
    pub async fn delete_bande(&self, id: Uuid) -> DatabaseResult<Option<Uuid>> {
        info!("Deleting bande {}", id);

        let row = sqlx::query("DELETE FROM bandes_livraison WHERE id = $1 RETURNING marche_id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("marche_id")?)),
            None => Ok(None),
        }
    }

    /// Open marchés and unsettled bandes, as alert evaluator input
    pub async fn schedules(&self) -> DatabaseResult<(Vec<MarcheSchedule>, Vec<BandeSchedule>)> {
        let marche_rows = sqlx::query(
            r#"
            SELECT id, reference, objet, date_fin_prevue, statut
            FROM marches
            WHERE statut NOT IN ('termine', 'annule')
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let marches = marche_rows
            .iter()
            .map(|row| -> DatabaseResult<MarcheSchedule> {
                let statut: String = row.try_get("statut")?;
                Ok(MarcheSchedule {
                    id: row.try_get("id")?,
                    reference: row.try_get("reference")?,
                    objet: row.try_get("objet")?,
                    date_fin_prevue: row.try_get("date_fin_prevue")?,
                    statut: parse_column("statut", &statut)?,
                })
            })
            .collect::<DatabaseResult<Vec<_>>>()?;

        let bande_rows = sqlx::query(
            r#"
            SELECT b.id, m.reference AS marche_reference, b.numero, b.date_prevue, b.statut
            FROM bandes_livraison b
            JOIN marches m ON m.id = b.marche_id
            WHERE b.statut NOT IN ('livree', 'annulee')
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let bandes = bande_rows
            .iter()
            .map(|row| -> DatabaseResult<BandeSchedule> {
                let statut: String = row.try_get("statut")?;
                Ok(BandeSchedule {
                    id: row.try_get("id")?,
                    marche_reference: row.try_get("marche_reference")?,
                    numero: row.try_get("numero")?,
                    date_prevue: row.try_get("date_prevue")?,
                    statut: parse_column("statut", &statut)?,
                })
            })
            .collect::<DatabaseResult<Vec<_>>>()?;

        Ok((marches, bandes))
    }
}
