//! Stock repository: categories, suppliers, items and movements

use common::error::{DatabaseError, DatabaseResult};
use rules::alerts::StockLevel;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::parse_column;
use crate::models::stock::{
    Categorie, CategoriePayload, Fournisseur, FournisseurPayload, Materiel, MaterielPayload,
    MaterielQuery, Mouvement, MouvementKind, MouvementPayload, MouvementQuery,
};

const MATERIEL_COLUMNS: &str = "id, reference, designation, categorie_id, fournisseur_id, \
                                quantite, seuil_minimum, unite, emplacement, created_at, \
                                updated_at";

const MOUVEMENT_COLUMNS: &str =
    "id, item_id, kind, quantite, quantite_apres, motif, user_id, created_at";

const DEFAULT_MOUVEMENT_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct StockRepository {
    pool: PgPool,
}

fn categorie_from_row(row: &PgRow) -> DatabaseResult<Categorie> {
    Ok(Categorie {
        id: row.try_get("id")?,
        nom: row.try_get("nom")?,
        description: row.try_get("description")?,
    })
}

fn fournisseur_from_row(row: &PgRow) -> DatabaseResult<Fournisseur> {
    Ok(Fournisseur {
        id: row.try_get("id")?,
        nom: row.try_get("nom")?,
        contact: row.try_get("contact")?,
        telephone: row.try_get("telephone")?,
        email: row.try_get("email")?,
        adresse: row.try_get("adresse")?,
    })
}

fn materiel_from_row(row: &PgRow) -> DatabaseResult<Materiel> {
    Ok(Materiel {
        id: row.try_get("id")?,
        reference: row.try_get("reference")?,
        designation: row.try_get("designation")?,
        categorie_id: row.try_get("categorie_id")?,
        fournisseur_id: row.try_get("fournisseur_id")?,
        quantite: row.try_get("quantite")?,
        seuil_minimum: row.try_get("seuil_minimum")?,
        unite: row.try_get("unite")?,
        emplacement: row.try_get("emplacement")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn mouvement_from_row(row: &PgRow) -> DatabaseResult<Mouvement> {
    let kind: String = row.try_get("kind")?;

    Ok(Mouvement {
        id: row.try_get("id")?,
        item_id: row.try_get("item_id")?,
        kind: parse_column::<MouvementKind>("kind", &kind)?,
        quantite: row.try_get("quantite")?,
        quantite_apres: row.try_get("quantite_apres")?,
        motif: row.try_get("motif")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
    })
}

impl StockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_categories(&self) -> DatabaseResult<Vec<Categorie>> {
        let rows = sqlx::query("SELECT id, nom, description FROM stock_categories ORDER BY nom")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(categorie_from_row).collect()
    }

    pub async fn create_categorie(&self, payload: &CategoriePayload) -> DatabaseResult<Categorie> {
        info!("Creating stock category {}", payload.nom);

        let row = sqlx::query(
            r#"
            INSERT INTO stock_categories (nom, description)
            VALUES ($1, $2)
            RETURNING id, nom, description
            "#,
        )
        .bind(payload.nom.trim())
        .bind(&payload.description)
        .fetch_one(&self.pool)
        .await?;

        categorie_from_row(&row)
    }

    pub async fn update_categorie(
        &self,
        id: Uuid,
        payload: &CategoriePayload,
    ) -> DatabaseResult<Option<Categorie>> {
        let row = sqlx::query(
            r#"
            UPDATE stock_categories SET nom = $2, description = $3
            WHERE id = $1
            RETURNING id, nom, description
            "#,
        )
        .bind(id)
        .bind(payload.nom.trim())
        .bind(&payload.description)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(categorie_from_row).transpose()
    }

    /// Fails with a foreign-key violation while items still use the category
    pub async fn delete_categorie(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM stock_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_fournisseurs(&self) -> DatabaseResult<Vec<Fournisseur>> {
        let rows = sqlx::query(
            "SELECT id, nom, contact, telephone, email, adresse FROM fournisseurs ORDER BY nom",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(fournisseur_from_row).collect()
    }

    pub async fn create_fournisseur(
        &self,
        payload: &FournisseurPayload,
    ) -> DatabaseResult<Fournisseur> {
        info!("Creating fournisseur {}", payload.nom);

        let row = sqlx::query(
            r#"
            INSERT INTO fournisseurs (nom, contact, telephone, email, adresse)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, nom, contact, telephone, email, adresse
            "#,
        )
        .bind(payload.nom.trim())
        .bind(&payload.contact)
        .bind(&payload.telephone)
        .bind(&payload.email)
        .bind(&payload.adresse)
        .fetch_one(&self.pool)
        .await?;

        fournisseur_from_row(&row)
    }

    pub async fn update_fournisseur(
        &self,
        id: Uuid,
        payload: &FournisseurPayload,
    ) -> DatabaseResult<Option<Fournisseur>> {
        let row = sqlx::query(
            r#"
            UPDATE fournisseurs
            SET nom = $2, contact = $3, telephone = $4, email = $5, adresse = $6
            WHERE id = $1
            RETURNING id, nom, contact, telephone, email, adresse
            "#,
        )
        .bind(id)
        .bind(payload.nom.trim())
        .bind(&payload.contact)
        .bind(&payload.telephone)
        .bind(&payload.email)
        .bind(&payload.adresse)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(fournisseur_from_row).transpose()
    }

    pub async fn delete_fournisseur(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM fournisseurs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_items(&self, query: &MaterielQuery) -> DatabaseResult<Vec<Materiel>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MATERIEL_COLUMNS}
            FROM materiels
            WHERE ($1::uuid IS NULL OR categorie_id = $1)
              AND (NOT $2 OR quantite < seuil_minimum)
            ORDER BY designation
            "#
        ))
        .bind(query.categorie_id)
        .bind(query.sous_seuil)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(materiel_from_row).collect()
    }

    pub async fn find_item(&self, id: Uuid) -> DatabaseResult<Option<Materiel>> {
        let row = sqlx::query(&format!(
            "SELECT {MATERIEL_COLUMNS} FROM materiels WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(materiel_from_row).transpose()
    }

    pub async fn create_item(&self, payload: &MaterielPayload) -> DatabaseResult<Materiel> {
        info!("Creating materiel {}", payload.reference);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO materiels (reference, designation, categorie_id, fournisseur_id,
                                   quantite, seuil_minimum, unite, emplacement)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MATERIEL_COLUMNS}
            "#
        ))
        .bind(payload.reference.trim())
        .bind(payload.designation.trim())
        .bind(payload.categorie_id)
        .bind(payload.fournisseur_id)
        .bind(payload.quantite)
        .bind(payload.seuil_minimum)
        .bind(&payload.unite)
        .bind(&payload.emplacement)
        .fetch_one(&self.pool)
        .await?;

        materiel_from_row(&row)
    }

    /// Update an item's description. The quantity is left untouched.
    pub async fn update_item(
        &self,
        id: Uuid,
        payload: &MaterielPayload,
    ) -> DatabaseResult<Option<Materiel>> {
        info!("Updating materiel {}", id);

        let row = sqlx::query(&format!(
            r#"
            UPDATE materiels
            SET reference = $2, designation = $3, categorie_id = $4, fournisseur_id = $5,
                seuil_minimum = $6, unite = $7, emplacement = $8, updated_at = now()
            WHERE id = $1
            RETURNING {MATERIEL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.reference.trim())
        .bind(payload.designation.trim())
        .bind(payload.categorie_id)
        .bind(payload.fournisseur_id)
        .bind(payload.seuil_minimum)
        .bind(&payload.unite)
        .bind(&payload.emplacement)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(materiel_from_row).transpose()
    }

    pub async fn delete_item(&self, id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting materiel {}", id);

        let result = sqlx::query("DELETE FROM materiels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_mouvements(&self, query: &MouvementQuery) -> DatabaseResult<Vec<Mouvement>> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_MOUVEMENT_LIMIT)
            .clamp(1, 1000);

        let rows = sqlx::query(&format!(
            r#"
            SELECT {MOUVEMENT_COLUMNS}
            FROM mouvements_stock
            WHERE ($1::uuid IS NULL OR item_id = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(query.item_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(mouvement_from_row).collect()
    }

    /// Record a movement and apply it to the item in one transaction.
    ///
    /// Returns `None` if the item does not exist, and
    /// `DatabaseError::Conflict` if the movement would make the stock
    /// negative or overflow it; nothing is written in either case.
    pub async fn record_mouvement(
        &self,
        payload: &MouvementPayload,
        user_id: Uuid,
    ) -> DatabaseResult<Option<Mouvement>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT quantite FROM materiels WHERE id = $1 FOR UPDATE")
            .bind(payload.item_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let current: i32 = row.try_get("quantite")?;

        let next = payload
            .kind
            .apply(current, payload.quantite)
            .map_err(|e| DatabaseError::Conflict(e.to_string()))?;

        sqlx::query("UPDATE materiels SET quantite = $2, updated_at = now() WHERE id = $1")
            .bind(payload.item_id)
            .bind(next)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO mouvements_stock (item_id, kind, quantite, quantite_apres, motif, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MOUVEMENT_COLUMNS}
            "#
        ))
        .bind(payload.item_id)
        .bind(payload.kind.as_str())
        .bind(payload.quantite)
        .bind(next)
        .bind(&payload.motif)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mouvement = mouvement_from_row(&row)?;
        tx.commit().await?;

        info!(
            "Recorded {} of {} on {} (now {})",
            mouvement.kind, mouvement.quantite, mouvement.item_id, next
        );

        Ok(Some(mouvement))
    }

    /// Every item's quantity and threshold, as alert evaluator input
    pub async fn stock_levels(&self) -> DatabaseResult<Vec<StockLevel>> {
        let rows = sqlx::query(
            "SELECT id, reference, designation, quantite, seuil_minimum FROM materiels",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DatabaseResult<StockLevel> {
                Ok(StockLevel {
                    id: row.try_get("id")?,
                    reference: row.try_get("reference")?,
                    designation: row.try_get("designation")?,
                    quantite: row.try_get("quantite")?,
                    seuil_minimum: row.try_get("seuil_minimum")?,
                })
            })
            .collect()
    }
}
