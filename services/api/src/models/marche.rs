//! Procurement contracts and their delivery batches

use chrono::{DateTime, NaiveDate, Utc};
use rules::alerts::{BandeStatut, MarcheStatut};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A public-procurement contract
#[derive(Debug, Clone, Serialize)]
pub struct Marche {
    pub id: Uuid,
    pub reference: String,
    pub objet: String,
    pub titulaire: Option<String>,
    /// Amount in the smallest currency unit
    pub budget: i64,
    pub date_debut: NaiveDate,
    pub date_fin_prevue: NaiveDate,
    pub statut: MarcheStatut,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_marche_statut() -> MarcheStatut {
    MarcheStatut::EnPreparation
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarchePayload {
    pub reference: String,
    pub objet: String,
    pub titulaire: Option<String>,
    pub budget: i64,
    pub date_debut: NaiveDate,
    pub date_fin_prevue: NaiveDate,
    #[serde(default = "default_marche_statut")]
    pub statut: MarcheStatut,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarcheQuery {
    pub statut: Option<MarcheStatut>,
}

/// A delivery batch of a marché
#[derive(Debug, Clone, Serialize)]
pub struct Bande {
    pub id: Uuid,
    pub marche_id: Uuid,
    pub numero: i32,
    pub designation: String,
    pub quantite: i32,
    pub date_prevue: NaiveDate,
    pub date_livraison: Option<NaiveDate>,
    pub statut: BandeStatut,
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_bande_statut() -> BandeStatut {
    BandeStatut::EnAttente
}

#[derive(Debug, Clone, Deserialize)]
pub struct BandePayload {
    pub numero: i32,
    pub designation: String,
    pub quantite: i32,
    pub date_prevue: NaiveDate,
    pub date_livraison: Option<NaiveDate>,
    #[serde(default = "default_bande_statut")]
    pub statut: BandeStatut,
    pub observations: Option<String>,
}
