//! Stock management models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Categorie {
    pub id: Uuid,
    pub nom: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoriePayload {
    pub nom: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Fournisseur {
    pub id: Uuid,
    pub nom: String,
    pub contact: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub adresse: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FournisseurPayload {
    pub nom: String,
    pub contact: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub adresse: Option<String>,
}

/// A stocked item (matériel)
#[derive(Debug, Clone, Serialize)]
pub struct Materiel {
    pub id: Uuid,
    pub reference: String,
    pub designation: String,
    pub categorie_id: Option<Uuid>,
    pub fournisseur_id: Option<Uuid>,
    pub quantite: i32,
    pub seuil_minimum: i32,
    pub unite: Option<String>,
    pub emplacement: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of item create and update requests.
///
/// `quantite` is only honoured on creation; afterwards the quantity
/// changes through mouvements.
#[derive(Debug, Clone, Deserialize)]
pub struct MaterielPayload {
    pub reference: String,
    pub designation: String,
    pub categorie_id: Option<Uuid>,
    pub fournisseur_id: Option<Uuid>,
    #[serde(default)]
    pub quantite: i32,
    #[serde(default)]
    pub seuil_minimum: i32,
    pub unite: Option<String>,
    pub emplacement: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaterielQuery {
    pub categorie_id: Option<Uuid>,
    /// Only items under their configured minimum
    #[serde(default)]
    pub sous_seuil: bool,
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouvementKind {
    /// Adds `quantite` to the stock
    Entree,
    /// Removes `quantite` from the stock
    Sortie,
    /// Sets the stock to `quantite` after a physical count
    Ajustement,
}

impl MouvementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MouvementKind::Entree => "entree",
            MouvementKind::Sortie => "sortie",
            MouvementKind::Ajustement => "ajustement",
        }
    }

    /// Quantity after applying a movement of `quantite` to `current`
    pub fn apply(self, current: i32, quantite: i32) -> Result<i32, MouvementError> {
        let next = match self {
            MouvementKind::Entree => current.checked_add(quantite),
            MouvementKind::Sortie => current.checked_sub(quantite),
            MouvementKind::Ajustement => Some(quantite),
        }
        .ok_or(MouvementError::Overflow { current, quantite })?;

        if next < 0 {
            return Err(MouvementError::Insufficient {
                available: current,
                requested: quantite,
            });
        }

        Ok(next)
    }
}

/// Why a movement cannot be applied to the current stock
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MouvementError {
    #[error("Stock insuffisant : {available} disponible(s), {requested} demandé(s)")]
    Insufficient { available: i32, requested: i32 },

    #[error("Quantité hors limites : {current} en stock, mouvement de {quantite}")]
    Overflow { current: i32, quantite: i32 },
}

impl fmt::Display for MouvementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MouvementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entree" => Ok(MouvementKind::Entree),
            "sortie" => Ok(MouvementKind::Sortie),
            "ajustement" => Ok(MouvementKind::Ajustement),
            other => Err(format!("Unknown mouvement kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Mouvement {
    pub id: Uuid,
    pub item_id: Uuid,
    pub kind: MouvementKind,
    pub quantite: i32,
    /// Item quantity once the movement was applied
    pub quantite_apres: i32,
    pub motif: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MouvementPayload {
    pub item_id: Uuid,
    pub kind: MouvementKind,
    pub quantite: i32,
    pub motif: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MouvementQuery {
    pub item_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_mouvement() {
        assert_eq!(MouvementKind::Entree.apply(3, 4), Ok(7));
        assert_eq!(MouvementKind::Sortie.apply(7, 7), Ok(0));
        assert_eq!(
            MouvementKind::Sortie.apply(2, 3),
            Err(MouvementError::Insufficient {
                available: 2,
                requested: 3
            })
        );
        assert_eq!(MouvementKind::Ajustement.apply(12, 5), Ok(5));
    }

    #[test]
    fn test_entree_overflow_is_not_reported_as_shortage() {
        let err = MouvementKind::Entree.apply(i32::MAX, 1).unwrap_err();
        assert_eq!(
            err,
            MouvementError::Overflow {
                current: i32::MAX,
                quantite: 1
            }
        );
        assert!(!err.to_string().contains("insuffisant"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!("sortie".parse::<MouvementKind>(), Ok(MouvementKind::Sortie));
        assert!("transfert".parse::<MouvementKind>().is_err());
        assert_eq!(
            serde_json::to_string(&MouvementKind::Ajustement).unwrap(),
            "\"ajustement\""
        );
    }
}
