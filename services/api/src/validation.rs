//! Payload validation
//!
//! Each validator returns the first problem found as a message suitable
//! for a 400 response.

use common::validation::is_valid_email;

use crate::models::{
    employe::EmployePayload,
    marche::{BandePayload, MarchePayload},
    stock::{CategoriePayload, FournisseurPayload, MaterielPayload, MouvementKind, MouvementPayload},
    user::UpdateUserRequest,
};

fn required(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", field));
    }
    if trimmed.chars().count() > max_len {
        return Err(format!("{} must be at most {} characters long", field, max_len));
    }
    Ok(())
}

fn optional_email(field: &str, value: Option<&str>) -> Result<(), String> {
    match value.map(str::trim) {
        Some(email) if !email.is_empty() => {
            if is_valid_email(email) {
                Ok(())
            } else {
                Err(format!("{} is not a valid email address", field))
            }
        }
        _ => Ok(()),
    }
}

pub fn validate_user_update(payload: &UpdateUserRequest) -> Result<(), String> {
    required("full_name", &payload.full_name, 120)
}

pub fn validate_employe(payload: &EmployePayload) -> Result<(), String> {
    required("matricule", &payload.matricule, 32)?;
    required("nom", &payload.nom, 100)?;
    required("prenom", &payload.prenom, 100)?;
    optional_email("email", payload.email.as_deref())
}

pub fn validate_marche(payload: &MarchePayload) -> Result<(), String> {
    required("reference", &payload.reference, 64)?;
    required("objet", &payload.objet, 500)?;

    if payload.budget < 0 {
        return Err("budget must not be negative".to_string());
    }

    if payload.date_fin_prevue < payload.date_debut {
        return Err("date_fin_prevue must not be before date_debut".to_string());
    }

    Ok(())
}

pub fn validate_bande(payload: &BandePayload) -> Result<(), String> {
    if payload.numero < 1 {
        return Err("numero must be at least 1".to_string());
    }
    required("designation", &payload.designation, 255)?;
    if payload.quantite < 0 {
        return Err("quantite must not be negative".to_string());
    }
    Ok(())
}

pub fn validate_categorie(payload: &CategoriePayload) -> Result<(), String> {
    required("nom", &payload.nom, 100)
}

pub fn validate_fournisseur(payload: &FournisseurPayload) -> Result<(), String> {
    required("nom", &payload.nom, 200)?;
    optional_email("email", payload.email.as_deref())
}

pub fn validate_materiel(payload: &MaterielPayload) -> Result<(), String> {
    required("reference", &payload.reference, 64)?;
    required("designation", &payload.designation, 255)?;
    if payload.quantite < 0 {
        return Err("quantite must not be negative".to_string());
    }
    if payload.seuil_minimum < 0 {
        return Err("seuil_minimum must not be negative".to_string());
    }
    Ok(())
}

pub fn validate_mouvement(payload: &MouvementPayload) -> Result<(), String> {
    match payload.kind {
        MouvementKind::Entree | MouvementKind::Sortie if payload.quantite <= 0 => {
            Err("quantite must be positive".to_string())
        }
        MouvementKind::Ajustement if payload.quantite < 0 => {
            Err("quantite must not be negative".to_string())
        }
        _ => Ok(()),
    }
}
