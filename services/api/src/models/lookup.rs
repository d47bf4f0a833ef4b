//! Reference tables used by employee records

use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

/// The reference tables exposed under `/lookups/:kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Grades,
    Bureaux,
    Directions,
    Divisions,
    Etages,
}

impl LookupKind {
    /// Backing table. Only these fixed names ever reach a query string.
    pub fn table(self) -> &'static str {
        match self {
            LookupKind::Grades => "grades",
            LookupKind::Bureaux => "bureaux",
            LookupKind::Directions => "directions",
            LookupKind::Divisions => "divisions",
            LookupKind::Etages => "etages",
        }
    }
}

impl FromStr for LookupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grades" => Ok(LookupKind::Grades),
            "bureaux" => Ok(LookupKind::Bureaux),
            "directions" => Ok(LookupKind::Directions),
            "divisions" => Ok(LookupKind::Divisions),
            "etages" => Ok(LookupKind::Etages),
            other => Err(format!("Unknown lookup: {}", other)),
        }
    }
}

/// A reference table row
#[derive(Debug, Clone, Serialize)]
pub struct Lookup {
    pub id: Uuid,
    pub code: String,
    pub libelle: String,
}
