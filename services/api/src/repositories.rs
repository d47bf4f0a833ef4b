//! Repositories for database operations
//!
//! Every repository wraps the shared `PgPool`, maps rows by hand and
//! returns `DatabaseResult` so constraint violations surface as 409s.

use common::error::DatabaseError;
use std::str::FromStr;

pub mod audit;
pub mod employe;
pub mod lookup;
pub mod marche;
pub mod stock;
pub mod user;

pub use audit::AuditRepository;
pub use employe::EmployeRepository;
pub use lookup::LookupRepository;
pub use marche::MarcheRepository;
pub use stock::StockRepository;
pub use user::{AccountDirectory, UserRepository};

/// Parse a text column into its enum, reporting corrupt values
fn parse_column<T>(column: &str, value: &str) -> Result<T, DatabaseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| DatabaseError::Decode(format!("{}: {}", column, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules::alerts::MarcheStatut;

    #[test]
    fn test_parse_column_reports_the_column() {
        let ok: MarcheStatut = parse_column("statut", "en_cours").unwrap();
        assert_eq!(ok, MarcheStatut::EnCours);

        let err = parse_column::<MarcheStatut>("statut", "perdu").unwrap_err();
        assert!(matches!(err, DatabaseError::Decode(msg) if msg.starts_with("statut")));
    }
}
