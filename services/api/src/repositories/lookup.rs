//! Read access to the reference tables

use common::error::DatabaseResult;
use sqlx::{PgPool, Row};

use crate::models::lookup::{Lookup, LookupKind};

#[derive(Clone)]
pub struct LookupRepository {
    pool: PgPool,
}

impl LookupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, kind: LookupKind) -> DatabaseResult<Vec<Lookup>> {
        let rows = sqlx::query(&format!(
            "SELECT id, code, libelle FROM {} ORDER BY libelle",
            kind.table()
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DatabaseResult<Lookup> {
                Ok(Lookup {
                    id: row.try_get("id")?,
                    code: row.try_get("code")?,
                    libelle: row.try_get("libelle")?,
                })
            })
            .collect()
    }
}
