//! Database-backed tests for the repositories, the alert service and the
//! handlers that reach PostgreSQL
//!
//! Each test loads `fixtures/sql/schema.sql` into its own schema and drops
//! it afterwards. They need a live server at `DATABASE_URL` and are ignored
//! by default: `cargo test -p api -- --ignored`.

use anyhow::Result;
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{
    database::DatabaseConfig,
    error::DatabaseError,
    token::TokenType,
};
use rules::{
    Action, AlertKind, AlertThresholds, Resource, Role,
    alerts::{BandeStatut, MarcheStatut},
};
use serde_json::json;
use sqlx::{Executor, PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::{
    alerts::AlertService,
    models::{
        audit::AuditQuery,
        marche::{BandePayload, MarchePayload},
        stock::{MaterielPayload, MouvementKind, MouvementPayload, MouvementQuery},
    },
    repositories::{AuditRepository, MarcheRepository, StockRepository},
    routes::create_router,
    state::AppState,
    testing::{send, sign, verifier},
};

const SCHEMA: &str = include_str!("../../../fixtures/sql/schema.sql");

struct TestDb {
    pool: PgPool,
    admin: PgPool,
    schema: String,
}

impl TestDb {
    async fn new() -> Result<Self> {
        let url = DatabaseConfig::from_env()?.database_url;
        let schema = format!("api_test_{}", Uuid::new_v4().simple());

        let admin = PgPoolOptions::new().max_connections(1).connect(&url).await?;
        admin
            .execute(format!("CREATE SCHEMA {schema}").as_str())
            .await?;

        let search_path = format!("SET search_path TO {schema}, public");
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        Ok(Self {
            pool,
            admin,
            schema,
        })
    }

    async fn insert_user(&self, role: Role, active: bool) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, email, full_name, role, active) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(format!("{}@ministere.example", id.simple()))
        .bind("Aminata Fall")
        .bind(role.to_string())
        .bind(active)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn teardown(self) -> Result<()> {
        self.pool.close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await?;
        Ok(())
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn materiel(reference: &str, quantite: i32, seuil_minimum: i32) -> MaterielPayload {
    MaterielPayload {
        reference: reference.to_string(),
        designation: format!("Article {}", reference),
        categorie_id: None,
        fournisseur_id: None,
        quantite,
        seuil_minimum,
        unite: Some("carton".to_string()),
        emplacement: None,
    }
}

fn marche(reference: &str, fin: NaiveDate, statut: MarcheStatut) -> MarchePayload {
    MarchePayload {
        reference: reference.to_string(),
        objet: "Fournitures de bureau".to_string(),
        titulaire: Some("SOSEPA".to_string()),
        budget: 4_000_000,
        date_debut: date(2024, 1, 2),
        date_fin_prevue: fin,
        statut,
    }
}

fn bande(numero: i32, prevue: NaiveDate, statut: BandeStatut) -> BandePayload {
    BandePayload {
        numero,
        designation: format!("Livraison {}", numero),
        quantite: 10,
        date_prevue: prevue,
        date_livraison: None,
        statut,
        observations: None,
    }
}

fn mouvement(item_id: Uuid, kind: MouvementKind, quantite: i32) -> MouvementPayload {
    MouvementPayload {
        item_id,
        kind,
        quantite,
        motif: None,
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL"]
async fn test_mouvements_keep_stock_consistent() -> Result<()> {
    let db = TestDb::new().await?;
    let stock = StockRepository::new(db.pool.clone());
    let agent = Uuid::new_v4();
    let item = stock.create_item(&materiel("PAP-A4", 5, 2)).await?;

    let err = stock
        .record_mouvement(&mouvement(item.id, MouvementKind::Sortie, 8), agent)
        .await
        .unwrap_err();
    assert!(
        matches!(&err, DatabaseError::Conflict(msg) if msg.starts_with("Stock insuffisant")),
        "{err}"
    );

    // the refused sortie left no trace
    assert_eq!(stock.find_item(item.id).await?.unwrap().quantite, 5);
    let history = MouvementQuery {
        item_id: Some(item.id),
        limit: None,
    };
    assert!(stock.list_mouvements(&history).await?.is_empty());

    let counted = stock
        .record_mouvement(&mouvement(item.id, MouvementKind::Ajustement, 12), agent)
        .await?
        .unwrap();
    assert_eq!(counted.quantite_apres, 12);

    let received = stock
        .record_mouvement(&mouvement(item.id, MouvementKind::Entree, 3), agent)
        .await?
        .unwrap();
    assert_eq!(received.quantite_apres, 15);
    assert_eq!(stock.find_item(item.id).await?.unwrap().quantite, 15);
    assert_eq!(stock.list_mouvements(&history).await?.len(), 2);

    let missing = stock
        .record_mouvement(&mouvement(Uuid::new_v4(), MouvementKind::Entree, 1), agent)
        .await?;
    assert!(missing.is_none());

    db.teardown().await
}

#[tokio::test]
#[ignore = "requires running PostgreSQL"]
async fn test_schedules_skip_closed_work() -> Result<()> {
    let db = TestDb::new().await?;
    let marches = MarcheRepository::new(db.pool.clone());

    let open = marches
        .create(&marche("M-OPEN", date(2024, 9, 30), MarcheStatut::EnCours))
        .await?;
    marches
        .create(&marche("M-DONE", date(2024, 3, 31), MarcheStatut::Termine))
        .await?;
    marches
        .create(&marche("M-DROP", date(2024, 3, 31), MarcheStatut::Annule))
        .await?;

    marches
        .create_bande(open.id, &bande(1, date(2024, 2, 1), BandeStatut::Livree))
        .await?;
    marches
        .create_bande(open.id, &bande(2, date(2024, 4, 1), BandeStatut::Annulee))
        .await?;
    let pending = marches
        .create_bande(open.id, &bande(3, date(2024, 5, 1), BandeStatut::Partielle))
        .await?;

    let (open_marches, open_bandes) = marches.schedules().await?;
    let references: Vec<_> = open_marches.iter().map(|m| m.reference.as_str()).collect();
    assert_eq!(references, vec!["M-OPEN"]);
    assert_eq!(open_bandes.len(), 1);
    assert_eq!(open_bandes[0].id, pending.id);
    assert_eq!(open_bandes[0].marche_reference, "M-OPEN");

    db.teardown().await
}

#[tokio::test]
#[ignore = "requires running PostgreSQL"]
async fn test_all_alerts_merge_stock_and_marches() -> Result<()> {
    let db = TestDb::new().await?;
    let stock = StockRepository::new(db.pool.clone());
    let marches = MarcheRepository::new(db.pool.clone());
    let today = date(2024, 6, 1);

    stock.create_item(&materiel("A-RUPT", 0, 5)).await?;
    stock.create_item(&materiel("B-BAS", 2, 5)).await?;
    stock.create_item(&materiel("C-OK", 40, 5)).await?;

    marches
        .create(&marche("M-LATE", date(2024, 5, 15), MarcheStatut::EnCours))
        .await?;
    let soon = marches
        .create(&marche("M-SOON", date(2024, 6, 10), MarcheStatut::EnCours))
        .await?;
    marches
        .create_bande(soon.id, &bande(1, date(2024, 5, 20), BandeStatut::EnAttente))
        .await?;

    let service = AlertService::new(stock, marches, AlertThresholds { echeance_days: 15 });
    let alerts = service.all_alerts(today).await?;

    let seen: Vec<_> = alerts
        .iter()
        .map(|a| (a.reference.as_str(), a.kind))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("A-RUPT", AlertKind::RuptureStock),
            ("M-LATE", AlertKind::MarcheEnRetard),
            ("B-BAS", AlertKind::StockBas),
            ("M-SOON/1", AlertKind::LivraisonEnRetard),
            ("M-SOON", AlertKind::EcheanceProche),
        ]
    );

    db.teardown().await
}

#[tokio::test]
#[ignore = "requires running PostgreSQL"]
async fn test_handlers_map_storage_outcomes() -> Result<()> {
    let db = TestDb::new().await?;
    let admin_id = db.insert_user(Role::Admin, true).await?;
    let token = sign(admin_id, Role::Admin, TokenType::Access);
    let router = create_router(AppState::new(
        db.pool.clone(),
        verifier(),
        AlertThresholds::default(),
    ));

    let (status, body) = send(
        &router,
        "GET",
        &format!("/stock/items/{}", Uuid::new_v4()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Materiel not found");

    let (status, categorie) = send(
        &router,
        "POST",
        "/stock/categories",
        Some(&token),
        Some(json!({ "nom": "Papeterie" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let categorie_id = categorie["id"].as_str().unwrap().to_string();

    let (status, item) = send(
        &router,
        "POST",
        "/stock/items",
        Some(&token),
        Some(json!({
            "reference": "PAP-A4",
            "designation": "Ramette A4",
            "categorie_id": categorie_id,
            "quantite": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // a category still holding items cannot go
    let (status, _) = send(
        &router,
        "DELETE",
        &format!("/stock/categories/{}", categorie_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &router,
        "POST",
        "/stock/mouvements",
        Some(&token),
        Some(json!({ "item_id": item["id"], "kind": "sortie", "quantite": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().starts_with("Stock insuffisant"));

    let (status, body) = send(
        &router,
        "POST",
        "/stock/items",
        Some(&token),
        Some(json!({ "reference": "PAP-A4", "designation": "Doublon" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    db.teardown().await
}

#[tokio::test]
#[ignore = "requires running PostgreSQL"]
async fn test_bande_audit_points_at_its_marche() -> Result<()> {
    let db = TestDb::new().await?;
    let admin_id = db.insert_user(Role::Admin, true).await?;
    let token = sign(admin_id, Role::Admin, TokenType::Access);
    let router = create_router(AppState::new(
        db.pool.clone(),
        verifier(),
        AlertThresholds::default(),
    ));

    let (status, created) = send(
        &router,
        "POST",
        "/marches",
        Some(&token),
        Some(json!({
            "reference": "M-2024-011",
            "objet": "Mobilier de bureau",
            "budget": 9_000_000,
            "date_debut": "2024-02-01",
            "date_fin_prevue": "2024-08-31"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let marche_id: Uuid = created["id"].as_str().unwrap().parse()?;

    let (status, bande) = send(
        &router,
        "POST",
        &format!("/marches/{}/bandes", marche_id),
        Some(&token),
        Some(json!({
            "numero": 1,
            "designation": "Bureaux",
            "quantite": 12,
            "date_prevue": "2024-04-15"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &router,
        "DELETE",
        &format!("/bandes/{}", bande["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let audit = AuditRepository::new(db.pool.clone());
    let entries = audit
        .list(&AuditQuery {
            resource: Some(Resource::Marche),
            user_id: Some(admin_id),
            limit: None,
        })
        .await?;
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.resource_id == Some(marche_id)));
    assert!(entries.iter().any(|e| e.action == Action::Delete));

    db.teardown().await
}

#[tokio::test]
#[ignore = "requires running PostgreSQL"]
async fn test_disabled_account_loses_access_immediately() -> Result<()> {
    let db = TestDb::new().await?;
    let user_id = db.insert_user(Role::Manager, true).await?;
    let token = sign(user_id, Role::Manager, TokenType::Access);
    let router = create_router(AppState::new(
        db.pool.clone(),
        verifier(),
        AlertThresholds::default(),
    ));

    let (status, _) = send(&router, "GET", "/stock/items", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
        .bind(user_id)
        .execute(&db.pool)
        .await?;

    let (status, _) = send(&router, "GET", "/stock/items", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    db.teardown().await
}
