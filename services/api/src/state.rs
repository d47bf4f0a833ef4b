//! Application state shared across handlers

use common::token::TokenVerifier;
use rules::AlertThresholds;
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    alerts::AlertService,
    repositories::{
        AccountDirectory, AuditRepository, EmployeRepository, LookupRepository, MarcheRepository, StockRepository,
        UserRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub verifier: TokenVerifier,
    pub accounts: Arc<dyn AccountDirectory>,
    pub user_repository: UserRepository,
    pub employe_repository: EmployeRepository,
    pub lookup_repository: LookupRepository,
    pub marche_repository: MarcheRepository,
    pub stock_repository: StockRepository,
    pub audit_repository: AuditRepository,
    pub alert_service: AlertService,
}

impl AppState {
    /// Wire every repository onto the same pool
    pub fn new(pool: PgPool, verifier: TokenVerifier, thresholds: AlertThresholds) -> Self {
        let marche_repository = MarcheRepository::new(pool.clone());
        let stock_repository = StockRepository::new(pool.clone());
        let user_repository = UserRepository::new(pool.clone());

        Self {
            verifier,
            accounts: Arc::new(user_repository.clone()),
            user_repository,
            employe_repository: EmployeRepository::new(pool.clone()),
            lookup_repository: LookupRepository::new(pool.clone()),
            alert_service: AlertService::new(
                stock_repository.clone(),
                marche_repository.clone(),
                thresholds,
            ),
            marche_repository,
            stock_repository,
            audit_repository: AuditRepository::new(pool),
        }
    }
}
