//! Alert computation over the current database contents
//!
//! Each call re-reads the records it needs and hands them to the
//! evaluators in `rules::alerts`. Nothing is cached between calls.

use chrono::{NaiveDate, Utc};
use common::error::DatabaseResult;
use rules::{
    Alert, AlertThresholds,
    alerts::{evaluate_marches, evaluate_stock, sort_alerts},
};
use tracing::info;

use crate::repositories::{MarcheRepository, StockRepository};

#[derive(Clone)]
pub struct AlertService {
    stock: StockRepository,
    marches: MarcheRepository,
    thresholds: AlertThresholds,
}

/// Evaluation date for deadline rules
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl AlertService {
    pub fn new(
        stock: StockRepository,
        marches: MarcheRepository,
        thresholds: AlertThresholds,
    ) -> Self {
        Self {
            stock,
            marches,
            thresholds,
        }
    }

    pub async fn stock_alerts(&self) -> DatabaseResult<Vec<Alert>> {
        let levels = self.stock.stock_levels().await?;
        let alerts = evaluate_stock(&levels);
        info!("{} stock alert(s) over {} item(s)", alerts.len(), levels.len());
        Ok(alerts)
    }

    pub async fn marche_alerts(&self, today: NaiveDate) -> DatabaseResult<Vec<Alert>> {
        let (marches, bandes) = self.marches.schedules().await?;
        let alerts = evaluate_marches(&marches, &bandes, today, self.thresholds);
        info!(
            "{} marche alert(s) over {} marche(s) and {} bande(s)",
            alerts.len(),
            marches.len(),
            bandes.len()
        );
        Ok(alerts)
    }

    /// Stock and marché alerts merged into one ordered list
    pub async fn all_alerts(&self, today: NaiveDate) -> DatabaseResult<Vec<Alert>> {
        let mut alerts = self.stock_alerts().await?;
        alerts.extend(self.marche_alerts(today).await?);
        sort_alerts(&mut alerts);
        Ok(alerts)
    }
}
