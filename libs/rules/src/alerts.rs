//! Stock and marché alert evaluation
//!
//! The evaluators take already-fetched records and return the alerts they
//! raise. They keep no state: the same input always yields the same,
//! identically ordered output.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::permission::ParseNameError;

/// Lifecycle of a marché
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarcheStatut {
    EnPreparation,
    EnCours,
    Suspendu,
    Termine,
    Annule,
}

impl MarcheStatut {
    pub fn as_str(self) -> &'static str {
        match self {
            MarcheStatut::EnPreparation => "en_preparation",
            MarcheStatut::EnCours => "en_cours",
            MarcheStatut::Suspendu => "suspendu",
            MarcheStatut::Termine => "termine",
            MarcheStatut::Annule => "annule",
        }
    }

    /// Closed marchés never raise schedule alerts
    pub fn is_closed(self) -> bool {
        matches!(self, MarcheStatut::Termine | MarcheStatut::Annule)
    }
}

impl FromStr for MarcheStatut {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en_preparation" => Ok(MarcheStatut::EnPreparation),
            "en_cours" => Ok(MarcheStatut::EnCours),
            "suspendu" => Ok(MarcheStatut::Suspendu),
            "termine" => Ok(MarcheStatut::Termine),
            "annule" => Ok(MarcheStatut::Annule),
            other => Err(ParseNameError(other.to_string())),
        }
    }
}

impl fmt::Display for MarcheStatut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a delivery batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandeStatut {
    EnAttente,
    Partielle,
    Livree,
    Annulee,
}

impl BandeStatut {
    pub fn as_str(self) -> &'static str {
        match self {
            BandeStatut::EnAttente => "en_attente",
            BandeStatut::Partielle => "partielle",
            BandeStatut::Livree => "livree",
            BandeStatut::Annulee => "annulee",
        }
    }

    pub fn is_settled(self) -> bool {
        matches!(self, BandeStatut::Livree | BandeStatut::Annulee)
    }
}

impl FromStr for BandeStatut {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en_attente" => Ok(BandeStatut::EnAttente),
            "partielle" => Ok(BandeStatut::Partielle),
            "livree" => Ok(BandeStatut::Livree),
            "annulee" => Ok(BandeStatut::Annulee),
            other => Err(ParseNameError(other.to_string())),
        }
    }
}

impl fmt::Display for BandeStatut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity, ordered `Info < Warning < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    RuptureStock,
    StockBas,
    LivraisonEnRetard,
    MarcheEnRetard,
    EcheanceProche,
}

/// A single breached rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    /// Id of the stock item, bande or marché that raised the alert
    pub entity_id: Uuid,
    pub reference: String,
    pub message: String,
    pub due_date: Option<NaiveDate>,
}

/// Stock item as seen by the evaluator
#[derive(Debug, Clone)]
pub struct StockLevel {
    pub id: Uuid,
    pub reference: String,
    pub designation: String,
    pub quantite: i32,
    pub seuil_minimum: i32,
}

#[derive(Debug, Clone)]
pub struct MarcheSchedule {
    pub id: Uuid,
    pub reference: String,
    pub objet: String,
    pub date_fin_prevue: NaiveDate,
    pub statut: MarcheStatut,
}

#[derive(Debug, Clone)]
pub struct BandeSchedule {
    pub id: Uuid,
    pub marche_reference: String,
    pub numero: i32,
    pub date_prevue: NaiveDate,
    pub statut: BandeStatut,
}

/// Tunable thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertThresholds {
    /// A running marché ending within this many days raises `echeance_proche`
    pub echeance_days: i64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self { echeance_days: 15 }
    }
}

/// Evaluate stock levels. Each item yields at most one alert.
pub fn evaluate_stock(items: &[StockLevel]) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = items.iter().filter_map(stock_alert).collect();
    sort_alerts(&mut alerts);
    alerts
}

fn stock_alert(item: &StockLevel) -> Option<Alert> {
    let (kind, severity, message) = if item.quantite <= 0 {
        (
            AlertKind::RuptureStock,
            Severity::Critical,
            format!("Rupture de stock : {}", item.designation),
        )
    } else if item.quantite < item.seuil_minimum {
        (
            AlertKind::StockBas,
            Severity::Warning,
            format!(
                "Stock bas : {} ({} restant(s), seuil {})",
                item.designation, item.quantite, item.seuil_minimum
            ),
        )
    } else {
        return None;
    };

    Some(Alert {
        kind,
        severity,
        entity_id: item.id,
        reference: item.reference.clone(),
        message,
        due_date: None,
    })
}

/// Evaluate marché deadlines and delivery batches against `today`
pub fn evaluate_marches(
    marches: &[MarcheSchedule],
    bandes: &[BandeSchedule],
    today: NaiveDate,
    thresholds: AlertThresholds,
) -> Vec<Alert> {
    let horizon = Duration::try_days(thresholds.echeance_days.max(0))
        .and_then(|window| today.checked_add_signed(window))
        .unwrap_or(NaiveDate::MAX);

    let marche_alerts = marches.iter().filter_map(|marche| {
        if marche.statut.is_closed() {
            return None;
        }

        if marche.date_fin_prevue < today {
            Some(Alert {
                kind: AlertKind::MarcheEnRetard,
                severity: Severity::Critical,
                entity_id: marche.id,
                reference: marche.reference.clone(),
                message: format!(
                    "Marché {} en retard : fin prévue le {}",
                    marche.reference, marche.date_fin_prevue
                ),
                due_date: Some(marche.date_fin_prevue),
            })
        } else if marche.date_fin_prevue <= horizon
            && matches!(
                marche.statut,
                MarcheStatut::EnPreparation | MarcheStatut::EnCours
            )
        {
            Some(Alert {
                kind: AlertKind::EcheanceProche,
                severity: Severity::Info,
                entity_id: marche.id,
                reference: marche.reference.clone(),
                message: format!(
                    "Marché {} ({}) arrive à échéance le {}",
                    marche.reference, marche.objet, marche.date_fin_prevue
                ),
                due_date: Some(marche.date_fin_prevue),
            })
        } else {
            None
        }
    });

    let bande_alerts = bandes
        .iter()
        .filter(|bande| bande.date_prevue < today && !bande.statut.is_settled())
        .map(|bande| Alert {
            kind: AlertKind::LivraisonEnRetard,
            severity: Severity::Warning,
            entity_id: bande.id,
            reference: format!("{}/{}", bande.marche_reference, bande.numero),
            message: format!(
                "Bande n°{} du marché {} non livrée (prévue le {})",
                bande.numero, bande.marche_reference, bande.date_prevue
            ),
            due_date: Some(bande.date_prevue),
        });

    let mut alerts: Vec<Alert> = marche_alerts.chain(bande_alerts).collect();
    sort_alerts(&mut alerts);
    alerts
}

/// Most severe first, then by reference, kind and id
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        (Reverse(a.severity), &a.reference, a.kind, a.entity_id).cmp(&(
            Reverse(b.severity),
            &b.reference,
            b.kind,
            b.entity_id,
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(reference: &str, quantite: i32, seuil_minimum: i32) -> StockLevel {
        StockLevel {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            designation: format!("Article {}", reference),
            quantite,
            seuil_minimum,
        }
    }

    fn marche(reference: &str, fin: NaiveDate, statut: MarcheStatut) -> MarcheSchedule {
        MarcheSchedule {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            objet: "Fournitures de bureau".to_string(),
            date_fin_prevue: fin,
            statut,
        }
    }

    fn bande(numero: i32, prevue: NaiveDate, statut: BandeStatut) -> BandeSchedule {
        BandeSchedule {
            id: Uuid::new_v4(),
            marche_reference: "M-2024-001".to_string(),
            numero,
            date_prevue: prevue,
            statut,
        }
    }

    #[test]
    fn test_low_stock_reported_exactly_once() {
        let items = vec![item("PAP-A4", 3, 10), item("STY-BL", 50, 10)];

        let alerts = evaluate_stock(&items);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::StockBas);
        assert_eq!(alerts[0].entity_id, items[0].id);
    }

    #[test]
    fn test_stock_evaluation_is_idempotent() {
        let items = vec![item("B", 0, 5), item("A", 2, 5), item("C", 4, 5)];

        let first = evaluate_stock(&items);
        let second = evaluate_stock(&items);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_empty_stock_is_critical_and_not_also_low() {
        let items = vec![item("ENC-01", 0, 5)];

        let alerts = evaluate_stock(&items);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::RuptureStock);
        assert_eq!(alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn test_quantity_at_threshold_is_fine() {
        assert!(evaluate_stock(&[item("X", 5, 5)]).is_empty());
    }

    #[test]
    fn test_stock_alerts_sorted_by_severity_then_reference() {
        let alerts = evaluate_stock(&[item("B", 1, 5), item("Z", 0, 5), item("A", 1, 5)]);
        let refs: Vec<_> = alerts.iter().map(|a| a.reference.as_str()).collect();
        assert_eq!(refs, vec!["Z", "A", "B"]);
    }

    #[test]
    fn test_overdue_bande_raises_alert_unless_settled() {
        let today = date(2024, 6, 1);
        let bandes = vec![
            bande(1, date(2024, 5, 1), BandeStatut::EnAttente),
            bande(2, date(2024, 5, 1), BandeStatut::Livree),
            bande(3, date(2024, 5, 1), BandeStatut::Annulee),
            bande(4, date(2024, 5, 15), BandeStatut::Partielle),
            bande(5, date(2024, 7, 1), BandeStatut::EnAttente),
        ];

        let alerts = evaluate_marches(&[], &bandes, today, AlertThresholds::default());
        let refs: Vec<_> = alerts.iter().map(|a| a.reference.as_str()).collect();
        assert_eq!(refs, vec!["M-2024-001/1", "M-2024-001/4"]);
        assert!(
            alerts
                .iter()
                .all(|a| a.kind == AlertKind::LivraisonEnRetard)
        );
    }

    #[test]
    fn test_bande_due_today_is_not_late() {
        let today = date(2024, 6, 1);
        let bandes = vec![bande(1, today, BandeStatut::EnAttente)];
        assert!(evaluate_marches(&[], &bandes, today, AlertThresholds::default()).is_empty());
    }

    #[test]
    fn test_marche_deadlines() {
        let today = date(2024, 6, 1);
        let marches = vec![
            marche("LATE", date(2024, 5, 31), MarcheStatut::EnCours),
            marche("DONE", date(2024, 5, 1), MarcheStatut::Termine),
            marche("SOON", date(2024, 6, 10), MarcheStatut::EnCours),
            marche("FAR", date(2024, 9, 1), MarcheStatut::EnCours),
            marche("HOLD", date(2024, 6, 10), MarcheStatut::Suspendu),
        ];

        let alerts = evaluate_marches(&marches, &[], today, AlertThresholds::default());
        let summary: Vec<_> = alerts
            .iter()
            .map(|a| (a.reference.as_str(), a.kind))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("LATE", AlertKind::MarcheEnRetard),
                ("SOON", AlertKind::EcheanceProche),
            ]
        );
    }

    #[test]
    fn test_zero_day_horizon_only_flags_today() {
        let today = date(2024, 6, 1);
        let marches = vec![
            marche("TODAY", today, MarcheStatut::EnCours),
            marche("TOMORROW", date(2024, 6, 2), MarcheStatut::EnCours),
        ];

        let alerts = evaluate_marches(
            &marches,
            &[],
            today,
            AlertThresholds { echeance_days: 0 },
        );
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].reference, "TODAY");
    }

    #[test]
    fn test_huge_horizon_saturates() {
        let today = date(2024, 6, 1);
        let marches = vec![marche("FAR", date(2090, 1, 1), MarcheStatut::EnCours)];

        for echeance_days in [1_000_000_000, i64::MAX] {
            let alerts = evaluate_marches(&marches, &[], today, AlertThresholds { echeance_days });
            assert_eq!(alerts.len(), 1);
            assert_eq!(alerts[0].kind, AlertKind::EcheanceProche);
        }
    }

    #[test]
    fn test_status_names_round_trip() {
        assert_eq!("en_cours".parse::<MarcheStatut>(), Ok(MarcheStatut::EnCours));
        assert_eq!(BandeStatut::Livree.as_str(), "livree");
        assert!("livré".parse::<BandeStatut>().is_err());
    }
}
