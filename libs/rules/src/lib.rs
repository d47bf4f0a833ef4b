//! Business rules for the ministry back office
//!
//! This crate holds the pure, I/O-free rules shared by the services:
//! the role hierarchy, the static permission table and the stock/marché
//! alert evaluation. Callers fetch records themselves and hand them in.

pub mod alerts;
pub mod permission;
pub mod role;

pub use alerts::{Alert, AlertKind, AlertThresholds, Severity};
pub use permission::{Action, Resource, has_permission, has_permission_named, permissions_for};
pub use role::{Role, Subject, can_access};
