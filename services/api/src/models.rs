//! API models for request and response payloads

pub mod audit;
pub mod employe;
pub mod lookup;
pub mod marche;
pub mod stock;
pub mod user;
