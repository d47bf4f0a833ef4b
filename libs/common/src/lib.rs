//! Common library for the ministry back-office services
//!
//! This crate provides shared functionality used across the services:
//! database connectivity, the Redis client, error handling, token
//! verification, settings, logging setup and the shared email format.

pub mod cache;
pub mod database;
pub mod error;
pub mod settings;
pub mod telemetry;
pub mod token;
pub mod validation;
