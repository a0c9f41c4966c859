//! CalmWave - Meditation App Billing Backend
//!
//! This crate implements the payment and subscription reconciliation engine
//! behind the CalmWave meditation app: two payment provider integrations
//! (a polling-style gateway and a webhook-style checkout platform), a
//! persisted subscription ledger, and the orchestration that converges both
//! integration styles into one consistent entitlement state.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
