//! PixFlow payment gateway adapter (polling-style provider).
//!
//! Implements the `PaymentGateway` port against PixFlow's REST API: create
//! payment, fetch status, cancel. PixFlow never calls us back; pending
//! payments are driven to completion by polling.

mod client;
mod wire;

pub use client::PixflowGateway;
