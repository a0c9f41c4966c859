//! Webhook event processing.

mod process_event;

pub use process_event::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};
