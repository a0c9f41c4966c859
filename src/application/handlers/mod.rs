//! Command handlers, grouped by concern.

pub mod payments;
pub mod subscription;
pub mod webhook;

pub use payments::{
    CheckPaymentCommand, CheckPaymentHandler, CheckPaymentResult, CreatePaymentCommand,
    CreatePaymentHandler, CreatePaymentResult, PaymentContext, PollingPolicy, WatchPaymentCommand,
    WatchPaymentHandler, WatchPaymentResult,
};
pub use subscription::{CheckSubscriptionHandler, CheckSubscriptionResult};
pub use webhook::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};
