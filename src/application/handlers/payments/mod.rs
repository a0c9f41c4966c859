//! Payment lifecycle handlers: creation, single status checks, and the
//! polling watcher that confirms asynchronous payment methods.

mod check_payment;
mod create_payment;
mod watch_payment;

pub use check_payment::{CheckPaymentCommand, CheckPaymentHandler, CheckPaymentResult};
pub use create_payment::{CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult};
pub use watch_payment::{
    PollingPolicy, WatchPaymentCommand, WatchPaymentHandler, WatchPaymentResult,
};

use serde_json::Value;

use crate::domain::billing::{CustomerDetails, PlanType};
use crate::domain::foundation::EmailAddress;
use crate::ports::ApprovedPayment;

/// Purchase context carried alongside a pending payment so that a later
/// terminal outcome can be written to the ledger.
#[derive(Debug, Clone)]
pub struct PaymentContext {
    pub user_email: EmailAddress,
    pub customer: CustomerDetails,
    pub plan_type: PlanType,
    pub amount: f64,
    pub payment_method: String,
    pub metadata: Value,
}

impl PaymentContext {
    fn approved_payment(&self, transaction_id: &str) -> ApprovedPayment {
        ApprovedPayment {
            transaction_id: transaction_id.to_string(),
            user_email: self.user_email.clone(),
            customer: self.customer.clone(),
            plan_type: self.plan_type,
            amount: self.amount,
            payment_method: self.payment_method.clone(),
            metadata: self.metadata.clone(),
        }
    }
}
