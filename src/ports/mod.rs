//! Ports: async trait contracts between the application core and adapters.

mod checkout_provider;
mod payment_gateway;
mod subscription_ledger;

pub use checkout_provider::{CheckoutProvider, OrderFilter, PaymentLink, Product, ProviderOrder};
pub use payment_gateway::{CustomerInfo, PaymentGateway, PaymentIntent, PaymentRequest};
pub use subscription_ledger::{ApprovedPayment, SubscriptionLedger};
