//! PostgreSQL implementation of the `SubscriptionLedger` port.
//!
//! The `transaction_id` unique constraint is the idempotency guarantee:
//! `INSERT ... ON CONFLICT DO NOTHING` gives concurrent upserts exactly one
//! winner, and the loser reads back the winner's row. An application-level
//! existence check alone would leave a window between check and insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{
    BillingError, HistoryStatus, PlanType, Subscription, SubscriptionStatus,
};
use crate::domain::foundation::{EmailAddress, Timestamp};
use crate::ports::{ApprovedPayment, SubscriptionLedger};

/// PostgreSQL subscription ledger.
pub struct PostgresSubscriptionLedger {
    pool: PgPool,
}

impl PostgresSubscriptionLedger {
    /// Creates a ledger backed by the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends a history entry, logging instead of failing.
    ///
    /// The subscription row is authoritative: once it is committed the
    /// payment is accepted, and a history write failure must not unwind it.
    async fn append_history(
        &self,
        subscription_id: Uuid,
        amount: f64,
        status: HistoryStatus,
        transaction_id: &str,
        metadata: &Value,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_history (id, subscription_id, amount, status, transaction_id, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(subscription_id)
        .bind(amount)
        .bind(status.as_str())
        .bind(transaction_id)
        .bind(metadata)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::error!(
                %subscription_id,
                transaction_id,
                error = %e,
                "Failed to append payment history entry"
            );
        }
    }

    async fn find_active_row(
        &self,
        user_email: &EmailAddress,
    ) -> Result<Option<SubscriptionRow>, BillingError> {
        sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_email, user_name, user_phone, user_cpf, plan_type, amount,
                   status, transaction_id, payment_method, expires_at, created_at, updated_at
            FROM subscriptions
            WHERE user_email = $1 AND status = 'active'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find subscription: {e}")))
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_email: String,
    user_name: String,
    user_phone: Option<String>,
    user_cpf: Option<String>,
    plan_type: String,
    amount: f64,
    status: String,
    transaction_id: String,
    payment_method: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = BillingError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let plan_type = PlanType::parse(&row.plan_type)
            .ok_or_else(|| BillingError::database(format!("invalid plan_type: {}", row.plan_type)))?;
        let status = SubscriptionStatus::parse(&row.status)
            .ok_or_else(|| BillingError::database(format!("invalid status: {}", row.status)))?;
        let user_email = EmailAddress::new(&row.user_email)
            .map_err(|e| BillingError::database(format!("invalid stored email: {e}")))?;

        Ok(Subscription {
            id: row.id,
            user_email,
            user_name: row.user_name,
            user_phone: row.user_phone,
            user_cpf: row.user_cpf,
            plan_type,
            amount: row.amount,
            status,
            transaction_id: row.transaction_id,
            payment_method: row.payment_method,
            expires_at: Timestamp::from_datetime(row.expires_at),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl SubscriptionLedger for PostgresSubscriptionLedger {
    async fn upsert_approved_payment(
        &self,
        payment: ApprovedPayment,
    ) -> Result<Subscription, BillingError> {
        let now = Timestamp::now();
        let candidate = Subscription::new_active(
            payment.user_email.clone(),
            payment.customer.clone(),
            payment.plan_type,
            payment.amount,
            payment.transaction_id.clone(),
            payment.payment_method.clone(),
            now,
        );

        // One winner per transaction_id, decided by the unique constraint.
        let inserted: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            INSERT INTO subscriptions (
                id, user_email, user_name, user_phone, user_cpf, plan_type, amount,
                status, transaction_id, payment_method, expires_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (transaction_id) DO NOTHING
            RETURNING id, user_email, user_name, user_phone, user_cpf, plan_type, amount,
                      status, transaction_id, payment_method, expires_at, created_at, updated_at
            "#,
        )
        .bind(candidate.id)
        .bind(candidate.user_email.as_str())
        .bind(&candidate.user_name)
        .bind(&candidate.user_phone)
        .bind(&candidate.user_cpf)
        .bind(candidate.plan_type.as_str())
        .bind(candidate.amount)
        .bind(candidate.status.as_str())
        .bind(&candidate.transaction_id)
        .bind(&candidate.payment_method)
        .bind(candidate.expires_at.as_datetime())
        .bind(candidate.created_at.as_datetime())
        .bind(candidate.updated_at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to insert subscription: {e}")))?;

        match inserted {
            Some(row) => {
                let subscription = Subscription::try_from(row)?;
                self.append_history(
                    subscription.id,
                    payment.amount,
                    HistoryStatus::Approved,
                    &payment.transaction_id,
                    &payment.metadata,
                )
                .await;
                tracing::info!(
                    subscription_id = %subscription.id,
                    transaction_id = %payment.transaction_id,
                    "Subscription created"
                );
                Ok(subscription)
            }
            None => {
                // Lost the race or redelivered event: return the winner's row.
                let row: SubscriptionRow = sqlx::query_as(
                    r#"
                    SELECT id, user_email, user_name, user_phone, user_cpf, plan_type, amount,
                           status, transaction_id, payment_method, expires_at, created_at, updated_at
                    FROM subscriptions
                    WHERE transaction_id = $1
                    "#,
                )
                .bind(&payment.transaction_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    BillingError::database(format!("failed to load existing subscription: {e}"))
                })?;

                tracing::info!(
                    transaction_id = %payment.transaction_id,
                    "Subscription already exists for this transaction"
                );
                Subscription::try_from(row)
            }
        }
    }

    async fn renew_active_subscription(
        &self,
        user_email: &EmailAddress,
        amount: f64,
        metadata: Value,
    ) -> Result<Option<Subscription>, BillingError> {
        let Some(row) = self.find_active_row(user_email).await? else {
            tracing::info!(email = %user_email, "No active subscription to renew");
            return Ok(None);
        };
        let mut subscription = Subscription::try_from(row)?;

        subscription.renew(Timestamp::now());

        sqlx::query(
            r#"
            UPDATE subscriptions SET expires_at = $2, updated_at = $3 WHERE id = $1
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.expires_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to renew subscription: {e}")))?;

        let mut metadata = metadata;
        if let Value::Object(map) = &mut metadata {
            map.insert("renewal".to_string(), json!(true));
        }
        self.append_history(
            subscription.id,
            amount,
            HistoryStatus::Approved,
            &subscription.transaction_id,
            &metadata,
        )
        .await;

        tracing::info!(subscription_id = %subscription.id, "Subscription renewed");
        Ok(Some(subscription))
    }

    async fn record_failed_payment(
        &self,
        transaction_id: &str,
        amount: f64,
        metadata: Value,
    ) -> Result<(), BillingError> {
        let subscription_id: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM subscriptions WHERE transaction_id = $1")
                .bind(transaction_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| BillingError::database(format!("failed to find subscription: {e}")))?;

        match subscription_id {
            Some(id) => {
                self.append_history(id, amount, HistoryStatus::Rejected, transaction_id, &metadata)
                    .await;
            }
            None => {
                // Nothing to attach the failure to.
                tracing::info!(transaction_id, "Failed payment for unknown transaction, ignoring");
            }
        }

        Ok(())
    }

    async fn cancel_active_subscription(
        &self,
        user_email: &EmailAddress,
        amount: f64,
        metadata: Value,
    ) -> Result<(), BillingError> {
        let Some(row) = self.find_active_row(user_email).await? else {
            tracing::info!(email = %user_email, "No active subscription to cancel");
            return Ok(());
        };
        let mut subscription = Subscription::try_from(row)?;

        subscription.cancel(Timestamp::now());

        sqlx::query(
            r#"
            UPDATE subscriptions SET status = 'cancelled', updated_at = $2 WHERE id = $1
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to cancel subscription: {e}")))?;

        self.append_history(
            subscription.id,
            amount,
            HistoryStatus::Rejected,
            &subscription.transaction_id,
            &metadata,
        )
        .await;

        tracing::info!(subscription_id = %subscription.id, "Subscription cancelled");
        Ok(())
    }

    async fn find_active_subscription(
        &self,
        user_email: &EmailAddress,
    ) -> Result<Option<Subscription>, BillingError> {
        // Expiry is evaluated at read time; nothing ever flips status to
        // "expired" in storage.
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, user_email, user_name, user_phone, user_cpf, plan_type, amount,
                   status, transaction_id, payment_method, expires_at, created_at, updated_at
            FROM subscriptions
            WHERE user_email = $1 AND status = 'active' AND expires_at >= NOW()
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::database(format!("failed to find subscription: {e}")))?;

        row.map(Subscription::try_from).transpose()
    }
}
