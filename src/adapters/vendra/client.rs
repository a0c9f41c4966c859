//! Vendra account API client implementing the `CheckoutProvider` port.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::VendraConfig;
use crate::domain::billing::BillingError;
use crate::ports::{CheckoutProvider, OrderFilter, PaymentLink, Product, ProviderOrder};

/// Vendra checkout platform client.
///
/// Construction fails with `Configuration` when the account credentials
/// (client id, client secret, account id) are absent, so a misconfigured
/// deployment surfaces once at startup instead of as a generic network
/// failure on the first request.
pub struct VendraClient {
    config: VendraConfig,
    http_client: reqwest::Client,
}

impl VendraClient {
    pub fn new(config: VendraConfig) -> Result<Self, BillingError> {
        if !config.has_api_credentials() {
            return Err(BillingError::configuration(
                "Vendra credentials not configured (client id, client secret, account id)",
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| BillingError::configuration(format!("http client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn transport_error(err: reqwest::Error) -> BillingError {
        if err.is_timeout() {
            BillingError::timeout("checkout provider took too long to respond, try again")
        } else {
            BillingError::upstream(format!("connection to checkout provider failed: {err}"))
        }
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BillingError> {
        let status = response.status();
        let body = response.text().await.map_err(Self::transport_error)?;

        if !status.is_success() {
            return Err(BillingError::upstream(format!(
                "Vendra API error: {} - {}",
                status.as_u16(),
                body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| BillingError::upstream(format!("malformed Vendra response: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BillingError> {
        let secret = self
            .config
            .client_secret
            .as_ref()
            .ok_or_else(|| BillingError::configuration("Vendra client secret missing"))?;

        let response = self
            .http_client
            .get(self.url(path))
            .bearer_auth(secret.expose_secret())
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::read_json(response).await
    }
}

#[async_trait]
impl CheckoutProvider for VendraClient {
    async fn list_products(&self) -> Result<Vec<Product>, BillingError> {
        self.get("/products").await
    }

    async fn get_product(&self, product_id: &str) -> Result<Product, BillingError> {
        self.get(&format!("/products/{product_id}")).await
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<ProviderOrder>, BillingError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(status) = filter.status {
            query.push(("status", status));
        }
        if let Some(start) = filter.start_date {
            query.push(("start_date", start));
        }
        if let Some(end) = filter.end_date {
            query.push(("end_date", end));
        }
        if let Some(limit) = filter.limit {
            query.push(("limit", limit.to_string()));
        }

        let secret = self
            .config
            .client_secret
            .as_ref()
            .ok_or_else(|| BillingError::configuration("Vendra client secret missing"))?;

        let response = self
            .http_client
            .get(self.url("/orders"))
            .query(&query)
            .bearer_auth(secret.expose_secret())
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::read_json(response).await
    }

    async fn create_payment_link(
        &self,
        product_id: &str,
        extra: Option<Value>,
    ) -> Result<PaymentLink, BillingError> {
        let mut body = json!({
            "product_id": product_id,
            "account_id": self.config.account_id,
        });
        if let Some(Value::Object(extra)) = extra {
            if let Value::Object(map) = &mut body {
                map.extend(extra);
            }
        }

        let secret = self
            .config
            .client_secret
            .as_ref()
            .ok_or_else(|| BillingError::configuration("Vendra client secret missing"))?;

        let response = self
            .http_client
            .post(self.url("/payment-links"))
            .bearer_auth(secret.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(with_credentials: bool) -> VendraConfig {
        VendraConfig {
            client_id: if with_credentials { "cid" } else { "" }.to_string(),
            client_secret: with_credentials.then(|| SecretString::new("csecret".to_string())),
            account_id: if with_credentials { "acct" } else { "" }.to_string(),
            base_url: "https://public-api.vendra.com.br".to_string(),
            http_timeout_secs: 15,
            webhook_token: SecretString::new("whtok".to_string()),
        }
    }

    #[test]
    fn construction_requires_full_credential_set() {
        assert!(VendraClient::new(config(true)).is_ok());
        assert!(matches!(
            VendraClient::new(config(false)),
            Err(BillingError::Configuration(_))
        ));
    }

    #[test]
    fn missing_single_credential_still_fails_eagerly() {
        let mut cfg = config(true);
        cfg.account_id = String::new();
        assert!(matches!(
            VendraClient::new(cfg),
            Err(BillingError::Configuration(_))
        ));
    }
}
