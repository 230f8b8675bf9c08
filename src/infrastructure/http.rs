use crate::domain::bill::{BillQuery, BillSource, LedgerItem, SelectableBill};
use crate::domain::checkout::{CheckoutPayload, CheckoutResponse};
use crate::domain::payer::UserProfile;
use crate::domain::ports::{BillDirectory, BillingLedger, CheckoutGateway, UserDirectory};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(20),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One REST client implementing all four ports against the municipal
/// backend. Per-source bill shapes are normalized here, at the adapter
/// boundary; nothing downstream branches on backend field names.
#[derive(Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
}

impl RestBackend {
    pub fn new(config: RestConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BillingError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// The backend's outstanding-bill row. Anything beyond the shared fields
/// stays in `extra` and rides along as the bill's opaque meta.
#[derive(Debug, Deserialize)]
struct RawBill {
    id: serde_json::Value,
    #[serde(default)]
    bill_no: Option<String>,
    amount: Decimal,
    #[serde(default)]
    due_date: Option<NaiveDate>,
    #[serde(default)]
    description: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

fn normalize(source: BillSource, raw: RawBill) -> SelectableBill {
    let id = match raw.id {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };
    SelectableBill {
        source,
        id,
        bill_no: raw.bill_no,
        amount: raw.amount,
        due_date: raw.due_date,
        description: raw.description,
        meta: serde_json::Value::Object(raw.extra),
    }
}

#[async_trait]
impl BillDirectory for RestBackend {
    async fn fetch_outstanding(
        &self,
        source: BillSource,
        query: &BillQuery,
    ) -> Result<Vec<SelectableBill>> {
        let fetch_err = |message: String| BillingError::Fetch {
            category: source,
            message,
        };
        let response = self
            .client
            .get(self.url(&format!("/sources/{source}/outstanding")))
            .query(&[(query.param(), query.value())])
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?
            .error_for_status()
            .map_err(|e| fetch_err(e.to_string()))?;
        let raws: Vec<RawBill> = response
            .json()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        Ok(raws.into_iter().map(|r| normalize(source, r)).collect())
    }
}

#[async_trait]
impl BillingLedger for RestBackend {
    async fn items_by_bill_no(&self, bill_no: &str) -> Result<Vec<LedgerItem>> {
        let response = self
            .client
            .get(self.url("/billing/items"))
            .query(&[("bill_no", bill_no)])
            .send()
            .await
            .map_err(|e| BillingError::Backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| BillingError::Backend(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| BillingError::Backend(e.to_string()))
    }
}

#[async_trait]
impl CheckoutGateway for RestBackend {
    async fn submit(&self, payload: &CheckoutPayload) -> Result<CheckoutResponse> {
        let response = self
            .client
            .post(self.url("/checkout"))
            .json(payload)
            .send()
            .await
            .map_err(|e| BillingError::CheckoutTransport(e.to_string()))?
            .error_for_status()
            .map_err(|e| BillingError::CheckoutTransport(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| BillingError::CheckoutTransport(e.to_string()))
    }
}

#[async_trait]
impl UserDirectory for RestBackend {
    async fn user_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        let response = self
            .client
            .get(self.url("/users"))
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| BillingError::Backend(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .map_err(|e| BillingError::Backend(e.to_string()))?;
        let profile: UserProfile = response
            .json()
            .await
            .map_err(|e| BillingError::Backend(e.to_string()))?;
        Ok(Some(profile))
    }
}
