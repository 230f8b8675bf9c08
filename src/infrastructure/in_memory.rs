use crate::domain::bill::{BillQuery, BillSource, LedgerItem, SelectableBill};
use crate::domain::checkout::{CheckoutPayload, CheckoutResponse};
use crate::domain::payer::UserProfile;
use crate::domain::ports::{BillDirectory, BillingLedger, CheckoutGateway, UserDirectory};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory bill directory backing tests and the demo binary.
///
/// Holds normalized bills and answers `fetch_outstanding` by source, with a
/// light query filter: when a bill's meta carries the queried field (e.g.
/// `account_no`) and the values differ, the bill is excluded. Bills without
/// the field match any query, which keeps small fixtures convenient.
#[derive(Default, Clone)]
pub struct InMemoryBillDirectory {
    bills: Arc<RwLock<Vec<SelectableBill>>>,
}

impl InMemoryBillDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bills(bills: Vec<SelectableBill>) -> Self {
        Self {
            bills: Arc::new(RwLock::new(bills)),
        }
    }

    pub async fn push(&self, bill: SelectableBill) {
        self.bills.write().await.push(bill);
    }
}

#[async_trait]
impl BillDirectory for InMemoryBillDirectory {
    async fn fetch_outstanding(
        &self,
        source: BillSource,
        query: &BillQuery,
    ) -> Result<Vec<SelectableBill>> {
        let bills = self.bills.read().await;
        Ok(bills
            .iter()
            .filter(|b| b.source == source)
            .filter(|b| match b.meta.get(query.param()).and_then(|v| v.as_str()) {
                Some(value) => value == query.value(),
                None => true,
            })
            .cloned()
            .collect())
    }
}

/// In-memory billing ledger: bill number to its ledger rows.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    items: Arc<RwLock<HashMap<String, Vec<LedgerItem>>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, item: LedgerItem) {
        self.items
            .write()
            .await
            .entry(item.bill_no.clone())
            .or_default()
            .push(item);
    }

    /// Records a settlement for a bill number, as if it was paid through
    /// another channel.
    pub async fn mark_paid(&self, bill_no: &str, reference: Option<&str>) {
        self.push(LedgerItem {
            bill_no: bill_no.to_string(),
            status: "PAID".to_string(),
            reference: reference.map(str::to_string),
            amount: None,
        })
        .await;
    }
}

#[async_trait]
impl BillingLedger for InMemoryLedger {
    async fn items_by_bill_no(&self, bill_no: &str) -> Result<Vec<LedgerItem>> {
        let items = self.items.read().await;
        Ok(items.get(bill_no).cloned().unwrap_or_default())
    }
}

enum ScriptedReply {
    Response(CheckoutResponse),
    TransportError(String),
}

/// A gateway double for the retry-protocol tests: answers from a queue of
/// scripted replies and records every submitted payload. An empty queue
/// answers with an empty response (no redirect URL), the retryable case.
#[derive(Default, Clone)]
pub struct ScriptedGateway {
    replies: Arc<RwLock<VecDeque<ScriptedReply>>>,
    calls: Arc<RwLock<Vec<CheckoutPayload>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_response(&self, response: CheckoutResponse) {
        self.replies
            .write()
            .await
            .push_back(ScriptedReply::Response(response));
    }

    pub async fn push_url(&self, url: &str) {
        self.push_response(CheckoutResponse {
            url: Some(url.to_string()),
            message: None,
        })
        .await;
    }

    pub async fn push_transport_error(&self, message: &str) {
        self.replies
            .write()
            .await
            .push_back(ScriptedReply::TransportError(message.to_string()));
    }

    /// Every payload submitted so far, in call order.
    pub async fn calls(&self) -> Vec<CheckoutPayload> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl CheckoutGateway for ScriptedGateway {
    async fn submit(&self, payload: &CheckoutPayload) -> Result<CheckoutResponse> {
        self.calls.write().await.push(payload.clone());
        match self.replies.write().await.pop_front() {
            Some(ScriptedReply::Response(response)) => Ok(response),
            Some(ScriptedReply::TransportError(message)) => {
                Err(BillingError::CheckoutTransport(message))
            }
            None => Ok(CheckoutResponse::default()),
        }
    }
}

/// In-memory user directory keyed by email.
#[derive(Default, Clone)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<String, UserProfile>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<UserProfile>) -> Self {
        let map = users.into_iter().map(|u| (u.email.clone(), u)).collect();
        Self {
            users: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn insert(&self, user: UserProfile) {
        self.users.write().await.insert(user.email.clone(), user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn user_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        Ok(self.users.read().await.get(email).cloned())
    }
}
