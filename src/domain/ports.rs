use super::bill::{BillQuery, BillSource, LedgerItem, SelectableBill};
use super::checkout::{CheckoutPayload, CheckoutResponse};
use super::payer::UserProfile;
use crate::error::Result;
use async_trait::async_trait;

/// Fetches and normalizes outstanding bills for one billing category.
///
/// A source with nothing outstanding answers `Ok(vec![])`, never an error.
/// Implementations are pure fetch + normalize; they never touch the
/// selection.
#[async_trait]
pub trait BillDirectory: Send + Sync {
    async fn fetch_outstanding(
        &self,
        source: BillSource,
        query: &BillQuery,
    ) -> Result<Vec<SelectableBill>>;
}

/// Looks a bill number up in the central billing ledger.
#[async_trait]
pub trait BillingLedger: Send + Sync {
    async fn items_by_bill_no(&self, bill_no: &str) -> Result<Vec<LedgerItem>>;
}

/// Submits a checkout payload to the payment gateway.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn submit(&self, payload: &CheckoutPayload) -> Result<CheckoutResponse>;
}

/// Resolves a user-directory record by email, for payer autofill.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_by_email(&self, email: &str) -> Result<Option<UserProfile>>;
}

pub type BillDirectoryBox = Box<dyn BillDirectory>;
pub type BillingLedgerBox = Box<dyn BillingLedger>;
pub type CheckoutGatewayBox = Box<dyn CheckoutGateway>;
pub type UserDirectoryBox = Box<dyn UserDirectory>;
