use crate::application::checkout::CheckoutOrchestrator;
use crate::application::reconcile::PaidStatusReconciler;
use crate::application::selection::SelectionStore;
use crate::domain::bill::{BillKey, BillQuery, BillSource, PaidStatus, PaidStatusMap, SelectableBill};
use crate::domain::checkout::CheckoutRedirect;
use crate::domain::payer::PayerProfile;
use crate::domain::ports::BillDirectoryBox;
use crate::error::{BillingError, Result};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

type FetchKey = (BillSource, String);

/// One citizen's billing session: the cart, the latest paid-status map, and
/// the machinery keeping them consistent.
///
/// `refresh` is the consistency pump: fetch → reconcile → purge, strictly in
/// that order. After any completed refresh, no selection member whose bill
/// number the ledger reports as paid can remain in the cart. Nothing here
/// survives the session; there is no durable state.
pub struct BillingSession {
    directory: BillDirectoryBox,
    reconciler: PaidStatusReconciler,
    orchestrator: CheckoutOrchestrator,
    selection: SelectionStore,
    paid: RwLock<PaidStatusMap>,
    /// Monotonic generation per `(source, query)`; a fetch whose ticket is
    /// no longer current when it lands is discarded.
    generations: RwLock<HashMap<FetchKey, u64>>,
    fetch_timeout: Duration,
}

impl BillingSession {
    pub fn new(
        directory: BillDirectoryBox,
        reconciler: PaidStatusReconciler,
        orchestrator: CheckoutOrchestrator,
    ) -> Self {
        Self {
            directory,
            reconciler,
            orchestrator,
            selection: SelectionStore::new(),
            paid: RwLock::new(PaidStatusMap::new()),
            generations: RwLock::new(HashMap::new()),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Seeds the cart, e.g. when restoring a selection handed in by the
    /// caller.
    pub fn with_selection(mut self, selection: SelectionStore) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    /// Fetches outstanding bills for one source, reconciles their bill
    /// numbers against the ledger, replaces the paid map wholesale, and
    /// purges now-paid members from the cart.
    ///
    /// Returns `Ok(None)` when a newer fetch for the same `(source, query)`
    /// superseded this one; the stale result is discarded without touching
    /// any state. Fetch failures (including timeout) surface as
    /// [`BillingError::Fetch`] and leave the cart and paid map untouched.
    pub async fn refresh(
        &self,
        source: BillSource,
        query: &BillQuery,
    ) -> Result<Option<Vec<SelectableBill>>> {
        let key: FetchKey = (source, query.cache_key());
        let ticket = {
            let mut generations = self.generations.write().await;
            let entry = generations.entry(key.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        let bills = match tokio::time::timeout(
            self.fetch_timeout,
            self.directory.fetch_outstanding(source, query),
        )
        .await
        {
            Err(_) => {
                return Err(BillingError::Fetch {
                    category: source,
                    message: format!("fetch timed out after {:?}", self.fetch_timeout),
                });
            }
            Ok(Err(err @ BillingError::Fetch { .. })) => return Err(err),
            Ok(Err(err)) => {
                return Err(BillingError::Fetch {
                    category: source,
                    message: err.to_string(),
                });
            }
            Ok(Ok(bills)) => bills,
        };

        if !self.is_current(&key, ticket).await {
            tracing::debug!(%source, query = %key.1, "discarding superseded fetch");
            return Ok(None);
        }

        let bill_nos = bills.iter().filter_map(|b| b.bill_no.clone());
        let paid = self.reconciler.reconcile(bill_nos).await;

        // The reconciliation itself may have been overtaken.
        if !self.is_current(&key, ticket).await {
            tracing::debug!(%source, query = %key.1, "discarding superseded reconciliation");
            return Ok(None);
        }

        *self.paid.write().await = paid;
        let evicted = {
            let paid = self.paid.read().await;
            self.selection.purge_paid(&paid).await
        };
        if !evicted.is_empty() {
            tracing::info!(
                %source,
                evicted = evicted.len(),
                "purged paid bills from selection"
            );
        }

        Ok(Some(bills))
    }

    async fn is_current(&self, key: &FetchKey, ticket: u64) -> bool {
        self.generations.read().await.get(key) == Some(&ticket)
    }

    pub async fn is_paid(&self, bill_no: &str) -> bool {
        self.paid.read().await.is_paid(bill_no)
    }

    pub async fn paid_status(&self, bill_no: &str) -> Option<PaidStatus> {
        self.paid.read().await.get(bill_no).cloned()
    }

    /// Adds one bill to the cart unless it is unselectable, already present,
    /// or known paid.
    pub async fn select(&self, bill: SelectableBill) -> bool {
        if let Some(no) = bill.bill_no.as_deref() {
            if self.is_paid(no).await {
                return false;
            }
        }
        self.selection.add(bill).await
    }

    pub async fn deselect(&self, key: &BillKey) -> Option<SelectableBill> {
        self.selection.remove(key).await
    }

    /// "Select all" for one listing: every unpaid, selectable bill enters
    /// the cart in one critical section. Returns how many were added.
    ///
    /// The paid map stays read-locked while the store filters and inserts,
    /// so a concurrent refresh can never slip a new paid verdict between
    /// the paid check and the insert. Lock order (paid before selection)
    /// matches the purge path in `refresh`.
    pub async fn select_all_unpaid(&self, bills: &[SelectableBill]) -> usize {
        let paid = self.paid.read().await;
        self.selection
            .add_all_where(bills.iter().cloned(), |b| {
                !b.bill_no.as_deref().is_some_and(|no| paid.is_paid(no))
            })
            .await
    }

    /// Checks the current cart out. On a confirmed redirect exactly the
    /// checked-out snapshot leaves the cart, so back-navigation cannot
    /// resurrect a paid selection while anything selected mid-flight stays.
    /// On any failure the cart is preserved untouched for a retry.
    pub async fn checkout(&self, payer: &PayerProfile) -> Result<CheckoutRedirect> {
        let snapshot = self.selection.snapshot().await;
        let redirect = self.orchestrator.checkout(&snapshot, payer).await?;
        let paid_for: Vec<BillKey> = snapshot.iter().map(|b| b.key()).collect();
        self.selection.remove_all(&paid_for).await;
        Ok(redirect)
    }
}
