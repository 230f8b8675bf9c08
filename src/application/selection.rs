use crate::domain::bill::{BillKey, PaidStatusMap, SelectableBill};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The cart: an insertion-ordered set of selectable bills keyed by
/// `(source, id)`, shared across every page of the session.
///
/// Uses `Arc<RwLock<Vec<_>>>` so handles can be cloned into whatever owns
/// them. Every mutating method takes the write lock once and holds no await
/// inside it, so compound operations (select-all, purge) are atomic with
/// respect to other cart access.
///
/// Membership only ever ends through [`remove`], [`remove_all`], [`clear`],
/// or a reconciliation [`purge_paid`]. There is no expiry.
///
/// [`remove`]: SelectionStore::remove
/// [`remove_all`]: SelectionStore::remove_all
/// [`clear`]: SelectionStore::clear
/// [`purge_paid`]: SelectionStore::purge_paid
#[derive(Default, Clone)]
pub struct SelectionStore {
    bills: Arc<RwLock<Vec<SelectableBill>>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with an initial selection. Entries that would not be
    /// addable (non-positive amount, duplicate key) are dropped.
    pub fn with_bills(initial: Vec<SelectableBill>) -> Self {
        let mut bills: Vec<SelectableBill> = Vec::with_capacity(initial.len());
        for bill in initial {
            if bill.is_selectable() && !bills.iter().any(|b| b.key() == bill.key()) {
                bills.push(bill);
            }
        }
        Self {
            bills: Arc::new(RwLock::new(bills)),
        }
    }

    /// Idempotent insert. Returns whether the bill was added; `false` for a
    /// non-positive amount or an already-present key, both no-ops.
    pub async fn add(&self, bill: SelectableBill) -> bool {
        if !bill.is_selectable() {
            return false;
        }
        let mut bills = self.bills.write().await;
        if bills.iter().any(|b| b.key() == bill.key()) {
            return false;
        }
        bills.push(bill);
        true
    }

    /// Inserts many bills under one write lock, so a "select all" cannot
    /// interleave with other cart access. Returns how many were added.
    pub async fn add_all(&self, incoming: impl IntoIterator<Item = SelectableBill>) -> usize {
        self.add_all_where(incoming, |_| true).await
    }

    /// Like [`add_all`], but the caller's predicate is consulted inside the
    /// write lock, so filter and insert form one critical section. Lets the
    /// session exclude paid bills without a window between the paid-status
    /// read and the insert.
    ///
    /// [`add_all`]: SelectionStore::add_all
    pub async fn add_all_where(
        &self,
        incoming: impl IntoIterator<Item = SelectableBill>,
        mut keep: impl FnMut(&SelectableBill) -> bool,
    ) -> usize {
        let mut bills = self.bills.write().await;
        let mut added = 0;
        for bill in incoming {
            if bill.is_selectable()
                && keep(&bill)
                && !bills.iter().any(|b| b.key() == bill.key())
            {
                bills.push(bill);
                added += 1;
            }
        }
        added
    }

    pub async fn remove(&self, key: &BillKey) -> Option<SelectableBill> {
        let mut bills = self.bills.write().await;
        let idx = bills.iter().position(|b| &b.key() == key)?;
        Some(bills.remove(idx))
    }

    /// Removes the given keys in one critical section, leaving every other
    /// member untouched. Returns how many were removed.
    pub async fn remove_all(&self, keys: &[BillKey]) -> usize {
        let mut bills = self.bills.write().await;
        let before = bills.len();
        bills.retain(|b| !keys.contains(&b.key()));
        before - bills.len()
    }

    pub async fn has(&self, key: &BillKey) -> bool {
        self.bills.read().await.iter().any(|b| &b.key() == key)
    }

    pub async fn clear(&self) {
        self.bills.write().await.clear();
    }

    pub async fn count(&self) -> usize {
        self.bills.read().await.len()
    }

    /// Exact sum of member amounts. Round only at display.
    pub async fn total(&self) -> Decimal {
        self.bills
            .read()
            .await
            .iter()
            .map(|b| b.amount)
            .sum()
    }

    /// Members in insertion order, cloned out so the caller can hold them
    /// across awaits.
    pub async fn snapshot(&self) -> Vec<SelectableBill> {
        self.bills.read().await.clone()
    }

    /// Removes every member whose bill number the latest reconciliation
    /// marked paid, in one critical section. Returns the evicted members.
    /// Members without a bill number cannot be reconciled and always stay.
    pub async fn purge_paid(&self, paid: &PaidStatusMap) -> Vec<SelectableBill> {
        let mut bills = self.bills.write().await;
        let mut evicted = Vec::new();
        bills.retain(|b| {
            let gone = b
                .bill_no
                .as_deref()
                .is_some_and(|no| paid.is_paid(no));
            if gone {
                evicted.push(b.clone());
            }
            !gone
        });
        evicted
    }
}
