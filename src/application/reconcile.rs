use crate::domain::bill::{PaidStatus, PaidStatusMap};
use crate::domain::ports::BillingLedgerBox;
use futures::stream::{self, StreamExt};

/// Per-bill-number ledger lookups run this many at a time unless the caller
/// tunes it. Bill-number cardinality is caller-controlled, so the fan-out
/// must be bounded somewhere.
pub const DEFAULT_LOOKUP_CONCURRENCY: usize = 8;

/// Cross-checks bill numbers against the billing ledger to find bills that
/// were already paid through some other channel.
///
/// One reconciliation pass produces one complete [`PaidStatusMap`]; the
/// session replaces its previous map with it wholesale. The pass commits
/// only once every lookup has settled.
pub struct PaidStatusReconciler {
    ledger: BillingLedgerBox,
    concurrency: usize,
}

impl PaidStatusReconciler {
    pub fn new(ledger: BillingLedgerBox) -> Self {
        Self {
            ledger,
            concurrency: DEFAULT_LOOKUP_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Looks up every distinct, non-empty bill number concurrently. A bill
    /// is paid iff any ledger item for its number reports `PAID`
    /// (case-insensitive). Numbers whose lookup fails default to unpaid;
    /// the failure never aborts the pass.
    pub async fn reconcile(&self, bill_nos: impl IntoIterator<Item = String>) -> PaidStatusMap {
        let mut distinct: Vec<String> = Vec::new();
        for no in bill_nos {
            if !no.is_empty() && !distinct.contains(&no) {
                distinct.push(no);
            }
        }

        let statuses: Vec<PaidStatus> = stream::iter(distinct)
            .map(|bill_no| async move { self.lookup(bill_no).await })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut map = PaidStatusMap::new();
        for status in statuses {
            map.insert(status);
        }
        map
    }

    async fn lookup(&self, bill_no: String) -> PaidStatus {
        match self.ledger.items_by_bill_no(&bill_no).await {
            Ok(items) => {
                let paid_item = items.iter().find(|i| i.is_paid());
                PaidStatus {
                    paid: paid_item.is_some(),
                    reference: paid_item.and_then(|i| i.reference.clone()),
                    bill_no,
                }
            }
            Err(err) => {
                tracing::warn!(%bill_no, %err, "paid-status lookup failed, treating as unpaid");
                PaidStatus {
                    bill_no,
                    paid: false,
                    reference: None,
                }
            }
        }
    }
}
