use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The billing categories a citizen can owe money under.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum BillSource {
    /// Property assessment tax.
    Assessment,
    /// Traffic compounds.
    Compound,
    /// Market / booth rentals.
    Booth,
    /// Miscellaneous fees.
    Misc,
}

impl fmt::Display for BillSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BillSource::Assessment => "assessment",
            BillSource::Compound => "compound",
            BillSource::Booth => "booth",
            BillSource::Misc => "misc",
        };
        f.write_str(name)
    }
}

/// Identity of a bill within the selection: `(source, id)`.
///
/// Bill ids are only unique within their source, so the source tag is part
/// of the key.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
pub struct BillKey {
    pub source: BillSource,
    pub id: String,
}

/// An outstanding bill normalized into the one shape every downstream
/// component consumes. Source-specific fields live in `meta`; nothing past
/// the directory adapter branches on per-source field names.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SelectableBill {
    pub source: BillSource,
    pub id: String,
    /// Ledger bill number, when the source assigns one. Unique across the
    /// whole billing ledger.
    #[serde(default)]
    pub bill_no: Option<String>,
    pub amount: Decimal,
    /// Preserved as absent when the source has no due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    /// Opaque source-specific payload, carried through untouched.
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl SelectableBill {
    pub fn key(&self) -> BillKey {
        BillKey {
            source: self.source,
            id: self.id.clone(),
        }
    }

    /// Whether the bill may enter the selection at all.
    pub fn is_selectable(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// The label used when building a checkout description: the bill number
    /// when present, the id otherwise.
    pub fn label(&self) -> &str {
        self.bill_no.as_deref().unwrap_or(&self.id)
    }
}

/// One row returned by the billing ledger for a bill number.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LedgerItem {
    pub bill_no: String,
    pub status: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl LedgerItem {
    /// Ledger statuses arrive in whatever casing the backend feels like.
    pub fn is_paid(&self) -> bool {
        self.status.eq_ignore_ascii_case("PAID")
    }
}

/// Paid-status verdict for a single bill number.
#[derive(Debug, PartialEq, Clone)]
pub struct PaidStatus {
    pub bill_no: String,
    pub paid: bool,
    pub reference: Option<String>,
}

/// The reconciliation result: one verdict per distinct bill number, keyed by
/// bill number. Replaced wholesale on every reconciliation pass, never
/// merged incrementally.
#[derive(Debug, Default, Clone)]
pub struct PaidStatusMap {
    entries: HashMap<String, PaidStatus>,
}

impl PaidStatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, status: PaidStatus) {
        self.entries.insert(status.bill_no.clone(), status);
    }

    pub fn get(&self, bill_no: &str) -> Option<&PaidStatus> {
        self.entries.get(bill_no)
    }

    /// Unknown bill numbers default to unpaid.
    pub fn is_paid(&self, bill_no: &str) -> bool {
        self.entries.get(bill_no).is_some_and(|s| s.paid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lookup shapes accepted by the bill directory. Which shapes a source
/// honors varies per source; the directory decides.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "snake_case", tag = "by", content = "value")]
pub enum BillQuery {
    Ic(String),
    AccountNo(String),
    BillNo(String),
    CompoundNo(String),
    VehicleRegistrationNo(String),
}

impl BillQuery {
    /// The wire parameter name for the REST adapter.
    pub fn param(&self) -> &'static str {
        match self {
            BillQuery::Ic(_) => "ic",
            BillQuery::AccountNo(_) => "account_no",
            BillQuery::BillNo(_) => "bill_no",
            BillQuery::CompoundNo(_) => "compound_no",
            BillQuery::VehicleRegistrationNo(_) => "vehicle_registration_no",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            BillQuery::Ic(v)
            | BillQuery::AccountNo(v)
            | BillQuery::BillNo(v)
            | BillQuery::CompoundNo(v)
            | BillQuery::VehicleRegistrationNo(v) => v,
        }
    }

    /// Key used to detect a superseded in-flight fetch for the same lookup.
    pub fn cache_key(&self) -> String {
        format!("{}={}", self.param(), self.value())
    }
}
