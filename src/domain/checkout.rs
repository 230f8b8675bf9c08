use crate::domain::bill::{BillSource, SelectableBill};
use crate::domain::payer::PayerProfile;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// At most this many bill numbers are spelled out in a checkout
/// description; the rest collapse into a `+N more` suffix.
pub const DESCRIPTION_LABEL_LIMIT: usize = 5;

/// One gateway line item. `account_no` comes from the source's `account_no`
/// meta field when present, falling back to the bill id.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LineItem {
    pub account_no: String,
    pub item_type_code: String,
    pub amount: Decimal,
    #[serde(default)]
    pub bill_no: Option<String>,
}

/// The request body sent to the payment gateway. Built once per checkout as
/// an immutable base; only `reference` varies between attempts.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CheckoutPayload {
    /// Idempotency token. Freshly generated per attempt, never reused.
    pub reference: String,
    pub payer_name: String,
    pub payer_email: String,
    pub payer_mobile: String,
    pub description: String,
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub business_id: Option<String>,
}

impl CheckoutPayload {
    /// Builds the attempt-invariant payload base. The reference starts
    /// empty; every attempt stamps its own via [`with_reference`].
    ///
    /// [`with_reference`]: CheckoutPayload::with_reference
    pub fn base(bills: &[SelectableBill], payer: &PayerProfile) -> Self {
        Self {
            reference: String::new(),
            payer_name: payer.name.clone(),
            payer_email: payer.email.clone(),
            payer_mobile: payer.mobile.clone(),
            description: describe(bills),
            line_items: bills.iter().map(line_item).collect(),
            user_id: None,
            business_id: None,
        }
    }

    pub fn with_reference(&self, reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..self.clone()
        }
    }
}

/// What the gateway answers. A non-empty `url` is the only success signal.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct CheckoutResponse {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CheckoutResponse {
    pub fn redirect_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

/// A resolved checkout: where to send the payer, under which reference.
#[derive(Debug, PartialEq, Clone)]
pub struct CheckoutRedirect {
    pub url: String,
    pub reference: String,
}

/// Human-readable summary of the bills under payment: up to
/// [`DESCRIPTION_LABEL_LIMIT`] distinct bill numbers (bill id when the
/// number is absent), `+N more` when truncated, and a plain count when no
/// label resolves at all.
pub fn describe(bills: &[SelectableBill]) -> String {
    let mut labels: Vec<&str> = Vec::new();
    for bill in bills {
        let label = bill.label();
        if !label.is_empty() && !labels.contains(&label) {
            labels.push(label);
        }
    }

    if labels.is_empty() {
        return format!("Payment for {} bill(s)", bills.len());
    }

    let shown = labels.len().min(DESCRIPTION_LABEL_LIMIT);
    let mut out = labels[..shown].join(", ");
    let rest = labels.len() - shown;
    if rest > 0 {
        out.push_str(&format!(" +{rest} more"));
    }
    out
}

/// Default gateway item type code per billing category. Misc bills may
/// carry their own code in meta.
pub fn item_type_code(bill: &SelectableBill) -> String {
    match bill.source {
        BillSource::Assessment => "01".to_string(),
        BillSource::Booth => "02".to_string(),
        BillSource::Misc => bill
            .meta
            .get("item_type_code")
            .and_then(|v| v.as_str())
            .filter(|c| !c.is_empty())
            .unwrap_or("05")
            .to_string(),
        BillSource::Compound => "99".to_string(),
    }
}

fn line_item(bill: &SelectableBill) -> LineItem {
    let account_no = bill
        .meta
        .get("account_no")
        .and_then(|v| v.as_str())
        .filter(|a| !a.is_empty())
        .unwrap_or(&bill.id)
        .to_string();
    LineItem {
        account_no,
        item_type_code: item_type_code(bill),
        amount: bill.amount,
        bill_no: bill.bill_no.clone(),
    }
}
