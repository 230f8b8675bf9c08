use crate::domain::bill::BillSource;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BillingError>;

#[derive(Error, Debug)]
pub enum BillingError {
    /// Incomplete or malformed caller input. Recovered locally; never
    /// produces a network call.
    #[error("Validation error: {0}")]
    Validation(String),
    /// A bill directory or ledger lookup failed. Isolated per category;
    /// other categories and the current selection are unaffected.
    #[error("Fetch error for {category}: {message}")]
    Fetch {
        category: BillSource,
        message: String,
    },
    /// The checkout retry budget ran out without the gateway returning a
    /// redirect URL. The selection is preserved so the payer can retry.
    #[error("Checkout failed after {attempts} attempt(s): {}", .message.as_deref().unwrap_or("no redirect URL returned"))]
    CheckoutExhausted {
        attempts: u32,
        message: Option<String>,
    },
    /// A source-agnostic backend lookup failed (billing ledger, user
    /// directory). Consumers treat it like a fetch failure: isolated and
    /// non-fatal.
    #[error("Backend error: {0}")]
    Backend(String),
    /// The gateway call itself failed (connection refused, TLS, 5xx mapped
    /// by the adapter). Terminal immediately; does not consume retry budget.
    #[error("Checkout transport error: {0}")]
    CheckoutTransport(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
