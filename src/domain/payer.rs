use crate::error::{BillingError, Result};
use serde::{Deserialize, Serialize};

/// Contact details the gateway requires for a checkout.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct PayerProfile {
    pub name: String,
    pub email: String,
    pub mobile: String,
}

impl PayerProfile {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        mobile: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            mobile: mobile.into(),
        }
    }

    /// All three fields must be non-empty before any checkout network call
    /// is allowed.
    pub fn validate(&self) -> Result<()> {
        let missing = [
            ("name", &self.name),
            ("email", &self.email),
            ("mobile", &self.mobile),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BillingError::Validation(format!(
                "missing payer field(s): {}",
                missing.join(", ")
            )))
        }
    }
}

/// A user-directory record, used only for best-effort payer autofill.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct UserProfile {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub mobile: Option<String>,
}
