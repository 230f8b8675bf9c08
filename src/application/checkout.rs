use crate::domain::bill::SelectableBill;
use crate::domain::checkout::{CheckoutPayload, CheckoutRedirect};
use crate::domain::payer::PayerProfile;
use crate::domain::ports::CheckoutGatewayBox;
use crate::error::{BillingError, Result};
use std::time::Duration;
use uuid::Uuid;

/// Retry budget and per-call timeout for gateway submissions.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Gateway submissions per `checkout()` invocation, counting the first.
    pub max_attempts: u32,
    /// A call running past this consumes its attempt.
    pub call_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Ids attached to the payload when the payer is a known user or acts for a
/// registered business.
#[derive(Debug, Clone, Default)]
pub struct CheckoutIdentity {
    pub user_id: Option<String>,
    pub business_id: Option<String>,
}

/// Turns a selection snapshot plus payer profile into a payment-gateway
/// redirect.
///
/// The orchestrator never mutates the selection; clearing it after a
/// confirmed redirect is the caller's job, so any failure leaves the cart
/// intact for a retry.
pub struct CheckoutOrchestrator {
    gateway: CheckoutGatewayBox,
    config: CheckoutConfig,
    identity: CheckoutIdentity,
}

impl CheckoutOrchestrator {
    pub fn new(gateway: CheckoutGatewayBox) -> Self {
        Self {
            gateway,
            config: CheckoutConfig::default(),
            identity: CheckoutIdentity::default(),
        }
    }

    pub fn with_config(mut self, config: CheckoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_identity(mut self, identity: CheckoutIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Runs the checkout protocol against the gateway.
    ///
    /// Fails fast with [`BillingError::Validation`] before any network call
    /// when a payer field is empty or the snapshot is. Each attempt stamps a
    /// fresh idempotency reference onto the shared payload base, so a retry
    /// can never collide with a charge the gateway already accepted. A
    /// response without a redirect URL (or a call timeout) consumes one
    /// attempt; an `Err` from the gateway is terminal immediately.
    pub async fn checkout(
        &self,
        bills: &[SelectableBill],
        payer: &PayerProfile,
    ) -> Result<CheckoutRedirect> {
        payer.validate()?;
        if bills.is_empty() {
            return Err(BillingError::Validation(
                "nothing selected for checkout".to_string(),
            ));
        }

        let mut base = CheckoutPayload::base(bills, payer);
        base.user_id = self.identity.user_id.clone();
        base.business_id = self.identity.business_id.clone();

        let mut last_message: Option<String> = None;
        for attempt in 1..=self.config.max_attempts {
            let payload = base.with_reference(Uuid::new_v4().to_string());
            tracing::info!(
                attempt,
                reference = %payload.reference,
                bills = payload.line_items.len(),
                "submitting checkout"
            );

            let outcome =
                tokio::time::timeout(self.config.call_timeout, self.gateway.submit(&payload)).await;
            match outcome {
                Err(_) => {
                    tracing::warn!(attempt, "checkout call timed out");
                    last_message = Some("gateway call timed out".to_string());
                }
                Ok(Err(err)) => {
                    tracing::error!(attempt, %err, "checkout transport failure");
                    return Err(match err {
                        transport @ BillingError::CheckoutTransport(_) => transport,
                        other => BillingError::CheckoutTransport(other.to_string()),
                    });
                }
                Ok(Ok(response)) => {
                    if let Some(url) = response.redirect_url() {
                        tracing::info!(attempt, url, "checkout accepted");
                        return Ok(CheckoutRedirect {
                            url: url.to_string(),
                            reference: payload.reference,
                        });
                    }
                    tracing::warn!(
                        attempt,
                        message = response.message.as_deref().unwrap_or(""),
                        "gateway returned no redirect URL"
                    );
                    last_message = response.message;
                }
            }
        }

        Err(BillingError::CheckoutExhausted {
            attempts: self.config.max_attempts,
            message: last_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bill::BillSource;
    use crate::domain::checkout::CheckoutResponse;
    use crate::domain::ports::CheckoutGateway;
    use crate::infrastructure::in_memory::ScriptedGateway;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    fn bill(id: &str, bill_no: &str) -> SelectableBill {
        SelectableBill {
            source: BillSource::Assessment,
            id: id.to_string(),
            bill_no: Some(bill_no.to_string()),
            amount: dec!(10.00),
            due_date: None,
            description: None,
            meta: serde_json::Value::Null,
        }
    }

    fn payer() -> PayerProfile {
        PayerProfile::new("Aminah", "aminah@example.com", "0123456789")
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let gateway = ScriptedGateway::new();
        gateway.push_url("https://pay.example/abc").await;
        let orchestrator = CheckoutOrchestrator::new(Box::new(gateway.clone()));

        let redirect = orchestrator
            .checkout(&[bill("A1", "B1")], &payer())
            .await
            .unwrap();
        assert_eq!(redirect.url, "https://pay.example/abc");
        assert!(!redirect.reference.is_empty());
        assert_eq!(gateway.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_retry_uses_fresh_reference() {
        let gateway = ScriptedGateway::new();
        gateway
            .push_response(CheckoutResponse {
                url: None,
                message: Some("gateway busy".to_string()),
            })
            .await;
        gateway.push_url("https://pay.example/retry").await;
        let orchestrator = CheckoutOrchestrator::new(Box::new(gateway.clone()));

        let redirect = orchestrator
            .checkout(&[bill("A1", "B1")], &payer())
            .await
            .unwrap();
        assert_eq!(redirect.url, "https://pay.example/retry");

        let calls = gateway.calls().await;
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0].reference, calls[1].reference);
        assert!(!calls[0].reference.is_empty());
        assert_eq!(redirect.reference, calls[1].reference);
    }

    #[tokio::test]
    async fn test_at_most_two_gateway_calls() {
        let gateway = ScriptedGateway::new();
        // Nothing scripted: every call answers with no URL.
        let orchestrator = CheckoutOrchestrator::new(Box::new(gateway.clone()));

        let err = orchestrator
            .checkout(&[bill("A1", "B1")], &payer())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BillingError::CheckoutExhausted { attempts: 2, .. }
        ));
        assert_eq!(gateway.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_keeps_last_gateway_message() {
        let gateway = ScriptedGateway::new();
        gateway
            .push_response(CheckoutResponse {
                url: None,
                message: Some("first".to_string()),
            })
            .await;
        gateway
            .push_response(CheckoutResponse {
                url: Some(String::new()),
                message: Some("second".to_string()),
            })
            .await;
        let orchestrator = CheckoutOrchestrator::new(Box::new(gateway.clone()));

        let err = orchestrator
            .checkout(&[bill("A1", "B1")], &payer())
            .await
            .unwrap_err();
        match err {
            BillingError::CheckoutExhausted { attempts, message } => {
                assert_eq!(attempts, 2);
                assert_eq!(message.as_deref(), Some("second"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_validation_makes_zero_network_calls() {
        let gateway = ScriptedGateway::new();
        gateway.push_url("https://pay.example/abc").await;
        let orchestrator = CheckoutOrchestrator::new(Box::new(gateway.clone()));

        let incomplete = PayerProfile::new("Aminah", "aminah@example.com", "");
        let err = orchestrator
            .checkout(&[bill("A1", "B1")], &incomplete)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
        assert!(gateway.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_selection_rejected_without_calls() {
        let gateway = ScriptedGateway::new();
        let orchestrator = CheckoutOrchestrator::new(Box::new(gateway.clone()));
        let err = orchestrator.checkout(&[], &payer()).await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
        assert!(gateway.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal_without_retry() {
        let gateway = ScriptedGateway::new();
        gateway.push_transport_error("connection reset").await;
        gateway.push_url("https://pay.example/abc").await;
        let orchestrator = CheckoutOrchestrator::new(Box::new(gateway.clone()));

        let err = orchestrator
            .checkout(&[bill("A1", "B1")], &payer())
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::CheckoutTransport(_)));
        // The scripted success was never consumed.
        assert_eq!(gateway.calls().await.len(), 1);
    }

    struct HangingGateway;

    #[async_trait]
    impl CheckoutGateway for HangingGateway {
        async fn submit(&self, _payload: &CheckoutPayload) -> crate::error::Result<CheckoutResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(CheckoutResponse::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout_consumes_attempt_budget() {
        let orchestrator = CheckoutOrchestrator::new(Box::new(HangingGateway)).with_config(
            CheckoutConfig {
                max_attempts: 2,
                call_timeout: Duration::from_millis(50),
            },
        );

        let err = orchestrator
            .checkout(&[bill("A1", "B1")], &payer())
            .await
            .unwrap_err();
        match err {
            BillingError::CheckoutExhausted { attempts, message } => {
                assert_eq!(attempts, 2);
                assert_eq!(message.as_deref(), Some("gateway call timed out"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_identity_carried_on_payload() {
        let gateway = ScriptedGateway::new();
        gateway.push_url("https://pay.example/abc").await;
        let orchestrator = CheckoutOrchestrator::new(Box::new(gateway.clone())).with_identity(
            CheckoutIdentity {
                user_id: Some("U-1".to_string()),
                business_id: None,
            },
        );

        orchestrator
            .checkout(&[bill("A1", "B1")], &payer())
            .await
            .unwrap();
        let calls = gateway.calls().await;
        assert_eq!(calls[0].user_id.as_deref(), Some("U-1"));
        assert_eq!(calls[0].business_id, None);
    }
}
