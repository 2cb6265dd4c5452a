use serde_json::{json, Value};
use tracing::info;

use devisio_core::{EsignConfig, QuoteId};

use crate::error::{error_message, EsignError};
use crate::transport::{BackendTransport, Method};

/// Sends a devis out for electronic signature through the backend's
/// DocuSign relay. Dispatch is deliberate and never auto-retried: a repeat
/// would send the signer a second envelope.
pub struct EsignDispatcher<T> {
    transport: T,
    config: EsignConfig,
}

impl<T: BackendTransport> EsignDispatcher<T> {
    pub fn new(transport: T, config: EsignConfig) -> Self {
        Self { transport, config }
    }

    /// Dispatches the signature envelope for an already-saved devis. On
    /// success the caller records the pending-signature transition; the
    /// status change is not made here so a transport failure leaves the
    /// quote untouched.
    pub async fn send_for_signature(&self, id: QuoteId) -> Result<(), EsignError> {
        if !self.config.enabled {
            return Err(EsignError::Dispatch(
                "la signature électronique est désactivée dans la configuration".to_owned(),
            ));
        }

        let response = self
            .transport
            .request_json(Method::Post, "/docusign/send", Some(json!({ "devis_id": id.0 })))
            .await?;

        match response.status {
            200..=299 => {
                info!(devis_id = %id, "signature envelope dispatched");
                Ok(())
            }
            _ => Err(self.map_failure(&response.body)),
        }
    }

    /// The relay reports a missing OAuth grant as `consent_required` with
    /// the URL the operator must open; everything else is a plain dispatch
    /// failure.
    fn map_failure(&self, body: &Value) -> EsignError {
        if body.get("error").and_then(Value::as_str) == Some("consent_required") {
            let consent_url = body
                .get("consent_url")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .or_else(|| self.config.consent_redirect_url.clone())
                .unwrap_or_default();
            return EsignError::ConsentRequired { consent_url };
        }
        EsignError::Dispatch(error_message(body))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use devisio_core::{EsignConfig, QuoteId};

    use crate::error::EsignError;
    use crate::testing::FakeTransport;

    use super::EsignDispatcher;

    fn config(enabled: bool) -> EsignConfig {
        EsignConfig {
            enabled,
            integration_key: "ik-test".to_owned().into(),
            account_id: "acct-1".to_owned(),
            consent_redirect_url: Some("https://app.example.fr/consent".to_owned()),
        }
    }

    #[tokio::test]
    async fn successful_dispatch_records_a_single_request() {
        let transport = FakeTransport::default();
        transport.push_json(200, json!({"status": "sent"}));

        let dispatcher = EsignDispatcher::new(transport, config(true));
        dispatcher.send_for_signature(QuoteId(31)).await.expect("dispatched");

        let requests = dispatcher.transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/docusign/send");
        assert_eq!(requests[0].body, Some(json!({"devis_id": 31})));
    }

    #[tokio::test]
    async fn consent_failure_carries_the_consent_url() {
        let transport = FakeTransport::default();
        transport.push_json(
            401,
            json!({"error": "consent_required", "consent_url": "https://account.docusign.com/oauth"}),
        );

        let dispatcher = EsignDispatcher::new(transport, config(true));
        let error = dispatcher.send_for_signature(QuoteId(31)).await.expect_err("consent");
        assert_eq!(
            error,
            EsignError::ConsentRequired {
                consent_url: "https://account.docusign.com/oauth".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn disabled_integration_fails_without_touching_the_wire() {
        let transport = FakeTransport::default();
        let dispatcher = EsignDispatcher::new(transport, config(false));

        let error = dispatcher.send_for_signature(QuoteId(31)).await.expect_err("disabled");
        assert!(matches!(error, EsignError::Dispatch(_)));
        assert!(dispatcher.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn plain_failure_surfaces_the_backend_message() {
        let transport = FakeTransport::default();
        transport.push_json(500, json!({"error": "Envoi DocuSign impossible"}));

        let dispatcher = EsignDispatcher::new(transport, config(true));
        let error = dispatcher.send_for_signature(QuoteId(31)).await.expect_err("failure");
        assert!(matches!(error, EsignError::Dispatch(message) if message.contains("DocuSign")));
    }
}
