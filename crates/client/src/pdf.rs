use devisio_core::{QuoteId, Scenario};

use crate::error::ApiError;
use crate::transport::BackendTransport;

/// Fetches the rendered PDF for a devis. The optional scenario selects which
/// financing panel the backend renders into the document.
pub async fn fetch_pdf<T: BackendTransport>(
    transport: &T,
    id: QuoteId,
    scenario: Option<Scenario>,
) -> Result<Vec<u8>, ApiError> {
    let path = match scenario {
        Some(scenario) => format!("/devis/pdf/{id}?scenario={}", scenario.as_query_param()),
        None => format!("/devis/pdf/{id}"),
    };

    let (status, bytes) = transport.request_bytes(&path).await?;
    match status {
        200..=299 => Ok(bytes),
        404 => Err(ApiError::NotFound(format!("devis {id} introuvable"))),
        status => Err(ApiError::Backend {
            status,
            message: String::from_utf8_lossy(&bytes).into_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use devisio_core::{QuoteId, Scenario};

    use crate::error::ApiError;
    use crate::testing::FakeTransport;

    use super::fetch_pdf;

    #[tokio::test]
    async fn scenario_is_threaded_through_as_a_query_parameter() {
        let transport = FakeTransport::default();
        transport.push_bytes(200, b"%PDF-1.7".to_vec());

        let bytes = fetch_pdf(&transport, QuoteId(31), Some(Scenario::LeasingWithDownPayment))
            .await
            .expect("pdf bytes");

        assert_eq!(bytes, b"%PDF-1.7");
        assert_eq!(
            transport.requests()[0].path,
            "/devis/pdf/31?scenario=leasing_with_down_payment"
        );
    }

    #[tokio::test]
    async fn missing_devis_maps_to_not_found() {
        let transport = FakeTransport::default();
        transport.push_bytes(404, Vec::new());

        let error = fetch_pdf(&transport, QuoteId(99), None).await.expect_err("missing");
        assert!(matches!(error, ApiError::NotFound(_)));
        assert_eq!(transport.requests()[0].path, "/devis/pdf/99");
    }
}
