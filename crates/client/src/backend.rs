use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use devisio_core::{
    Article, Client, ClientId, FinancingParameters, LeasingFigures, Quote, QuoteDraft, QuoteId,
    QuoteStatus, Scenario, ScenarioFigures, VatRate,
};

use crate::error::{check, decode, ApiError};
use crate::retry::RetryPolicy;
use crate::transport::{BackendTransport, Method};

/// Client record as posted to the backend (no id yet).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub nom: String,
    pub prenom: String,
    pub rue: String,
    pub ville: String,
    pub code_postal: String,
    pub telephone: String,
    pub email: String,
}

/// One quote line as posted on save. The backend re-expands the article from
/// its id; the rate snapshot and comment travel with the line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinePayload {
    pub article_id: i64,
    pub quantite: u32,
    pub taux_tva: Decimal,
    pub commentaire: Option<String>,
}

/// Save payload for a devis, mirroring the backend create/update contract.
/// The leasing fields are only present when a leasing scenario is active.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DevisPayload {
    pub title: String,
    pub description: String,
    pub date: String,
    #[serde(rename = "montant_HT")]
    pub montant_ht: Decimal,
    #[serde(rename = "montant_TVA")]
    pub montant_tva: Decimal,
    #[serde(rename = "montant_TTC")]
    pub montant_ttc: Decimal,
    pub remise: Decimal,
    pub statut: QuoteStatus,
    pub client_id: Option<ClientId>,
    pub scenario: Option<Scenario>,
    pub is_location: bool,
    pub first_contribution_amount: Option<Decimal>,
    pub location_monthly_total_ht: Option<Decimal>,
    pub location_monthly_total: Option<Decimal>,
    pub location_total_ht: Option<Decimal>,
    pub location_total: Option<Decimal>,
    pub articles: Vec<LinePayload>,
}

impl DevisPayload {
    /// Flattens a draft (plus its current scenario figures) into the wire
    /// shape. The engine's computed values are authoritative; the backend
    /// stores them as-is.
    pub fn from_draft(draft: &QuoteDraft, figures: Option<&ScenarioFigures>) -> Self {
        let totals = draft.totals();
        let is_location = draft.scenario().map(Scenario::is_leasing).unwrap_or(false);
        let leasing = match figures {
            Some(ScenarioFigures::Leasing(figures)) => Some(*figures),
            _ => None,
        };
        let leasing_field = |extract: fn(&LeasingFigures) -> Decimal| leasing.as_ref().map(extract);

        Self {
            title: draft.titre().to_owned(),
            description: draft.description().to_owned(),
            date: draft.date().to_owned(),
            montant_ht: totals.montant_ht,
            montant_tva: totals.montant_tva,
            montant_ttc: totals.montant_ttc,
            remise: draft.remise(),
            statut: draft.statut(),
            client_id: draft.client_id,
            scenario: draft.scenario(),
            is_location,
            first_contribution_amount: is_location.then(|| draft.apport()),
            location_monthly_total_ht: leasing_field(|f| f.mensuel_ht),
            location_monthly_total: leasing_field(|f| f.mensuel_ttc),
            location_total_ht: leasing_field(|f| f.base_ht),
            location_total: leasing_field(|f| f.total_ttc),
            articles: draft
                .lignes()
                .iter()
                .map(|ligne| LinePayload {
                    article_id: ligne.article_id().0,
                    quantite: ligne.quantite,
                    taux_tva: ligne.taux_tva,
                    commentaire: (!ligne.commentaire.is_empty())
                        .then(|| ligne.commentaire.clone()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Typed surface over the REST backend.
pub struct BackendApi<T> {
    transport: T,
    retry: RetryPolicy,
}

impl<T: BackendTransport> BackendApi<T> {
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        let response = self.transport.request_json(Method::Get, path, None).await?;
        check(response)
    }

    async fn send<B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let body =
            serde_json::to_value(body).map_err(|error| ApiError::Decode(error.to_string()))?;
        let response = self.transport.request_json(method, path, Some(body)).await?;
        check(response)
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, ApiError> {
        let body = self.get("/clients/all").await?;
        decode::<DataEnvelope<Vec<Client>>>(body).map(|envelope| envelope.data)
    }

    pub async fn get_client(&self, id: ClientId) -> Result<Client, ApiError> {
        let body = self.get(&format!("/clients/info/{id}")).await?;
        decode(body)
    }

    /// Creates a client. A duplicate email surfaces as a 409 conflict; the
    /// caller may repeat with `force` to override after explicit
    /// confirmation.
    pub async fn create_client(&self, client: &NewClient, force: bool) -> Result<ClientId, ApiError> {
        let path = if force { "/clients/create?force=true" } else { "/clients/create" };
        let body = self.send(Method::Post, path, client).await?;
        decode::<CreatedId>(body).map(|created| ClientId(created.id))
    }

    pub async fn list_articles(&self) -> Result<Vec<Article>, ApiError> {
        let body = self.get("/articles/all").await?;
        decode::<DataEnvelope<Vec<Article>>>(body).map(|envelope| envelope.data)
    }

    pub async fn list_vat_rates(&self) -> Result<Vec<VatRate>, ApiError> {
        let body = self.get("/admin/vat-rates").await?;
        decode::<DataEnvelope<Vec<VatRate>>>(body).map(|envelope| envelope.data)
    }

    /// Global financing parameters administered company-wide.
    pub async fn financing_parameters(&self) -> Result<FinancingParameters, ApiError> {
        let body = self.get("/admin/parameters").await?;
        decode(body)
    }

    pub async fn get_devis(&self, id: QuoteId) -> Result<Quote, ApiError> {
        let body = self.get(&format!("/devis/info/{id}")).await?;
        decode(body)
    }

    pub async fn list_devis_for_client(&self, client: ClientId) -> Result<Vec<Quote>, ApiError> {
        let body = self.get(&format!("/devis/client/{client}")).await?;
        decode::<DataEnvelope<Vec<Quote>>>(body).map(|envelope| envelope.data)
    }

    /// Creates a devis, then refetches it under the retry policy (an
    /// immediate read may not see the new row). When every refetch attempt
    /// fails the quote still exists; the caller gets a recoverable
    /// [`ApiError::CreatedButUnavailable`].
    pub async fn create_devis(&self, payload: &DevisPayload) -> Result<Quote, ApiError> {
        let body = self.send(Method::Post, "/devis/create", payload).await?;
        let id = QuoteId(decode::<CreatedId>(body)?.id);
        info!(devis_id = %id, "devis created; refetching");

        self.retry
            .run("devis.refetch_after_create", || self.get_devis(id))
            .await
            .map_err(|_| ApiError::CreatedButUnavailable { id })
    }

    pub async fn update_devis(&self, id: QuoteId, payload: &DevisPayload) -> Result<QuoteId, ApiError> {
        let body = self.send(Method::Put, &format!("/devis/update/{id}"), payload).await?;
        decode::<CreatedId>(body).map(|created| QuoteId(created.id))
    }

    /// Deletion is refused by the backend once the quote is signed; that
    /// refusal surfaces as a conflict here.
    pub async fn delete_devis(&self, id: QuoteId) -> Result<(), ApiError> {
        let response =
            self.transport.request_json(Method::Delete, &format!("/devis/delete/{id}"), None).await?;
        check(response).map(|_| ())
    }
}
