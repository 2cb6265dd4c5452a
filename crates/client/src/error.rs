use serde_json::Value;
use thiserror::Error;

use devisio_core::QuoteId;

use crate::transport::{JsonResponse, TransportError};

/// Errors crossing the backend boundary, mapped from the HTTP status and the
/// `{ "error": string }` body convention.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("backend validation rejected the request: {0}")]
    Validation(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    /// 409. Recoverable: the caller may repeat the operation with an
    /// explicit override flag.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The quote was persisted but the post-creation refetch kept failing.
    /// Degraded but recoverable: a later fetch by id will succeed.
    #[error("devis {id} was created but could not be reloaded; refetch it to recover")]
    CreatedButUnavailable { id: QuoteId },
    #[error("backend returned status {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("could not decode backend response: {0}")]
    Decode(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// E-signature dispatch failures. Dispatch is never auto-retried; a consent
/// error routes the operator to the out-of-band OAuth consent flow.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EsignError {
    #[error("signer consent is required; complete the consent flow at {consent_url}")]
    ConsentRequired { consent_url: String },
    #[error("envelope dispatch failed: {0}")]
    Dispatch(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub(crate) fn error_message(body: &Value) -> String {
    body.get("error")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| "unexpected backend response".to_owned())
}

/// Maps a raw response onto the error taxonomy, passing 2xx bodies through.
pub(crate) fn check(response: JsonResponse) -> Result<Value, ApiError> {
    match response.status {
        200..=299 => Ok(response.body),
        400 => Err(ApiError::Validation(error_message(&response.body))),
        404 => Err(ApiError::NotFound(error_message(&response.body))),
        409 => Err(ApiError::Conflict(error_message(&response.body))),
        status => Err(ApiError::Backend { status, message: error_message(&response.body) }),
    }
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|error| ApiError::Decode(error.to_string()))
}
