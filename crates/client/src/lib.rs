//! Async REST client for the devis backend: typed endpoints over a
//! swappable transport, post-creation refetch retry, e-signature dispatch
//! and PDF retrieval.

pub mod backend;
pub mod error;
pub mod esign;
pub mod pdf;
pub mod retry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{BackendApi, DevisPayload, LinePayload, NewClient};
pub use error::{ApiError, EsignError};
pub use esign::EsignDispatcher;
pub use pdf::fetch_pdf;
pub use retry::RetryPolicy;
pub use transport::{BackendTransport, HttpTransport, JsonResponse, Method, TransportError};
