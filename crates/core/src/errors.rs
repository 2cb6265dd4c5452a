use thiserror::Error;

use crate::domain::article::ArticleId;
use crate::domain::quote::QuoteStatus;

/// Field-level validation failures, surfaced locally before any network call.
///
/// `user_message` carries the operator-facing French wording shown by the
/// front end; the `Display` impl stays technical for logs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("quote title is missing")]
    TitleMissing,
    #[error("quote date is missing")]
    DateMissing,
    #[error("quote date is not a valid calendar date: `{0}`")]
    DateInvalid(String),
    #[error("line quantity is missing")]
    QuantityMissing,
    #[error("line quantity must be a positive integer, got `{0}`")]
    QuantityInvalid(String),
    #[error("a quote needs at least one line before it can be saved")]
    NoLines,
    #[error("monetary amount must not be negative")]
    NegativeAmount,
    #[error("vat rate must be a decimal fraction between 0 and 1")]
    RateOutOfRange,
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::TitleMissing => "Veuillez entrer un titre",
            Self::DateMissing => "Veuillez entrer une date",
            Self::DateInvalid(_) => "Format de date invalide",
            Self::QuantityMissing => "Veuillez entrer une quantité",
            Self::QuantityInvalid(_) => "Veuillez entrer une quantité valide (> 0)",
            Self::NoLines => "Veuillez ajouter au moins un article au devis.",
            Self::NegativeAmount => "Le montant ne peut pas être négatif",
            Self::RateOutOfRange => "Taux de TVA invalide",
        }
    }
}

/// Business-rule failures raised by the quote editor and the state machine.
/// No mutation happens when one of these is returned.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("quote is signed and can no longer be modified")]
    QuoteSigned,
    #[error("financing scenario is locked once the quote has been sent for signature")]
    ScenarioLocked,
    #[error("article {0} is already part of the quote")]
    DuplicateArticle(ArticleId),
    #[error("no quote line references article {0}")]
    LineNotFound(ArticleId),
    #[error("down payment is fixed at zero for leasing without down payment")]
    DownPaymentNotAllowed,
    #[error("invalid status transition from {from:?} to {to:?}")]
    InvalidTransition { from: QuoteStatus, to: QuoteStatus },
}

/// Failures crossing the application boundary: backend round-trips,
/// e-signature dispatch, PDF rendering, configuration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("backend returned status {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::{DomainError, ValidationError};

    #[test]
    fn validation_errors_carry_operator_facing_messages() {
        assert_eq!(ValidationError::TitleMissing.user_message(), "Veuillez entrer un titre");
        assert_eq!(
            ValidationError::QuantityInvalid("-3".to_owned()).user_message(),
            "Veuillez entrer une quantité valide (> 0)"
        );
        assert_eq!(
            ValidationError::NoLines.user_message(),
            "Veuillez ajouter au moins un article au devis."
        );
    }

    #[test]
    fn validation_errors_convert_into_domain_errors() {
        let error = DomainError::from(ValidationError::QuantityMissing);
        assert!(matches!(error, DomainError::Validation(ValidationError::QuantityMissing)));
    }
}
