pub mod config;
pub mod domain;
pub mod draft;
pub mod errors;
pub mod financing;
pub mod money;
pub mod pricing;

pub use config::{
    AppConfig, BackendConfig, ConfigError, ConfigOverrides, EsignConfig, LoadOptions, LogFormat,
    LoggingConfig,
};
pub use domain::article::{Article, ArticleId, VatRate, VatRateId};
pub use domain::client::{Client, ClientId};
pub use domain::quote::{Quote, QuoteId, QuoteLine, QuoteStatus};
pub use draft::QuoteDraft;
pub use errors::{ApplicationError, DomainError, ValidationError};
pub use financing::{FinancingParameters, LeasingFigures, Scenario, ScenarioFigures};
pub use money::{round2, STANDARD_VAT_RATE};
pub use pricing::{aggregate, line_totals, parse_quantity, LineTotals, QuoteTotals};
