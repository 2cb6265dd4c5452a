use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleId(pub i64);

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VatRateId(pub i64);

/// Globally administered VAT rate. Quote lines snapshot the `taux` value at
/// the time they are added or re-rated; they never hold the id by reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VatRate {
    pub id: VatRateId,
    pub taux: Decimal,
}

/// Catalogue article, read-only from the engine's perspective. Wire field
/// names match the backend schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub nom: String,
    pub description: String,
    #[serde(rename = "prix_achat_HT")]
    pub prix_achat_ht: Decimal,
    #[serde(rename = "prix_vente_HT")]
    pub prix_vente_ht: Decimal,
    #[serde(default)]
    pub taux_tva: Option<VatRate>,
}
