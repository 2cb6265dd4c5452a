use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::article::{Article, ArticleId};
use crate::domain::client::ClientId;
use crate::errors::{DomainError, ValidationError};
use crate::financing::{LeasingFigures, Scenario};
use crate::money::{round2, STANDARD_VAT_RATE};
use crate::pricing;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub i64);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quote lifecycle. Forward-only: once a quote is signed there is no way
/// back, and the commercial content is frozen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteStatus {
    #[serde(rename = "Non signé")]
    NonSigne,
    #[serde(rename = "En attente de signature")]
    EnAttenteSignature,
    #[serde(rename = "Signé")]
    Signe,
}

impl QuoteStatus {
    pub fn is_signed(self) -> bool {
        self == Self::Signe
    }

    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        matches!(
            (self, next),
            (Self::NonSigne, Self::EnAttenteSignature)
                | (Self::NonSigne, Self::Signe)
                | (Self::EnAttenteSignature, Self::Signe)
        )
    }

    pub fn transition_to(&mut self, next: QuoteStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            *self = next;
            return Ok(());
        }
        Err(DomainError::InvalidTransition { from: *self, to: next })
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NonSigne => "Non signé",
            Self::EnAttenteSignature => "En attente de signature",
            Self::Signe => "Signé",
        };
        f.write_str(label)
    }
}

/// One priced line of a quote. The VAT rate is a value snapshot taken when
/// the line is added or re-rated, so later administration of the global rate
/// table does not silently change existing quotes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub article: Article,
    pub quantite: u32,
    pub taux_tva: Decimal,
    #[serde(rename = "montant_HT")]
    pub montant_ht: Decimal,
    #[serde(rename = "montant_TVA")]
    pub montant_tva: Decimal,
    #[serde(rename = "montant_TTC")]
    pub montant_ttc: Decimal,
    #[serde(default)]
    pub commentaire: String,
}

impl QuoteLine {
    /// Builds a line from a catalogue article, snapshotting its VAT rate
    /// (standard rate when the article carries none).
    pub fn new(article: Article, quantite: u32) -> Result<Self, ValidationError> {
        let taux = article.taux_tva.as_ref().map(|rate| rate.taux).unwrap_or(STANDARD_VAT_RATE);
        let totals = pricing::line_totals(article.prix_vente_ht, quantite, taux)?;
        Ok(Self {
            article,
            quantite,
            taux_tva: taux,
            montant_ht: totals.montant_ht,
            montant_tva: totals.montant_tva,
            montant_ttc: totals.montant_ttc,
            commentaire: String::new(),
        })
    }

    pub fn article_id(&self) -> ArticleId {
        self.article.id
    }

    pub fn set_quantity(&mut self, quantite: u32) -> Result<(), ValidationError> {
        let totals = pricing::line_totals(self.article.prix_vente_ht, quantite, self.taux_tva)?;
        self.quantite = quantite;
        self.montant_ht = totals.montant_ht;
        self.montant_tva = totals.montant_tva;
        self.montant_ttc = totals.montant_ttc;
        Ok(())
    }

    pub fn set_rate(&mut self, taux: Decimal) -> Result<(), ValidationError> {
        let totals = pricing::line_totals(self.article.prix_vente_ht, self.quantite, taux)?;
        self.taux_tva = taux;
        self.montant_tva = totals.montant_tva;
        self.montant_ttc = totals.montant_ttc;
        Ok(())
    }
}

/// Persisted quote as exchanged with the backend. The editable in-memory
/// form lives in [`crate::draft::QuoteDraft`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub client_id: ClientId,
    pub titre: String,
    pub description: String,
    pub date: NaiveDate,
    #[serde(rename = "montant_HT")]
    pub montant_ht: Decimal,
    #[serde(rename = "montant_TVA")]
    pub montant_tva: Decimal,
    #[serde(rename = "montant_TTC")]
    pub montant_ttc: Decimal,
    #[serde(default)]
    pub remise: Decimal,
    pub statut: QuoteStatus,
    #[serde(default)]
    pub scenario: Option<Scenario>,
    #[serde(default)]
    pub is_location: bool,
    #[serde(default, rename = "first_contribution_amount")]
    pub apport: Option<Decimal>,
    #[serde(default)]
    pub location_monthly_total_ht: Option<Decimal>,
    #[serde(default)]
    pub location_monthly_total: Option<Decimal>,
    #[serde(default)]
    pub location_total_ht: Option<Decimal>,
    #[serde(default)]
    pub location_total: Option<Decimal>,
    #[serde(default)]
    pub lignes: Vec<QuoteLine>,
}

impl Quote {
    /// Stored leasing figures, present when the quote was saved with a
    /// leasing scenario active.
    pub fn leasing_figures(&self) -> Option<LeasingFigures> {
        if !self.is_location {
            return None;
        }
        Some(LeasingFigures {
            base_ht: self.location_total_ht?,
            total_ttc: self.location_total?,
            mensuel_ht: self.location_monthly_total_ht?,
            mensuel_ttc: self.location_monthly_total?,
        })
    }

    /// Checks the aggregate invariant: stored totals must equal the rounded
    /// sums of the per-line rounded values.
    pub fn totals_consistent(&self) -> bool {
        let totals = pricing::aggregate(&self.lignes);
        round2(self.montant_ht) == totals.montant_ht
            && round2(self.montant_tva) == totals.montant_tva
            && round2(self.montant_ttc) == totals.montant_ttc
    }
}
