use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::article::{Article, ArticleId};
use crate::domain::client::ClientId;
use crate::domain::quote::{QuoteId, QuoteLine, QuoteStatus};
use crate::errors::{DomainError, ValidationError};
use crate::financing::{self, FinancingParameters, Scenario, ScenarioFigures};
use crate::pricing::{self, QuoteTotals};

/// Editable in-memory quote, the explicit system of record for an
/// in-progress devis. Every mutation re-validates the lifecycle guard and
/// eagerly recomputes the aggregates before returning, so no caller can
/// observe a line/total mismatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteDraft {
    pub id: Option<QuoteId>,
    pub client_id: Option<ClientId>,
    titre: String,
    description: String,
    /// Raw date input as typed; parsed by [`QuoteDraft::validate_for_save`].
    date: String,
    statut: QuoteStatus,
    lignes: Vec<QuoteLine>,
    totals: QuoteTotals,
    remise: Decimal,
    scenario: Option<Scenario>,
    apport: Decimal,
    #[serde(skip)]
    selected: Vec<ArticleId>,
    #[serde(skip)]
    select_all: bool,
}

impl QuoteDraft {
    pub fn new(client_id: Option<ClientId>) -> Self {
        Self {
            id: None,
            client_id,
            titre: String::new(),
            description: String::new(),
            date: String::new(),
            statut: QuoteStatus::NonSigne,
            lignes: Vec::new(),
            totals: QuoteTotals::default(),
            remise: Decimal::ZERO,
            scenario: None,
            apport: Decimal::ZERO,
            selected: Vec::new(),
            select_all: false,
        }
    }

    pub fn titre(&self) -> &str {
        &self.titre
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn statut(&self) -> QuoteStatus {
        self.statut
    }

    pub fn lignes(&self) -> &[QuoteLine] {
        &self.lignes
    }

    pub fn totals(&self) -> QuoteTotals {
        self.totals
    }

    pub fn remise(&self) -> Decimal {
        self.remise
    }

    pub fn scenario(&self) -> Option<Scenario> {
        self.scenario
    }

    pub fn apport(&self) -> Decimal {
        self.apport
    }

    pub fn selected(&self) -> &[ArticleId] {
        &self.selected
    }

    pub fn select_all(&self) -> bool {
        self.select_all
    }

    fn ensure_editable(&self) -> Result<(), DomainError> {
        if self.statut.is_signed() {
            return Err(DomainError::QuoteSigned);
        }
        Ok(())
    }

    fn ensure_scenario_unlocked(&self) -> Result<(), DomainError> {
        match self.statut {
            QuoteStatus::NonSigne => Ok(()),
            QuoteStatus::EnAttenteSignature | QuoteStatus::Signe => {
                Err(DomainError::ScenarioLocked)
            }
        }
    }

    fn recompute_totals(&mut self) {
        self.totals = pricing::aggregate(&self.lignes);
    }

    fn refresh_select_all(&mut self) {
        self.select_all = self.selected.len() == self.lignes.len() && !self.lignes.is_empty();
    }

    fn line_index(&self, article_id: ArticleId) -> Result<usize, DomainError> {
        self.lignes
            .iter()
            .position(|ligne| ligne.article_id() == article_id)
            .ok_or(DomainError::LineNotFound(article_id))
    }

    pub fn set_title(&mut self, titre: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.titre = titre.into();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.description = description.into();
        Ok(())
    }

    /// Stores the raw date input as typed; parsing happens at save time so a
    /// half-typed value never blocks editing.
    pub fn set_date(&mut self, date: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.date = date.into();
        Ok(())
    }

    /// Adds a catalogue article as a new line. An article can appear on a
    /// quote at most once; callers bump the quantity instead.
    pub fn add_line(&mut self, article: Article, quantite: u32) -> Result<(), DomainError> {
        self.ensure_editable()?;
        if self.lignes.iter().any(|ligne| ligne.article_id() == article.id) {
            return Err(DomainError::DuplicateArticle(article.id));
        }
        let ligne = QuoteLine::new(article, quantite)?;
        self.lignes.push(ligne);
        self.recompute_totals();
        self.refresh_select_all();
        Ok(())
    }

    pub fn set_line_quantity(
        &mut self,
        article_id: ArticleId,
        quantite: u32,
    ) -> Result<(), DomainError> {
        self.ensure_editable()?;
        let index = self.line_index(article_id)?;
        self.lignes[index].set_quantity(quantite)?;
        self.recompute_totals();
        Ok(())
    }

    pub fn set_line_comment(
        &mut self,
        article_id: ArticleId,
        commentaire: impl Into<String>,
    ) -> Result<(), DomainError> {
        self.ensure_editable()?;
        let index = self.line_index(article_id)?;
        self.lignes[index].commentaire = commentaire.into();
        Ok(())
    }

    pub fn remove_line(&mut self, article_id: ArticleId) -> Result<(), DomainError> {
        self.ensure_editable()?;
        let index = self.line_index(article_id)?;
        self.lignes.remove(index);
        self.selected.retain(|id| *id != article_id);
        self.recompute_totals();
        self.refresh_select_all();
        Ok(())
    }

    /// Bulk VAT reassignment over the current selection. An empty selection
    /// is a no-op. HT amounts are untouched (rate does not affect HT); the
    /// selection is cleared once applied.
    pub fn apply_vat_to_selected(&mut self, taux: Decimal) -> Result<(), DomainError> {
        self.ensure_editable()?;
        if self.selected.is_empty() {
            return Ok(());
        }
        if taux < Decimal::ZERO || taux > Decimal::ONE {
            return Err(ValidationError::RateOutOfRange.into());
        }
        for ligne in &mut self.lignes {
            if self.selected.contains(&ligne.article_id()) {
                ligne.set_rate(taux)?;
            }
        }
        self.recompute_totals();
        self.selected.clear();
        self.select_all = false;
        Ok(())
    }

    pub fn toggle_line_selection(&mut self, article_id: ArticleId) {
        if let Some(position) = self.selected.iter().position(|id| *id == article_id) {
            self.selected.remove(position);
        } else if self.lignes.iter().any(|ligne| ligne.article_id() == article_id) {
            self.selected.push(article_id);
        }
        self.refresh_select_all();
    }

    pub fn toggle_select_all(&mut self) {
        if self.select_all {
            self.selected.clear();
            self.select_all = false;
            return;
        }
        self.selected = self.lignes.iter().map(QuoteLine::article_id).collect();
        self.refresh_select_all();
    }

    /// Selects the payment scenario. Free to switch while the quote is
    /// unsigned; locked once it has been sent for signature.
    pub fn select_scenario(&mut self, scenario: Option<Scenario>) -> Result<(), DomainError> {
        self.ensure_scenario_unlocked()?;
        if scenario == Some(Scenario::LeasingWithoutDownPayment) {
            self.apport = Decimal::ZERO;
        }
        self.scenario = scenario;
        Ok(())
    }

    pub fn set_down_payment(&mut self, apport: Decimal) -> Result<(), DomainError> {
        self.ensure_scenario_unlocked()?;
        if self.scenario == Some(Scenario::LeasingWithoutDownPayment) {
            return Err(DomainError::DownPaymentNotAllowed);
        }
        if apport < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount.into());
        }
        self.apport = apport;
        Ok(())
    }

    pub fn set_remise(&mut self, remise: Decimal) -> Result<(), DomainError> {
        self.ensure_editable()?;
        if remise < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount.into());
        }
        self.remise = remise;
        Ok(())
    }

    /// Figures for the active scenario, recomputed from the current TTC and
    /// parameters on every call. `None` when no scenario is selected.
    pub fn financing_figures(
        &self,
        params: &FinancingParameters,
    ) -> Result<Option<ScenarioFigures>, DomainError> {
        let Some(scenario) = self.scenario else {
            return Ok(None);
        };
        let figures = financing::compute(
            scenario,
            self.totals.montant_ttc,
            params,
            self.remise,
            self.apport,
        )?;
        Ok(Some(figures))
    }

    /// Save-time validation: non-empty title, parseable date, at least one
    /// line. Returns every failing field so they can be corrected
    /// independently, not just the first.
    pub fn validate_for_save(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.titre.trim().is_empty() {
            errors.push(ValidationError::TitleMissing);
        }
        let date = self.date.trim();
        if date.is_empty() {
            errors.push(ValidationError::DateMissing);
        } else if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            errors.push(ValidationError::DateInvalid(date.to_owned()));
        }
        if self.lignes.is_empty() {
            errors.push(ValidationError::NoLines);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Unsigned → pending-signature, triggered by a successful e-signature
    /// dispatch. Locks the scenario and its down payment.
    pub fn dispatch_for_signature(&mut self) -> Result<(), DomainError> {
        self.statut.transition_to(QuoteStatus::EnAttenteSignature)
    }

    /// Explicit mark-as-signed confirmation or signature-completion
    /// callback. Freezes the whole quote.
    pub fn mark_signed(&mut self) -> Result<(), DomainError> {
        self.statut.transition_to(QuoteStatus::Signe)
    }
}
