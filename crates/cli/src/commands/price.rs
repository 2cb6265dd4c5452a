use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use devisio_core::{
    parse_quantity, Article, ArticleId, ClientId, DomainError, FinancingParameters, QuoteDraft,
    QuoteTotals, Scenario, ScenarioFigures, VatRate, VatRateId, ValidationError,
};

use super::CommandResult;

/// Quote fixture as priced offline. Quantities are kept as raw strings so
/// the fixture goes through the same parsing as interactive input.
#[derive(Debug, Deserialize)]
struct QuoteFixture {
    titre: String,
    #[serde(default)]
    description: String,
    date: String,
    #[serde(default)]
    client_id: Option<i64>,
    #[serde(default)]
    remise: Option<Decimal>,
    #[serde(default)]
    scenario: Option<Scenario>,
    #[serde(default)]
    apport: Option<Decimal>,
    #[serde(default)]
    lignes: Vec<LineFixture>,
    #[serde(default)]
    financement: Option<FinancingParameters>,
}

#[derive(Debug, Deserialize)]
struct LineFixture {
    #[serde(default)]
    article_id: Option<i64>,
    nom: String,
    #[serde(rename = "prix_vente_HT")]
    prix_vente_ht: Decimal,
    quantite: String,
    #[serde(default)]
    taux_tva: Option<Decimal>,
    #[serde(default)]
    commentaire: Option<String>,
}

#[derive(Debug, Serialize)]
struct PriceReport {
    command: &'static str,
    status: &'static str,
    titre: String,
    date: String,
    statut: String,
    totaux: QuoteTotals,
    remise: Decimal,
    scenario: Option<Scenario>,
    financement: Option<ScenarioFigures>,
}

pub fn run(file: &Path) -> CommandResult {
    let raw = match fs::read_to_string(file) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "price",
                "fixture_read",
                format!("could not read `{}`: {error}", file.display()),
                2,
            );
        }
    };

    let fixture: QuoteFixture = match toml::from_str(&raw) {
        Ok(fixture) => fixture,
        Err(error) => {
            return CommandResult::failure(
                "price",
                "fixture_parse",
                format!("could not parse `{}`: {error}", file.display()),
                2,
            );
        }
    };

    match price_fixture(fixture) {
        Ok(report) => {
            let output = serde_json::to_string_pretty(&report)
                .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
            CommandResult { exit_code: 0, output }
        }
        Err(failure) => failure,
    }
}

fn price_fixture(fixture: QuoteFixture) -> Result<PriceReport, CommandResult> {
    let mut draft = QuoteDraft::new(fixture.client_id.map(ClientId));
    draft.set_title(fixture.titre).map_err(domain_failure)?;
    draft.set_description(fixture.description).map_err(domain_failure)?;
    draft.set_date(fixture.date).map_err(domain_failure)?;

    for (index, ligne) in fixture.lignes.into_iter().enumerate() {
        let quantite = parse_quantity(&ligne.quantite).map_err(validation_failure)?;
        let article = Article {
            id: ArticleId(ligne.article_id.unwrap_or(index as i64 + 1)),
            nom: ligne.nom,
            description: String::new(),
            prix_achat_ht: Decimal::ZERO,
            prix_vente_ht: ligne.prix_vente_ht,
            taux_tva: ligne.taux_tva.map(|taux| VatRate { id: VatRateId(0), taux }),
        };
        let article_id = article.id;
        draft.add_line(article, quantite).map_err(domain_failure)?;
        if let Some(commentaire) = ligne.commentaire {
            draft.set_line_comment(article_id, commentaire).map_err(domain_failure)?;
        }
    }

    if let Some(remise) = fixture.remise {
        draft.set_remise(remise).map_err(domain_failure)?;
    }
    draft.select_scenario(fixture.scenario).map_err(domain_failure)?;
    if let Some(apport) = fixture.apport {
        draft.set_down_payment(apport).map_err(domain_failure)?;
    }

    if let Err(errors) = draft.validate_for_save() {
        let messages: Vec<&str> = errors.iter().map(ValidationError::user_message).collect();
        return Err(CommandResult::failure("price", "validation", messages.join("\n"), 2));
    }

    let financement = match (draft.scenario(), &fixture.financement) {
        (None, _) => None,
        (Some(_), Some(params)) => draft.financing_figures(params).map_err(domain_failure)?,
        (Some(scenario), None) => {
            return Err(CommandResult::failure(
                "price",
                "missing_parameters",
                format!(
                    "scenario `{}` needs a [financement] table with the company parameters",
                    scenario.as_query_param()
                ),
                2,
            ));
        }
    };

    Ok(PriceReport {
        command: "price",
        status: "ok",
        titre: draft.titre().to_owned(),
        date: draft.date().to_owned(),
        statut: draft.statut().to_string(),
        totaux: draft.totals(),
        remise: draft.remise(),
        scenario: draft.scenario(),
        financement,
    })
}

fn validation_failure(error: ValidationError) -> CommandResult {
    CommandResult::failure("price", "validation", error.user_message(), 2)
}

fn domain_failure(error: DomainError) -> CommandResult {
    match error {
        DomainError::Validation(validation) => validation_failure(validation),
        other => CommandResult::failure("price", "domain_rule", other.to_string(), 2),
    }
}
