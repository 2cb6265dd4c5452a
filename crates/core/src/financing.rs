use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::money::{round2, STANDARD_VAT_RATE};

/// Payment scenario for a quote. Exactly one is active per quote; the three
/// variants are mutually exclusive and matched exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Direct,
    LeasingWithoutDownPayment,
    LeasingWithDownPayment,
}

impl Scenario {
    pub fn is_leasing(self) -> bool {
        !matches!(self, Self::Direct)
    }

    /// Value used as the `scenario` query parameter of the PDF endpoint.
    pub fn as_query_param(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::LeasingWithoutDownPayment => "leasing_without_down_payment",
            Self::LeasingWithDownPayment => "leasing_with_down_payment",
        }
    }
}

/// Company-wide financing parameters, administered globally and read-only
/// from the engine. Wire names match the backend admin endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingParameters {
    #[serde(rename = "marginRate")]
    pub taux_marge: Decimal,
    #[serde(rename = "marginRateLocation")]
    pub taux_marge_location: Decimal,
    #[serde(rename = "locationTime")]
    pub duree_mois: u32,
    #[serde(rename = "locationSubscriptionCost")]
    pub cout_abonnement: Decimal,
    #[serde(rename = "locationInterestsCost")]
    pub cout_interets: Decimal,
}

/// Derived leasing figures. `base_ht` keeps the historical "HT" label even
/// though its main input is the quote TTC; renaming it would break the
/// stored backend columns (see DESIGN.md).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeasingFigures {
    pub base_ht: Decimal,
    pub total_ttc: Decimal,
    pub mensuel_ht: Decimal,
    pub mensuel_ttc: Decimal,
}

/// Output of the scenario engine for whichever scenario is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum ScenarioFigures {
    Direct { total_apres_remise: Decimal },
    Leasing(LeasingFigures),
}

/// Direct payment: quote TTC minus an optional manual discount, clamped so
/// the displayed total never goes negative.
pub fn direct_total(quote_ttc: Decimal, remise: Decimal) -> Result<Decimal, ValidationError> {
    if remise < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount);
    }
    Ok(round2((quote_ttc - remise).max(Decimal::ZERO)))
}

/// Leasing amortization over the company-configured term. A zero-month term
/// yields zero monthly figures rather than a division fault.
pub fn leasing_figures(
    quote_ttc: Decimal,
    params: &FinancingParameters,
    apport: Decimal,
) -> Result<LeasingFigures, ValidationError> {
    if apport < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount);
    }

    let base = quote_ttc + params.cout_abonnement + params.cout_interets - apport;
    let total = base * (Decimal::ONE + STANDARD_VAT_RATE);

    let (mensuel_ht, mensuel_ttc) = if params.duree_mois == 0 {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let duree = Decimal::from(params.duree_mois);
        (round2(base / duree), round2(total / duree))
    };

    Ok(LeasingFigures { base_ht: round2(base), total_ttc: round2(total), mensuel_ht, mensuel_ttc })
}

/// Computes the figures for the active scenario from current inputs. Nothing
/// is cached: every call recomputes from the quote TTC and parameters so a
/// stale derived value can never be observed.
pub fn compute(
    scenario: Scenario,
    quote_ttc: Decimal,
    params: &FinancingParameters,
    remise: Decimal,
    apport: Decimal,
) -> Result<ScenarioFigures, ValidationError> {
    match scenario {
        Scenario::Direct => {
            direct_total(quote_ttc, remise).map(|total_apres_remise| ScenarioFigures::Direct {
                total_apres_remise,
            })
        }
        Scenario::LeasingWithoutDownPayment => {
            leasing_figures(quote_ttc, params, Decimal::ZERO).map(ScenarioFigures::Leasing)
        }
        Scenario::LeasingWithDownPayment => {
            leasing_figures(quote_ttc, params, apport).map(ScenarioFigures::Leasing)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use crate::errors::ValidationError;

    use super::{compute, direct_total, leasing_figures, FinancingParameters, Scenario, ScenarioFigures};

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).expect("valid decimal literal")
    }

    fn params(duree_mois: u32) -> FinancingParameters {
        FinancingParameters {
            taux_marge: dec("1.30"),
            taux_marge_location: dec("1.45"),
            duree_mois,
            cout_abonnement: dec("50"),
            cout_interets: dec("30"),
        }
    }

    #[test]
    fn reference_leasing_example() {
        let figures = leasing_figures(dec("1000.00"), &params(24), dec("200")).expect("valid");
        assert_eq!(figures.base_ht, dec("880.00"));
        assert_eq!(figures.total_ttc, dec("1056.00"));
        assert_eq!(figures.mensuel_ht, dec("36.67"));
        assert_eq!(figures.mensuel_ttc, dec("44.00"));
    }

    #[test]
    fn zero_term_yields_zero_monthly_figures() {
        let figures = leasing_figures(dec("1000.00"), &params(0), Decimal::ZERO).expect("valid");
        assert_eq!(figures.mensuel_ht, Decimal::ZERO);
        assert_eq!(figures.mensuel_ttc, Decimal::ZERO);
        assert_eq!(figures.base_ht, dec("1080.00"));
    }

    #[test]
    fn direct_discount_is_clamped_to_zero() {
        assert_eq!(direct_total(dec("500.00"), dec("600.00")).expect("valid"), dec("0.00"));
        assert_eq!(direct_total(dec("500.00"), dec("99.50")).expect("valid"), dec("400.50"));
    }

    #[test]
    fn negative_discount_and_down_payment_are_rejected() {
        assert!(matches!(
            direct_total(dec("500.00"), dec("-1")),
            Err(ValidationError::NegativeAmount)
        ));
        assert!(matches!(
            leasing_figures(dec("500.00"), &params(24), dec("-1")),
            Err(ValidationError::NegativeAmount)
        ));
    }

    #[test]
    fn leasing_without_down_payment_ignores_the_stored_apport() {
        let with_apport =
            compute(Scenario::LeasingWithoutDownPayment, dec("1000.00"), &params(24), Decimal::ZERO, dec("200"))
                .expect("valid");
        let ScenarioFigures::Leasing(figures) = with_apport else {
            panic!("leasing scenario must yield leasing figures");
        };
        assert_eq!(figures.base_ht, dec("1080.00"));
    }

    #[test]
    fn scenario_switching_is_free_before_lock_in() {
        let p = params(24);
        let before = compute(Scenario::Direct, dec("1000.00"), &p, dec("50"), Decimal::ZERO)
            .expect("direct");
        let _ = compute(Scenario::LeasingWithDownPayment, dec("1000.00"), &p, dec("50"), dec("200"))
            .expect("leasing");
        let after = compute(Scenario::Direct, dec("1000.00"), &p, dec("50"), Decimal::ZERO)
            .expect("direct again");
        assert_eq!(before, after);
    }

    #[test]
    fn scenario_query_params_are_stable() {
        assert_eq!(Scenario::Direct.as_query_param(), "direct");
        assert_eq!(
            Scenario::LeasingWithDownPayment.as_query_param(),
            "leasing_with_down_payment"
        );
        assert!(Scenario::LeasingWithoutDownPayment.is_leasing());
        assert!(!Scenario::Direct.is_leasing());
    }
}
