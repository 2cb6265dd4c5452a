use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::QuoteLine;
use crate::errors::ValidationError;
use crate::money::round2;

/// Computed amounts for a single quote line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    pub montant_ht: Decimal,
    pub montant_tva: Decimal,
    pub montant_ttc: Decimal,
}

/// Quote-level aggregates. Always recomputed from the full line sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTotals {
    pub montant_ht: Decimal,
    pub montant_tva: Decimal,
    pub montant_ttc: Decimal,
}

/// Parses a raw quantity input, distinguishing a blank field from an invalid
/// value so the two cases surface different messages. Never clamps.
pub fn parse_quantity(raw: &str) -> Result<u32, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::QuantityMissing);
    }
    match trimmed.parse::<i64>() {
        Ok(quantity) if quantity > 0 => {
            u32::try_from(quantity).map_err(|_| ValidationError::QuantityInvalid(trimmed.to_owned()))
        }
        _ => Err(ValidationError::QuantityInvalid(trimmed.to_owned())),
    }
}

/// Computes HT/TVA/TTC for one line. Pure; the caller persists the result
/// onto the quote line.
pub fn line_totals(
    prix_vente_ht: Decimal,
    quantite: u32,
    taux: Decimal,
) -> Result<LineTotals, ValidationError> {
    if prix_vente_ht < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount);
    }
    if quantite == 0 {
        return Err(ValidationError::QuantityInvalid("0".to_owned()));
    }
    if taux < Decimal::ZERO || taux > Decimal::ONE {
        return Err(ValidationError::RateOutOfRange);
    }

    let brut = prix_vente_ht * Decimal::from(quantite);
    Ok(LineTotals {
        montant_ht: round2(brut),
        montant_tva: round2(brut * taux),
        montant_ttc: round2(brut * (Decimal::ONE + taux)),
    })
}

/// Sums per-line rounded amounts into quote totals. The sums are taken over
/// the already-rounded line values so the displayed lines always add up, at
/// the cost of penny-level aggregate precision.
pub fn aggregate(lignes: &[QuoteLine]) -> QuoteTotals {
    let mut totals = QuoteTotals::default();
    for ligne in lignes {
        totals.montant_ht += ligne.montant_ht;
        totals.montant_tva += ligne.montant_tva;
        totals.montant_ttc += ligne.montant_ttc;
    }
    QuoteTotals {
        montant_ht: round2(totals.montant_ht),
        montant_tva: round2(totals.montant_tva),
        montant_ttc: round2(totals.montant_ttc),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use crate::domain::article::{Article, ArticleId, VatRate, VatRateId};
    use crate::domain::quote::QuoteLine;
    use crate::errors::ValidationError;

    use super::{aggregate, line_totals, parse_quantity};

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).expect("valid decimal literal")
    }

    fn line(prix_vente_ht: &str, quantite: u32, taux: &str) -> QuoteLine {
        let article = Article {
            id: ArticleId(i64::from(quantite)),
            nom: "Alarme".to_owned(),
            description: "Centrale d'alarme".to_owned(),
            prix_achat_ht: dec("10.00"),
            prix_vente_ht: dec(prix_vente_ht),
            taux_tva: Some(VatRate { id: VatRateId(1), taux: dec(taux) }),
        };
        QuoteLine::new(article, quantite).expect("valid line")
    }

    #[test]
    fn reference_line_example() {
        let totals = line_totals(dec("100.00"), 3, dec("0.20")).expect("valid inputs");
        assert_eq!(totals.montant_ht, dec("300.00"));
        assert_eq!(totals.montant_tva, dec("60.00"));
        assert_eq!(totals.montant_ttc, dec("360.00"));
    }

    #[test]
    fn each_amount_is_rounded_independently() {
        let totals = line_totals(dec("33.33"), 1, dec("0.10")).expect("valid inputs");
        assert_eq!(totals.montant_ht, dec("33.33"));
        assert_eq!(totals.montant_tva, dec("3.33"));
        assert_eq!(totals.montant_ttc, dec("36.66"));
        assert_eq!(totals.montant_ttc, totals.montant_ht + totals.montant_tva);
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        assert!(matches!(
            line_totals(dec("-1.00"), 1, dec("0.20")),
            Err(ValidationError::NegativeAmount)
        ));
        assert!(matches!(
            line_totals(dec("1.00"), 0, dec("0.20")),
            Err(ValidationError::QuantityInvalid(_))
        ));
        assert!(matches!(
            line_totals(dec("1.00"), 1, dec("1.50")),
            Err(ValidationError::RateOutOfRange)
        ));
    }

    #[test]
    fn quantity_parse_distinguishes_missing_from_invalid() {
        assert!(matches!(parse_quantity("  "), Err(ValidationError::QuantityMissing)));
        assert!(matches!(parse_quantity("abc"), Err(ValidationError::QuantityInvalid(_))));
        assert!(matches!(parse_quantity("0"), Err(ValidationError::QuantityInvalid(_))));
        assert!(matches!(parse_quantity("-4"), Err(ValidationError::QuantityInvalid(_))));
        assert_eq!(parse_quantity(" 12 ").expect("valid"), 12);
    }

    #[test]
    fn totals_sum_already_rounded_line_values() {
        let lines = vec![line("100.00", 3, "0.20"), line("49.99", 1, "0.20")];
        let totals = aggregate(&lines);
        assert_eq!(totals.montant_ht, dec("349.99"));
        assert_eq!(totals.montant_tva, dec("70.00"));
        assert_eq!(totals.montant_ttc, dec("419.99"));
    }

    #[test]
    fn empty_line_sequence_yields_zero_totals() {
        let totals = aggregate(&[]);
        assert_eq!(totals.montant_ht, Decimal::ZERO);
        assert_eq!(totals.montant_tva, Decimal::ZERO);
        assert_eq!(totals.montant_ttc, Decimal::ZERO);
    }

    #[test]
    fn recomputing_totals_is_idempotent() {
        let lines = vec![line("33.33", 7, "0.10"), line("0.01", 1, "0.20")];
        let first = aggregate(&lines);
        let second = aggregate(&lines);
        assert_eq!(first, second);
    }
}
