use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{monthly_payment, LoanTerms};
use crate::error::MortgageCalcError;
use crate::types::*;
use crate::MortgageCalcResult;

/// Temporary buydown structure. Each step is the rate reduction for one
/// year, in points below the note rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuydownType {
    /// 3%, 2%, 1% below the note rate in years 1 to 3
    ThreeTwoOne,
    /// 2%, 1% below the note rate in years 1 and 2
    TwoOne,
    /// 1% below the note rate in year 1
    OneZero,
    Custom(Vec<Percent>),
}

impl BuydownType {
    pub fn reductions(&self) -> Vec<Percent> {
        match self {
            BuydownType::ThreeTwoOne => vec![dec!(3), dec!(2), dec!(1)],
            BuydownType::TwoOne => vec![dec!(2), dec!(1)],
            BuydownType::OneZero => vec![dec!(1)],
            BuydownType::Custom(steps) => steps.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuydownInput {
    #[serde(flatten)]
    pub loan: LoanTerms,
    pub buydown: BuydownType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuydownYear {
    pub year: u32,
    pub effective_rate_percent: Percent,
    pub monthly_payment: Money,
    pub monthly_savings: Money,
    pub annual_savings: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuydownOutput {
    pub note_rate_payment: Money,
    pub years: Vec<BuydownYear>,
    /// Escrowed subsidy that funds the reduced payments
    pub total_subsidy: Money,
    pub subsidy_percent_of_loan: Percent,
    /// Jump from the first-year payment to the full note-rate payment
    pub payment_increase_at_note_rate: Money,
}

/// Payments and subsidy cost of a temporary rate buydown. The loan
/// amortizes at the note rate throughout; the subsidy covers the
/// difference in each bought-down year.
pub fn analyze_buydown(input: &BuydownInput) -> MortgageCalcResult<ComputationOutput<BuydownOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.loan.validate()?;
    let reductions = input.buydown.reductions();
    if reductions.is_empty() {
        return Err(MortgageCalcError::InvalidInput {
            field: "buydown".into(),
            reason: "Custom buydown needs at least one year".into(),
        });
    }
    if reductions.len() as u32 > input.loan.term_years {
        return Err(MortgageCalcError::InvalidInput {
            field: "buydown".into(),
            reason: "Buydown cannot run longer than the loan term".into(),
        });
    }
    if reductions.iter().any(|r| *r < Decimal::ZERO) {
        return Err(MortgageCalcError::InvalidInput {
            field: "buydown".into(),
            reason: "Rate reductions cannot be negative".into(),
        });
    }

    let note_rate_payment = monthly_payment(&input.loan)?;

    let mut years = Vec::with_capacity(reductions.len());
    for (i, reduction) in reductions.iter().enumerate() {
        let mut effective = input.loan.annual_rate_percent - *reduction;
        if effective < Decimal::ZERO {
            warnings.push(format!("Year {} reduction exceeds the note rate; floored at 0%", i + 1));
            effective = Decimal::ZERO;
        }
        let payment = monthly_payment(&LoanTerms {
            annual_rate_percent: effective,
            ..input.loan.clone()
        })?;
        let monthly_savings = note_rate_payment - payment;
        years.push(BuydownYear {
            year: i as u32 + 1,
            effective_rate_percent: effective,
            monthly_payment: payment,
            monthly_savings,
            annual_savings: monthly_savings * dec!(12),
        });
    }

    let total_subsidy: Money = years.iter().map(|y| y.annual_savings).sum();
    let payment_increase_at_note_rate = years
        .first()
        .map(|y| note_rate_payment - y.monthly_payment)
        .unwrap_or(Decimal::ZERO);

    let output = BuydownOutput {
        note_rate_payment,
        years,
        total_subsidy,
        subsidy_percent_of_loan: total_subsidy / input.loan.principal * dec!(100),
        payment_increase_at_note_rate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Temporary buydown: reduced-rate payments on the full term, subsidy = sum of payment differences",
        &serde_json::json!({
            "note_rate_percent": input.loan.annual_rate_percent.to_string(),
            "buydown_years": reductions.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(buydown: BuydownType) -> BuydownInput {
        BuydownInput {
            loan: LoanTerms::new(dec!(400000), dec!(7), 30),
            buydown,
        }
    }

    #[test]
    fn test_two_one_subsidy() {
        let out = analyze_buydown(&input(BuydownType::TwoOne)).unwrap().result;
        assert_eq!(out.years.len(), 2);
        assert_eq!(out.years[0].effective_rate_percent, dec!(5));
        assert_eq!(out.years[1].effective_rate_percent, dec!(6));
        // 12 * (2661.21 - 2147.29) + 12 * (2661.21 - 2398.20)
        assert!((out.total_subsidy - dec!(9323.16)).abs() < dec!(2));
        assert!((out.payment_increase_at_note_rate - dec!(513.92)).abs() < dec!(0.05));
    }

    #[test]
    fn test_three_two_one_costs_more_than_two_one() {
        let three = analyze_buydown(&input(BuydownType::ThreeTwoOne)).unwrap().result;
        let two = analyze_buydown(&input(BuydownType::TwoOne)).unwrap().result;
        assert_eq!(three.years.len(), 3);
        assert!(three.total_subsidy > two.total_subsidy);
    }

    #[test]
    fn test_custom_floor_at_zero() {
        let out = analyze_buydown(&input(BuydownType::Custom(vec![dec!(8)]))).unwrap();
        assert_eq!(out.result.years[0].effective_rate_percent, Decimal::ZERO);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_empty_custom_rejected() {
        assert!(analyze_buydown(&input(BuydownType::Custom(vec![]))).is_err());
    }

    #[test]
    fn test_deserializes_named_and_custom() {
        let named: BuydownType = serde_json::from_str("\"two_one\"").unwrap();
        assert_eq!(named, BuydownType::TwoOne);
        let custom: BuydownType = serde_json::from_str("{\"custom\":[\"1.5\",\"0.5\"]}").unwrap();
        assert_eq!(custom.reductions(), vec![dec!(1.5), dec!(0.5)]);
    }
}
