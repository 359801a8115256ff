use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{monthly_payment, principal_for_payment, LoanTerms};
use crate::error::MortgageCalcError;
use crate::types::*;
use crate::MortgageCalcResult;

/// A recurring monthly debt other than the proposed mortgage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtObligation {
    pub name: String,
    pub monthly_payment: Money,
}

/// Input for debt-to-income analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtiInput {
    pub gross_monthly_income: Money,
    /// Proposed mortgage; principal and interest are derived from it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan: Option<LoanTerms>,
    /// Principal and interest when no loan terms are given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_and_interest: Option<Money>,
    #[serde(default)]
    pub monthly_property_tax: Money,
    #[serde(default)]
    pub monthly_insurance: Money,
    #[serde(default)]
    pub monthly_hoa: Money,
    #[serde(default)]
    pub monthly_pmi: Money,
    #[serde(default)]
    pub other_debts: Vec<DebtObligation>,
    #[serde(default = "default_front_end_limit")]
    pub front_end_limit_percent: Percent,
    #[serde(default = "default_back_end_limit")]
    pub back_end_limit_percent: Percent,
    #[serde(default = "default_qm_limit")]
    pub qualified_mortgage_limit_percent: Percent,
}

fn default_front_end_limit() -> Percent {
    dec!(28)
}

fn default_back_end_limit() -> Percent {
    dec!(36)
}

fn default_qm_limit() -> Percent {
    dec!(43)
}

/// Where a ratio sits against underwriting limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtiStatus {
    WithinGuideline,
    AboveGuideline,
    AboveQualifiedMortgageLimit,
}

/// Output of debt-to-income analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtiOutput {
    pub principal_and_interest: Money,
    pub total_housing_payment: Money,
    pub total_other_debt: Money,
    pub total_monthly_debt: Money,
    pub front_end_ratio_percent: Decimal,
    pub back_end_ratio_percent: Decimal,
    pub front_end_status: DtiStatus,
    pub back_end_status: DtiStatus,
    /// Largest housing payment both ratios allow
    pub max_housing_payment: Money,
    pub max_principal_and_interest: Money,
    /// Loan size the allowed P&I supports at the proposed rate and term
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_loan_amount: Option<Money>,
    /// Allowed housing payment minus the proposed one (negative = over)
    pub housing_headroom: Money,
}

/// Front-end and back-end debt-to-income ratios plus affordability limits.
pub fn calculate_dti(input: &DtiInput) -> MortgageCalcResult<ComputationOutput<DtiOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let principal_and_interest = match (&input.loan, input.principal_and_interest) {
        (Some(loan), explicit) => {
            if explicit.is_some() {
                warnings.push("Both loan terms and principal_and_interest given; using loan terms".into());
            }
            monthly_payment(loan)?
        }
        (None, Some(pi)) => pi,
        (None, None) => {
            return Err(MortgageCalcError::InvalidInput {
                field: "loan".into(),
                reason: "Provide loan terms or principal_and_interest".into(),
            });
        }
    };

    let escrow = input.monthly_property_tax + input.monthly_insurance + input.monthly_hoa + input.monthly_pmi;
    let total_housing_payment = principal_and_interest + escrow;
    let total_other_debt: Money = input.other_debts.iter().map(|d| d.monthly_payment).sum();
    let total_monthly_debt = total_housing_payment + total_other_debt;

    let income = input.gross_monthly_income;
    let front_end_ratio_percent = total_housing_payment / income * dec!(100);
    let back_end_ratio_percent = total_monthly_debt / income * dec!(100);

    let front_end_status = classify(
        front_end_ratio_percent,
        input.front_end_limit_percent,
        input.qualified_mortgage_limit_percent,
    );
    let back_end_status = classify(
        back_end_ratio_percent,
        input.back_end_limit_percent,
        input.qualified_mortgage_limit_percent,
    );
    if back_end_status == DtiStatus::AboveQualifiedMortgageLimit {
        warnings.push(format!(
            "Back-end DTI {back_end_ratio_percent:.2}% exceeds the {}% qualified mortgage limit",
            input.qualified_mortgage_limit_percent
        ));
    }

    let front_cap = income * input.front_end_limit_percent / dec!(100);
    let back_cap = income * input.back_end_limit_percent / dec!(100) - total_other_debt;
    let max_housing_payment = front_cap.min(back_cap).max(Decimal::ZERO);
    let max_principal_and_interest = (max_housing_payment - escrow).max(Decimal::ZERO);
    if max_principal_and_interest.is_zero() {
        warnings.push("Existing debts and escrow leave no room for principal and interest".into());
    }

    let max_loan_amount = match &input.loan {
        Some(loan) => Some(principal_for_payment(
            max_principal_and_interest,
            loan.monthly_rate(),
            loan.term_months(),
        )?),
        None => None,
    };

    let output = DtiOutput {
        principal_and_interest,
        total_housing_payment,
        total_other_debt,
        total_monthly_debt,
        front_end_ratio_percent,
        back_end_ratio_percent,
        front_end_status,
        back_end_status,
        max_housing_payment,
        max_principal_and_interest,
        max_loan_amount,
        housing_headroom: max_housing_payment - total_housing_payment,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Debt-to-income ratios (front-end housing, back-end total debt)",
        &serde_json::json!({
            "front_end_limit_percent": input.front_end_limit_percent.to_string(),
            "back_end_limit_percent": input.back_end_limit_percent.to_string(),
            "qualified_mortgage_limit_percent": input.qualified_mortgage_limit_percent.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn classify(ratio: Decimal, guideline: Percent, qm_limit: Percent) -> DtiStatus {
    if ratio > qm_limit {
        DtiStatus::AboveQualifiedMortgageLimit
    } else if ratio > guideline {
        DtiStatus::AboveGuideline
    } else {
        DtiStatus::WithinGuideline
    }
}

fn validate_input(input: &DtiInput) -> MortgageCalcResult<()> {
    if input.gross_monthly_income <= Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "gross_monthly_income".into(),
            reason: "Income must be positive".into(),
        });
    }
    if let Some(pi) = input.principal_and_interest {
        if pi < Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: "principal_and_interest".into(),
                reason: "Payment cannot be negative".into(),
            });
        }
    }
    for (field, value) in [
        ("monthly_property_tax", input.monthly_property_tax),
        ("monthly_insurance", input.monthly_insurance),
        ("monthly_hoa", input.monthly_hoa),
        ("monthly_pmi", input.monthly_pmi),
    ] {
        if value < Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: field.into(),
                reason: "Monthly cost cannot be negative".into(),
            });
        }
    }
    if let Some(debt) = input.other_debts.iter().find(|d| d.monthly_payment < Decimal::ZERO) {
        return Err(MortgageCalcError::InvalidInput {
            field: format!("other_debts:{}", debt.name),
            reason: "Debt payment cannot be negative".into(),
        });
    }
    if input.front_end_limit_percent <= Decimal::ZERO || input.back_end_limit_percent <= Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "limit_percent".into(),
            reason: "DTI limits must be positive".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> DtiInput {
        DtiInput {
            gross_monthly_income: dec!(10000),
            loan: None,
            principal_and_interest: Some(dec!(2000)),
            monthly_property_tax: dec!(300),
            monthly_insurance: dec!(100),
            monthly_hoa: Decimal::ZERO,
            monthly_pmi: Decimal::ZERO,
            other_debts: vec![
                DebtObligation { name: "Car".into(), monthly_payment: dec!(400) },
                DebtObligation { name: "Student loan".into(), monthly_payment: dec!(300) },
            ],
            front_end_limit_percent: dec!(28),
            back_end_limit_percent: dec!(36),
            qualified_mortgage_limit_percent: dec!(43),
        }
    }

    #[test]
    fn test_ratios() {
        let out = calculate_dti(&sample_input()).unwrap().result;
        assert_eq!(out.total_housing_payment, dec!(2400));
        assert_eq!(out.front_end_ratio_percent, dec!(24));
        assert_eq!(out.back_end_ratio_percent, dec!(31));
        assert_eq!(out.front_end_status, DtiStatus::WithinGuideline);
        assert_eq!(out.back_end_status, DtiStatus::WithinGuideline);
    }

    #[test]
    fn test_max_housing_payment_binds_on_back_end() {
        let out = calculate_dti(&sample_input()).unwrap().result;
        // front cap 2800, back cap 3600 - 700 = 2900
        assert_eq!(out.max_housing_payment, dec!(2800));
        assert_eq!(out.max_principal_and_interest, dec!(2400));
        assert_eq!(out.housing_headroom, dec!(400));
        assert!(out.max_loan_amount.is_none());
    }

    #[test]
    fn test_high_debt_above_qm_limit() {
        let mut input = sample_input();
        input.other_debts.push(DebtObligation { name: "Cards".into(), monthly_payment: dec!(1500) });
        let out = calculate_dti(&input).unwrap();
        assert_eq!(out.result.back_end_status, DtiStatus::AboveQualifiedMortgageLimit);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_max_loan_from_terms() {
        let mut input = sample_input();
        input.principal_and_interest = None;
        input.loan = Some(LoanTerms::new(dec!(300000), dec!(6), 30));
        let out = calculate_dti(&input).unwrap().result;
        let max_loan = out.max_loan_amount.unwrap();
        // 2400 of P&I at 6% over 30 years supports roughly 400k
        assert!((max_loan - dec!(400300)).abs() < dec!(5), "got {max_loan}");
    }

    #[test]
    fn test_zero_income_rejected() {
        let mut input = sample_input();
        input.gross_monthly_income = Decimal::ZERO;
        assert!(calculate_dti(&input).is_err());
    }

    #[test]
    fn test_missing_payment_rejected() {
        let mut input = sample_input();
        input.principal_and_interest = None;
        assert!(calculate_dti(&input).is_err());
    }
}
