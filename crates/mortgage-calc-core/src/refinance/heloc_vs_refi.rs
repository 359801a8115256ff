use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::existing_loan_schedule;
use crate::amortization::payment::{validate_horizon, MAX_TERM_YEARS};
use crate::amortization::{generate_schedule, level_payment, monthly_rate, Amortizer, LoanTerms, NoExtra, PeriodResult};
use crate::error::MortgageCalcError;
use crate::types::*;
use crate::MortgageCalcResult;

/// Input for raising cash through a cash-out refinance or a HELOC
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelocVsRefiInput {
    pub home_value: Money,
    pub current_balance: Money,
    pub current_rate_percent: Percent,
    pub current_remaining_months: u32,
    pub cash_needed: Money,
    pub refi_rate_percent: Percent,
    #[serde(default = "default_refi_term")]
    pub refi_term_years: u32,
    /// Financed into the new first mortgage
    #[serde(default)]
    pub refi_closing_costs: Money,
    pub heloc_rate_percent: Percent,
    /// Interest-only draw period
    #[serde(default = "default_draw_years")]
    pub heloc_draw_years: u32,
    #[serde(default = "default_repayment_years")]
    pub heloc_repayment_years: u32,
    /// Paid upfront
    #[serde(default)]
    pub heloc_closing_costs: Money,
    #[serde(default = "default_horizon")]
    pub horizon_years: u32,
}

fn default_refi_term() -> u32 {
    30
}
fn default_draw_years() -> u32 {
    10
}
fn default_repayment_years() -> u32 {
    20
}
fn default_horizon() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancingChoice {
    CashOutRefinance,
    Heloc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashOutRefiOption {
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub ltv_percent: Percent,
    pub payments_over_horizon: Money,
    pub interest_over_horizon: Money,
    pub balance_at_horizon: Money,
    pub upfront_cost: Money,
    /// Payments + upfront cost + debt still owed at the horizon
    pub cost_at_horizon: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelocOption {
    pub first_mortgage_payment: Money,
    pub draw_period_payment: Money,
    pub repayment_period_payment: Money,
    pub combined_ltv_percent: Percent,
    pub payments_over_horizon: Money,
    pub interest_over_horizon: Money,
    pub balance_at_horizon: Money,
    pub upfront_cost: Money,
    pub cost_at_horizon: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelocVsRefiOutput {
    pub cash_out_refinance: CashOutRefiOption,
    pub heloc: HelocOption,
    pub cheaper_option: FinancingChoice,
    /// Absolute difference in cost at the horizon
    pub cost_difference: Money,
}

/// Compare a cash-out refinance of the whole mortgage against keeping it
/// and adding a HELOC for the cash.
pub fn compare_heloc_vs_refi(
    input: &HelocVsRefiInput,
) -> MortgageCalcResult<ComputationOutput<HelocVsRefiOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;
    let horizon_months = input.horizon_years * 12;

    // Cash-out refinance
    let refi_terms = LoanTerms::new(
        input.current_balance + input.cash_needed + input.refi_closing_costs,
        input.refi_rate_percent,
        input.refi_term_years,
    );
    let refi = generate_schedule(&refi_terms, None)?;
    let refi_payments = refi.paid_through(horizon_months);
    let refi_balance = refi.balance_after(horizon_months);
    let refi_option = CashOutRefiOption {
        loan_amount: refi_terms.principal,
        monthly_payment: refi.monthly_payment,
        ltv_percent: ltv_percent(refi_terms.principal, input.home_value)?,
        payments_over_horizon: refi_payments,
        interest_over_horizon: refi.interest_through(horizon_months),
        balance_at_horizon: refi_balance,
        upfront_cost: Decimal::ZERO,
        cost_at_horizon: refi_payments + refi_balance,
    };

    // Keep the first mortgage and add a HELOC
    let first = existing_loan_schedule(
        input.current_balance,
        input.current_rate_percent,
        input.current_remaining_months,
    )?;
    let heloc = heloc_periods(
        input.cash_needed,
        input.heloc_rate_percent,
        input.heloc_draw_years * 12,
        input.heloc_repayment_years * 12,
    )?;
    let heloc_through: Vec<&PeriodResult> = heloc.iter().take(horizon_months as usize).collect();
    let heloc_payments: Money = heloc_through.iter().map(|p| p.payment).sum();
    let heloc_interest: Money = heloc_through.iter().map(|p| p.interest_accrued).sum();
    let heloc_balance = heloc_through
        .last()
        .map(|p| p.ending_balance)
        .unwrap_or(input.cash_needed);

    let draw_period_payment = heloc
        .first()
        .filter(|_| input.heloc_draw_years > 0)
        .map(|p| p.payment)
        .unwrap_or(Decimal::ZERO);
    let repayment_period_payment = heloc
        .get((input.heloc_draw_years * 12) as usize)
        .map(|p| p.payment)
        .unwrap_or(Decimal::ZERO);

    let first_payments = first.paid_through(horizon_months);
    let first_balance = first.balance_after(horizon_months);
    let payments_over_horizon = first_payments + heloc_payments;
    let balance_at_horizon = first_balance + heloc_balance;
    let heloc_option = HelocOption {
        first_mortgage_payment: first.monthly_payment,
        draw_period_payment,
        repayment_period_payment,
        combined_ltv_percent: ltv_percent(input.current_balance + input.cash_needed, input.home_value)?,
        payments_over_horizon,
        interest_over_horizon: first.interest_through(horizon_months) + heloc_interest,
        balance_at_horizon,
        upfront_cost: input.heloc_closing_costs,
        cost_at_horizon: payments_over_horizon + input.heloc_closing_costs + balance_at_horizon,
    };

    if heloc_option.combined_ltv_percent > dec!(85) {
        warnings.push(format!(
            "Combined LTV of {:.1}% exceeds the 85% most HELOC lenders allow",
            heloc_option.combined_ltv_percent
        ));
    }
    if refi_option.ltv_percent > dec!(80) {
        warnings.push(format!(
            "Cash-out refinance LTV of {:.1}% exceeds the usual 80% limit",
            refi_option.ltv_percent
        ));
    }
    if input.heloc_draw_years > 0 && input.heloc_draw_years * 12 < horizon_months {
        warnings.push(format!(
            "HELOC payment rises from {:.2} to {:.2} when the draw period ends",
            draw_period_payment, repayment_period_payment
        ));
    }

    let (cheaper_option, cost_difference) = if refi_option.cost_at_horizon <= heloc_option.cost_at_horizon {
        (
            FinancingChoice::CashOutRefinance,
            heloc_option.cost_at_horizon - refi_option.cost_at_horizon,
        )
    } else {
        (
            FinancingChoice::Heloc,
            refi_option.cost_at_horizon - heloc_option.cost_at_horizon,
        )
    };

    let output = HelocVsRefiOutput {
        cash_out_refinance: refi_option,
        heloc: heloc_option,
        cheaper_option,
        cost_difference,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cash-out refinance vs HELOC: payments, upfront costs and debt outstanding at the horizon",
        &serde_json::json!({
            "horizon_years": input.horizon_years,
            "heloc_draw_years": input.heloc_draw_years,
            "heloc_repayment_years": input.heloc_repayment_years,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Interest-only months followed by a level repayment schedule.
fn heloc_periods(
    amount: Money,
    rate_percent: Percent,
    draw_months: u32,
    repayment_months: u32,
) -> MortgageCalcResult<Vec<PeriodResult>> {
    let r = monthly_rate(rate_percent);
    let interest = amount * r;
    let mut periods: Vec<PeriodResult> = (1..=draw_months)
        .map(|month_index| PeriodResult {
            month_index,
            opening_balance: amount,
            payment: interest,
            interest_accrued: interest,
            principal_applied: Decimal::ZERO,
            ending_balance: amount,
        })
        .collect();

    let payment = level_payment(amount, r, repayment_months)?;
    let repayment = Amortizer::with_payment(amount, r, payment, repayment_months, NoExtra)?.run()?;
    periods.extend(repayment.periods.into_iter().map(|p| PeriodResult {
        month_index: p.month_index + draw_months,
        ..p
    }));
    Ok(periods)
}

fn ltv_percent(debt: Money, home_value: Money) -> MortgageCalcResult<Percent> {
    debt.checked_div(home_value)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .ok_or_else(|| MortgageCalcError::overflow("home_value", "loan-to-value ratio"))
}

fn validate_input(input: &HelocVsRefiInput) -> MortgageCalcResult<()> {
    if input.home_value <= Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "home_value".into(),
            reason: "Home value must be positive".into(),
        });
    }
    if input.cash_needed <= Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "cash_needed".into(),
            reason: "Cash needed must be positive".into(),
        });
    }
    for (field, value) in [
        ("refi_rate_percent", input.refi_rate_percent),
        ("heloc_rate_percent", input.heloc_rate_percent),
        ("refi_closing_costs", input.refi_closing_costs),
        ("heloc_closing_costs", input.heloc_closing_costs),
    ] {
        if value < Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: field.into(),
                reason: "Value cannot be negative".into(),
            });
        }
    }
    if input.heloc_repayment_years == 0 || input.heloc_draw_years + input.heloc_repayment_years > MAX_TERM_YEARS {
        return Err(MortgageCalcError::InvalidInput {
            field: "heloc_repayment_years".into(),
            reason: format!(
                "Repayment period must be positive and the HELOC no longer than {} years",
                MAX_TERM_YEARS
            ),
        });
    }
    validate_horizon(input.horizon_years)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> HelocVsRefiInput {
        HelocVsRefiInput {
            home_value: dec!(500000),
            current_balance: dec!(250000),
            current_rate_percent: dec!(3),
            current_remaining_months: 300,
            cash_needed: dec!(50000),
            refi_rate_percent: dec!(7),
            refi_term_years: 30,
            refi_closing_costs: dec!(6000),
            heloc_rate_percent: dec!(8.5),
            heloc_draw_years: 10,
            heloc_repayment_years: 20,
            heloc_closing_costs: dec!(500),
            horizon_years: 10,
        }
    }

    #[test]
    fn test_low_rate_first_mortgage_favors_heloc() {
        let out = compare_heloc_vs_refi(&sample_input()).unwrap().result;
        assert_eq!(out.cheaper_option, FinancingChoice::Heloc);
        assert_eq!(out.cash_out_refinance.loan_amount, dec!(306000));
        assert_eq!(out.heloc.combined_ltv_percent, dec!(60));
        // Interest-only draw: 50000 * 8.5% / 12
        assert!((out.heloc.draw_period_payment - dec!(354.17)).abs() < dec!(0.01));
        // Whole horizon inside the draw period: HELOC balance untouched
        assert!(out.heloc.balance_at_horizon > dec!(50000));
    }

    #[test]
    fn test_rate_drop_favors_refinance() {
        let mut input = sample_input();
        input.current_rate_percent = dec!(7.5);
        input.refi_rate_percent = dec!(6);
        input.heloc_rate_percent = dec!(9);
        let out = compare_heloc_vs_refi(&input).unwrap().result;
        assert_eq!(out.cheaper_option, FinancingChoice::CashOutRefinance);
        assert!(out.cost_difference > Decimal::ZERO);
    }

    #[test]
    fn test_payment_shock_warning() {
        let mut input = sample_input();
        input.heloc_draw_years = 5;
        input.heloc_repayment_years = 15;
        let out = compare_heloc_vs_refi(&input).unwrap();
        assert!(out.result.heloc.repayment_period_payment > out.result.heloc.draw_period_payment);
        assert!(out.warnings.iter().any(|w| w.contains("draw period ends")));
    }

    #[test]
    fn test_rejects_zero_cash() {
        let mut input = sample_input();
        input.cash_needed = Decimal::ZERO;
        assert!(compare_heloc_vs_refi(&input).is_err());
    }

    #[test]
    fn test_unrepresentable_ltv_is_invalid_input() {
        let mut input = sample_input();
        input.home_value = dec!(0.0000000000000000000000000001);
        let err = compare_heloc_vs_refi(&input).unwrap_err();
        assert!(
            matches!(err, MortgageCalcError::InvalidInput { ref field, .. } if field == "home_value"),
            "got {err:?}"
        );
    }
}
