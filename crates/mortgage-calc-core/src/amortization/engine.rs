use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::aggregation::{summarize, ScheduleSummary};
use super::payment::LoanTerms;
use super::schedule::{generate_schedule, AmortizationSchedule, ExtraPaymentPolicy, PeriodResult};
use crate::error::MortgageCalcError;
use crate::time_value::grow;
use crate::types::*;
use crate::MortgageCalcResult;

/// Input for a full amortization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    #[serde(flatten)]
    pub terms: LoanTerms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_payments: Option<ExtraPaymentPolicy>,
    /// Date of the first scheduled payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Property value at origination, enables the equity series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_value: Option<Money>,
    #[serde(default)]
    pub home_appreciation_percent: Percent,
    /// Return every monthly period, not just the yearly rollups
    #[serde(default)]
    pub include_schedule: bool,
}

/// Savings from prepaying versus the plain schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraPaymentSavings {
    pub baseline_total_interest: Money,
    pub baseline_payoff_month: u32,
    pub interest_saved: Money,
    pub months_saved: u32,
}

/// Home equity at the end of a loan year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub year: u32,
    pub home_value: Money,
    pub loan_balance: Money,
    pub equity: Money,
    /// Absent when the home value is too small for a meaningful ratio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltv_percent: Option<Decimal>,
}

/// Output of a full amortization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub summary: ScheduleSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_payment_savings: Option<ExtraPaymentSavings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_over_time: Option<Vec<EquityPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<PeriodResult>>,
}

/// Simulate a loan month by month and derive its summary statistics.
pub fn amortize(input: &AmortizationInput) -> MortgageCalcResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if let Some(hv) = input.home_value {
        if hv <= Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: "home_value".into(),
                reason: "Home value must be positive".into(),
            });
        }
    }

    let schedule = generate_schedule(&input.terms, input.extra_payments.as_ref())?;
    if schedule.negative_amortization {
        warnings.push("Scheduled payment does not cover monthly interest; balance grows".into());
    }

    // Baseline is only needed when prepayments are in play
    let extra_payment_savings = match input.extra_payments {
        Some(_) => {
            let baseline = generate_schedule(&input.terms, None)?;
            Some(ExtraPaymentSavings {
                baseline_total_interest: baseline.total_interest(),
                baseline_payoff_month: baseline.payoff_month(),
                interest_saved: baseline.total_interest() - schedule.total_interest(),
                months_saved: baseline.payoff_month().saturating_sub(schedule.payoff_month()),
            })
        }
        None => None,
    };

    let payoff_date = match input.start_date {
        Some(first) => Some(payment_date(first, schedule.payoff_month())?),
        None => None,
    };

    let equity_over_time = match input.home_value {
        Some(hv) => Some(equity_series(
            &schedule,
            hv,
            input.home_appreciation_percent,
            input.terms.term_years,
        )?),
        None => None,
    };

    let output = AmortizationOutput {
        summary: summarize(&schedule),
        extra_payment_savings,
        payoff_date,
        equity_over_time,
        schedule: input.include_schedule.then(|| schedule.periods.clone()),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly amortization schedule",
        &serde_json::json!({
            "principal": input.terms.principal.to_string(),
            "annual_rate_percent": input.terms.annual_rate_percent.to_string(),
            "term_years": input.terms.term_years,
            "extra_payments": input.extra_payments.is_some(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Calendar date of the `month`-th payment when the first falls on `first`.
pub fn payment_date(first: NaiveDate, month: u32) -> MortgageCalcResult<NaiveDate> {
    first
        .checked_add_months(Months::new(month.saturating_sub(1)))
        .ok_or_else(|| MortgageCalcError::InvalidInput {
            field: "start_date".into(),
            reason: "Payoff date is out of the supported calendar range".into(),
        })
}

/// Year-end equity, with the home growing at `appreciation_percent` a year.
pub fn equity_series(
    schedule: &AmortizationSchedule,
    home_value: Money,
    appreciation_percent: Percent,
    years: u32,
) -> MortgageCalcResult<Vec<EquityPoint>> {
    (1..=years)
        .map(|year| {
            let value = grow(home_value, appreciation_percent, year)?;
            let balance = schedule.balance_after(year * 12);
            let ltv_percent = balance
                .checked_div(value)
                .and_then(|ratio| ratio.checked_mul(dec!(100)));
            Ok(EquityPoint {
                year,
                home_value: value,
                loan_balance: balance,
                equity: value - balance,
                ltv_percent,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> AmortizationInput {
        AmortizationInput {
            terms: LoanTerms::new(dec!(300000), dec!(6.5), 30),
            extra_payments: None,
            start_date: None,
            home_value: None,
            home_appreciation_percent: Decimal::ZERO,
            include_schedule: false,
        }
    }

    #[test]
    fn test_amortize_summary() {
        let out = amortize(&sample_input()).unwrap();
        let s = &out.result.summary;
        assert!((s.monthly_payment - dec!(1896.20)).abs() < dec!(0.01));
        assert_eq!(s.yearly_rollups.len(), 30);
        assert!(out.result.schedule.is_none());
        assert!(out.result.extra_payment_savings.is_none());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_amortize_with_extra_reports_savings() {
        let mut input = sample_input();
        input.extra_payments = Some(ExtraPaymentPolicy::monthly(dec!(200)));
        let out = amortize(&input).unwrap();
        let savings = out.result.extra_payment_savings.unwrap();
        assert!(savings.interest_saved > Decimal::ZERO);
        assert!(savings.months_saved > 0);
    }

    #[test]
    fn test_payoff_date() {
        let mut input = sample_input();
        input.start_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        let out = amortize(&input).unwrap();
        assert_eq!(out.result.payoff_date, NaiveDate::from_ymd_opt(2053, 12, 1));
    }

    #[test]
    fn test_equity_over_time() {
        let mut input = sample_input();
        input.home_value = Some(dec!(375000));
        input.home_appreciation_percent = dec!(3);
        input.include_schedule = true;
        let out = amortize(&input).unwrap();
        let equity = out.result.equity_over_time.unwrap();
        assert_eq!(equity.len(), 30);
        assert!(equity.windows(2).all(|w| w[1].equity > w[0].equity));
        assert_eq!(equity.last().unwrap().loan_balance, Decimal::ZERO);
        assert_eq!(out.result.schedule.unwrap().len(), 360);
    }

    #[test]
    fn test_equity_ltv_omitted_when_home_value_collapses() {
        let schedule = generate_schedule(&LoanTerms::new(dec!(300000), dec!(6.5), 30), None).unwrap();
        let equity = equity_series(&schedule, dec!(320000), dec!(-90), 30).unwrap();
        assert!(equity[0].ltv_percent.unwrap() > dec!(900));
        assert_eq!(equity[28].ltv_percent, None);
        assert!(equity[28].equity < Decimal::ZERO);

        let json = serde_json::to_value(&equity[28]).unwrap();
        assert!(json.get("ltv_percent").is_none());
    }

    #[test]
    fn test_rejects_non_positive_home_value() {
        let mut input = sample_input();
        input.home_value = Some(Decimal::ZERO);
        assert!(amortize(&input).is_err());
    }
}
