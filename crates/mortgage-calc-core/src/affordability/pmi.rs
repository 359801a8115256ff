use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{
    first_period, generate_schedule, AmortizationSchedule, Breakeven, ExtraPaymentPolicy, LoanTerms,
};
use crate::error::MortgageCalcError;
use crate::time_value::grow;
use crate::types::*;
use crate::MortgageCalcResult;

/// Input for private mortgage insurance removal analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmiInput {
    pub loan: LoanTerms,
    /// Purchase price or appraised value at origination
    pub home_value: Money,
    /// Annual premium as a percent of the original loan amount
    pub pmi_annual_rate_percent: Percent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_payments: Option<ExtraPaymentPolicy>,
    /// Used for removal based on a new appraisal
    #[serde(default)]
    pub home_appreciation_percent: Percent,
    #[serde(default = "default_request_ltv")]
    pub request_ltv_percent: Percent,
    #[serde(default = "default_automatic_ltv")]
    pub automatic_ltv_percent: Percent,
}

fn default_request_ltv() -> Percent {
    dec!(80)
}

fn default_automatic_ltv() -> Percent {
    dec!(78)
}

/// Output of PMI removal analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmiOutput {
    pub pmi_required: bool,
    pub initial_ltv_percent: Decimal,
    pub monthly_pmi: Money,
    /// Month the borrower may request cancellation (LTV on original value)
    pub borrower_request_month: Breakeven,
    /// Month the lender must cancel automatically
    pub automatic_termination_month: Breakeven,
    /// Final termination at the midpoint of the amortization term
    pub midpoint_month: u32,
    /// Earlier of automatic termination and the midpoint
    pub effective_termination_month: u32,
    /// Month a new appraisal at the appreciated value would allow removal
    pub appreciation_removal_month: Breakeven,
    pub total_pmi_until_request: Money,
    pub total_pmi_until_termination: Money,
    pub pmi_saved_by_requesting: Money,
}

/// When PMI can be dropped and what it costs until then.
pub fn analyze_pmi_removal(input: &PmiInput) -> MortgageCalcResult<ComputationOutput<PmiOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let schedule = generate_schedule(&input.loan, input.extra_payments.as_ref())?;
    let term_months = input.loan.term_months();
    let initial_ltv_percent = ltv_percent(input.loan.principal, input.home_value)
        .ok_or_else(|| MortgageCalcError::overflow("home_value", "initial LTV"))?;
    let pmi_required = initial_ltv_percent > input.request_ltv_percent;
    let midpoint_month = term_months / 2;

    let output = if !pmi_required {
        warnings.push(format!(
            "Initial LTV {initial_ltv_percent:.2}% is at or below {}%; PMI is not required",
            input.request_ltv_percent
        ));
        PmiOutput {
            pmi_required,
            initial_ltv_percent,
            monthly_pmi: Decimal::ZERO,
            borrower_request_month: Breakeven::At(0),
            automatic_termination_month: Breakeven::At(0),
            midpoint_month,
            effective_termination_month: 0,
            appreciation_removal_month: Breakeven::At(0),
            total_pmi_until_request: Decimal::ZERO,
            total_pmi_until_termination: Decimal::ZERO,
            pmi_saved_by_requesting: Decimal::ZERO,
        }
    } else {
        let monthly_pmi = input.loan.principal * input.pmi_annual_rate_percent / dec!(100) / dec!(12);
        let ltv = ltv_series(&schedule, term_months, |_| Ok(input.home_value))?;
        let borrower_request_month = first_period(&ltv, |l| l <= input.request_ltv_percent);
        let automatic_termination_month = first_period(&ltv, |l| l <= input.automatic_ltv_percent);

        let effective_termination_month = automatic_termination_month
            .period()
            .map_or(midpoint_month, |m| m.min(midpoint_month));

        let appreciated_ltv = ltv_series(&schedule, term_months, |month| {
            grow(input.home_value, input.home_appreciation_percent, month / 12)
        })?;
        let appreciation_removal_month =
            first_period(&appreciated_ltv, |l| l <= input.request_ltv_percent);

        let request_months = borrower_request_month
            .period()
            .map_or(effective_termination_month, |m| m.min(effective_termination_month));
        let total_pmi_until_request = monthly_pmi * Decimal::from(request_months);
        let total_pmi_until_termination = monthly_pmi * Decimal::from(effective_termination_month);

        PmiOutput {
            pmi_required,
            initial_ltv_percent,
            monthly_pmi,
            borrower_request_month,
            automatic_termination_month,
            midpoint_month,
            effective_termination_month,
            appreciation_removal_month,
            total_pmi_until_request,
            total_pmi_until_termination,
            pmi_saved_by_requesting: total_pmi_until_termination - total_pmi_until_request,
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "PMI removal: LTV thresholds on original and appreciated value, midpoint termination",
        &serde_json::json!({
            "request_ltv_percent": input.request_ltv_percent.to_string(),
            "automatic_ltv_percent": input.automatic_ltv_percent.to_string(),
            "pmi_annual_rate_percent": input.pmi_annual_rate_percent.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Month-end LTV percent for months 1..=term_months against a value source.
fn ltv_series<V>(schedule: &AmortizationSchedule, term_months: u32, value_at: V) -> MortgageCalcResult<Vec<Decimal>>
where
    V: Fn(u32) -> MortgageCalcResult<Money>,
{
    (1..=term_months)
        .map(|month| {
            let balance = schedule.balance_after(month);
            if balance.is_zero() {
                return Ok(Decimal::ZERO);
            }
            // A value too small to divide by leaves the LTV above any threshold
            Ok(ltv_percent(balance, value_at(month)?).unwrap_or(Decimal::MAX))
        })
        .collect()
}

fn ltv_percent(balance: Money, value: Money) -> Option<Decimal> {
    balance.checked_div(value)?.checked_mul(dec!(100))
}

fn validate_input(input: &PmiInput) -> MortgageCalcResult<()> {
    input.loan.validate()?;
    if input.home_value <= Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "home_value".into(),
            reason: "Home value must be positive".into(),
        });
    }
    if input.pmi_annual_rate_percent < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "pmi_annual_rate_percent".into(),
            reason: "PMI rate cannot be negative".into(),
        });
    }
    if input.automatic_ltv_percent > input.request_ltv_percent {
        return Err(MortgageCalcError::InvalidInput {
            field: "automatic_ltv_percent".into(),
            reason: "Automatic termination LTV must not exceed the request LTV".into(),
        });
    }
    if input.home_appreciation_percent <= dec!(-100) {
        return Err(MortgageCalcError::InvalidInput {
            field: "home_appreciation_percent".into(),
            reason: "Appreciation must be greater than -100%".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> PmiInput {
        PmiInput {
            loan: LoanTerms::new(dec!(285000), dec!(6.5), 30),
            home_value: dec!(300000),
            pmi_annual_rate_percent: dec!(0.5),
            extra_payments: None,
            home_appreciation_percent: Decimal::ZERO,
            request_ltv_percent: dec!(80),
            automatic_ltv_percent: dec!(78),
        }
    }

    #[test]
    fn test_thresholds_ordered() {
        let out = analyze_pmi_removal(&sample_input()).unwrap().result;
        assert!(out.pmi_required);
        let request = out.borrower_request_month.period().unwrap();
        let automatic = out.automatic_termination_month.period().unwrap();
        assert!(request < automatic);
        assert!(automatic <= out.midpoint_month + 60);
        assert_eq!(out.effective_termination_month, automatic.min(180));
        assert!(out.pmi_saved_by_requesting > Decimal::ZERO);
        assert_eq!(out.monthly_pmi, dec!(118.75));
    }

    #[test]
    fn test_extra_payments_accelerate_removal() {
        let base = analyze_pmi_removal(&sample_input()).unwrap().result;
        let mut input = sample_input();
        input.extra_payments = Some(ExtraPaymentPolicy::monthly(dec!(500)));
        let fast = analyze_pmi_removal(&input).unwrap().result;
        assert!(
            fast.borrower_request_month.period().unwrap() < base.borrower_request_month.period().unwrap()
        );
        assert!(fast.total_pmi_until_termination < base.total_pmi_until_termination);
    }

    #[test]
    fn test_appreciation_allows_earlier_removal() {
        let mut input = sample_input();
        input.home_appreciation_percent = dec!(5);
        let out = analyze_pmi_removal(&input).unwrap().result;
        assert!(
            out.appreciation_removal_month.period().unwrap() < out.borrower_request_month.period().unwrap()
        );
    }

    #[test]
    fn test_twenty_percent_down_needs_no_pmi() {
        let mut input = sample_input();
        input.loan.principal = dec!(240000);
        let out = analyze_pmi_removal(&input).unwrap();
        assert!(!out.result.pmi_required);
        assert_eq!(out.result.total_pmi_until_termination, Decimal::ZERO);
        assert_eq!(out.result.borrower_request_month, Breakeven::At(0));
    }

    #[test]
    fn test_deep_depreciation_defers_appraisal_removal_to_payoff() {
        let mut input = sample_input();
        input.loan = LoanTerms::new(dec!(300000), dec!(6.5), 30);
        input.home_value = dec!(320000);
        input.home_appreciation_percent = dec!(-90);
        let out = analyze_pmi_removal(&input).unwrap().result;
        assert_eq!(out.appreciation_removal_month, Breakeven::At(360));
        assert!(out.borrower_request_month.period().unwrap() < 360);
    }

    #[test]
    fn test_tiny_home_value_is_invalid_input() {
        let mut input = sample_input();
        input.home_value = dec!(0.0000000000000000000000000001);
        let err = analyze_pmi_removal(&input).unwrap_err();
        assert!(
            matches!(err, MortgageCalcError::InvalidInput { ref field, .. } if field == "home_value"),
            "got {err:?}"
        );
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut input = sample_input();
        input.automatic_ltv_percent = dec!(85);
        assert!(analyze_pmi_removal(&input).is_err());
    }
}
