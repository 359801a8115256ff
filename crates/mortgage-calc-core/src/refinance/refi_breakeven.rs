use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::existing_loan_schedule;
use crate::amortization::{first_period, generate_schedule, recovery_month, Breakeven, LoanTerms};
use crate::error::MortgageCalcError;
use crate::types::*;
use crate::MortgageCalcResult;

/// Input for a rate-and-term refinance analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceInput {
    pub current_balance: Money,
    pub current_rate_percent: Percent,
    pub current_remaining_months: u32,
    pub new_rate_percent: Percent,
    pub new_term_years: u32,
    pub closing_costs: Money,
    /// Finance the closing costs instead of paying them upfront
    #[serde(default)]
    pub roll_costs_into_loan: bool,
}

/// Output of a refinance analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceOutput {
    pub current_payment: Money,
    pub new_payment: Money,
    pub monthly_savings: Money,
    pub new_loan_amount: Money,
    pub upfront_cost: Money,
    /// Closing costs divided by the payment saving
    pub simple_breakeven_month: Breakeven,
    /// First month payments saved plus the balance gap cover the upfront cost
    pub net_breakeven_month: Breakeven,
    pub current_remaining_interest: Money,
    pub new_total_interest: Money,
    pub interest_difference: Money,
    /// Remaining cost of the current loan less everything the new loan costs
    pub lifetime_savings: Money,
}

/// Whether a refinance pays for itself, and when.
pub fn analyze_refinance(input: &RefinanceInput) -> MortgageCalcResult<ComputationOutput<RefinanceOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.closing_costs < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "closing_costs".into(),
            reason: "Closing costs cannot be negative".into(),
        });
    }

    let current = existing_loan_schedule(
        input.current_balance,
        input.current_rate_percent,
        input.current_remaining_months,
    )?;

    let (new_loan_amount, upfront_cost) = if input.roll_costs_into_loan {
        (input.current_balance + input.closing_costs, Decimal::ZERO)
    } else {
        (input.current_balance, input.closing_costs)
    };
    let new_terms = LoanTerms::new(new_loan_amount, input.new_rate_percent, input.new_term_years);
    let new = generate_schedule(&new_terms, None)?;

    let monthly_savings = current.monthly_payment - new.monthly_payment;
    let horizon = input.current_remaining_months.max(new_terms.term_months());

    let current_stream = current.payment_stream(horizon);
    let new_stream = new.payment_stream(horizon);
    let savings: Vec<Money> = current_stream
        .iter()
        .zip(new_stream.iter())
        .map(|(c, n)| *c - *n)
        .collect();

    let simple_breakeven_month = if monthly_savings > Decimal::ZERO {
        recovery_month(input.closing_costs, &vec![monthly_savings; horizon as usize])
    } else {
        Breakeven::Never
    };

    // Net position: cumulative payment savings plus how much less is owed
    let mut cumulative = -upfront_cost;
    let net_position: Vec<Money> = savings
        .iter()
        .enumerate()
        .map(|(i, s)| {
            cumulative += *s;
            let month = i as u32 + 1;
            cumulative + current.balance_after(month) - new.balance_after(month)
        })
        .collect();
    let net_breakeven_month = first_period(&net_position, |v| v >= Decimal::ZERO);

    if new_terms.term_months() > input.current_remaining_months {
        warnings.push(format!(
            "New term of {} months extends repayment beyond the {} months remaining",
            new_terms.term_months(),
            input.current_remaining_months
        ));
    }
    if monthly_savings <= Decimal::ZERO {
        warnings.push("New payment is not lower than the current payment".into());
    }

    let current_total_paid = current.total_paid();
    let new_total_cost = new.total_paid() + upfront_cost;

    let output = RefinanceOutput {
        current_payment: current.monthly_payment,
        new_payment: new.monthly_payment,
        monthly_savings,
        new_loan_amount,
        upfront_cost,
        simple_breakeven_month,
        net_breakeven_month,
        current_remaining_interest: current.total_interest(),
        new_total_interest: new.total_interest(),
        interest_difference: current.total_interest() - new.total_interest(),
        lifetime_savings: current_total_paid - new_total_cost,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Refinance breakeven: simple (costs / payment savings) and net (savings plus balance difference)",
        &serde_json::json!({
            "current_rate_percent": input.current_rate_percent.to_string(),
            "new_rate_percent": input.new_rate_percent.to_string(),
            "roll_costs_into_loan": input.roll_costs_into_loan,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> RefinanceInput {
        RefinanceInput {
            current_balance: dec!(300000),
            current_rate_percent: dec!(7.5),
            current_remaining_months: 336,
            new_rate_percent: dec!(6),
            new_term_years: 28,
            closing_costs: dec!(6000),
            roll_costs_into_loan: false,
        }
    }

    #[test]
    fn test_rate_drop_breaks_even() {
        let out = analyze_refinance(&sample_input()).unwrap().result;
        assert!(out.monthly_savings > dec!(250));
        let simple = out.simple_breakeven_month.period().unwrap();
        // 6000 / ~290 a month
        assert!((19..=24).contains(&simple), "got {simple}");
        let net = out.net_breakeven_month.period().unwrap();
        assert!(net <= simple);
        assert!(out.lifetime_savings > Decimal::ZERO);
        assert!(out.interest_difference > Decimal::ZERO);
    }

    #[test]
    fn test_rolled_costs_raise_loan_amount() {
        let mut input = sample_input();
        input.roll_costs_into_loan = true;
        let out = analyze_refinance(&input).unwrap().result;
        assert_eq!(out.new_loan_amount, dec!(306000));
        assert_eq!(out.upfront_cost, Decimal::ZERO);
    }

    #[test]
    fn test_higher_rate_never_breaks_even() {
        let mut input = sample_input();
        input.new_rate_percent = dec!(8);
        let out = analyze_refinance(&input).unwrap();
        assert_eq!(out.result.simple_breakeven_month, Breakeven::Never);
        assert_eq!(out.result.net_breakeven_month, Breakeven::Never);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_rejects_negative_costs() {
        let mut input = sample_input();
        input.closing_costs = dec!(-1);
        assert!(analyze_refinance(&input).is_err());
    }
}
