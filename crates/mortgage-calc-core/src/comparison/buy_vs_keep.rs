use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::payment::{validate_horizon, MAX_TERM_YEARS};
use crate::amortization::{
    crossover_period, generate_schedule, level_payment, monthly_rate, yearly_totals, AmortizationSchedule, Amortizer,
    Breakeven, LoanTerms, NoExtra,
};
use crate::error::MortgageCalcError;
use crate::time_value::{grow, percent_to_rate};
use crate::types::*;
use crate::MortgageCalcResult;

/// Input for keeping the current home versus selling and buying another
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyVsKeepInput {
    pub current_home_value: Money,
    pub current_loan_balance: Money,
    pub current_rate_percent: Percent,
    pub current_remaining_months: u32,
    pub new_home_price: Money,
    pub new_rate_percent: Percent,
    pub new_term_years: u32,
    /// Savings added to the sale proceeds for the new down payment
    #[serde(default)]
    pub additional_cash: Money,
    #[serde(default = "default_growth")]
    pub current_appreciation_percent: Percent,
    #[serde(default = "default_growth")]
    pub new_appreciation_percent: Percent,
    #[serde(default = "default_selling_cost")]
    pub selling_cost_percent: Percent,
    #[serde(default = "default_closing_cost")]
    pub closing_cost_percent: Percent,
    /// Property tax, insurance and upkeep as a percent of value per year
    #[serde(default = "default_ownership_cost")]
    pub annual_ownership_cost_percent: Percent,
    #[serde(default = "default_horizon")]
    pub horizon_years: u32,
}

fn default_growth() -> Percent {
    dec!(3)
}
fn default_selling_cost() -> Percent {
    dec!(6)
}
fn default_closing_cost() -> Percent {
    dec!(3)
}
fn default_ownership_cost() -> Percent {
    dec!(2)
}
fn default_horizon() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyVsKeepYear {
    pub year: u32,
    pub keep_outflow: Money,
    pub move_outflow: Money,
    /// Equity net of selling costs
    pub keep_equity: Money,
    pub move_equity: Money,
    /// Net equity plus cash on hand less cumulative outflows
    pub keep_wealth: Money,
    pub move_wealth: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDecision {
    Keep,
    Move,
}

/// Output of the keep-versus-move comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyVsKeepOutput {
    pub keep_monthly_payment: Money,
    pub move_monthly_payment: Money,
    pub sale_proceeds: Money,
    pub down_payment: Money,
    pub move_loan_amount: Money,
    /// Selling costs on the current home plus closing costs on the new one
    pub transaction_costs: Money,
    pub years: Vec<BuyVsKeepYear>,
    /// First year moving leaves the household at least as wealthy
    pub breakeven_year: Breakeven,
    pub wealth_difference_at_horizon: Money,
    pub recommendation: MoveDecision,
}

/// Keep the current home and mortgage, or sell and buy a new one.
pub fn compare_buy_vs_keep(input: &BuyVsKeepInput) -> MortgageCalcResult<ComputationOutput<BuyVsKeepOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let horizon_months = input.horizon_years * 12;
    let sell_rate = percent_to_rate(input.selling_cost_percent);

    let keep = current_loan_schedule(input)?;

    let selling_costs = input.current_home_value * sell_rate;
    let sale_proceeds = input.current_home_value - selling_costs - input.current_loan_balance;
    if sale_proceeds < Decimal::ZERO {
        warnings.push("Current home is underwater after selling costs; the shortfall reduces the down payment".into());
    }
    let closing_costs = input.new_home_price * percent_to_rate(input.closing_cost_percent);
    let down_payment = sale_proceeds + input.additional_cash - closing_costs;
    if down_payment < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "additional_cash".into(),
            reason: "Sale proceeds and additional cash do not cover closing costs".into(),
        });
    }
    let move_loan_amount = (input.new_home_price - down_payment).max(Decimal::ZERO);
    let leftover_cash = (down_payment - input.new_home_price).max(Decimal::ZERO);

    let new_loan = if move_loan_amount > Decimal::ZERO {
        Some(generate_schedule(
            &LoanTerms::new(move_loan_amount, input.new_rate_percent, input.new_term_years),
            None,
        )?)
    } else {
        warnings.push("Sale proceeds cover the new home outright; no new mortgage".into());
        None
    };

    let keep_payments = yearly_totals(&keep.payment_stream(horizon_months));
    let move_payments = match &new_loan {
        Some(s) => yearly_totals(&s.payment_stream(horizon_months)),
        None => vec![Decimal::ZERO; input.horizon_years as usize],
    };

    let ownership_rate = percent_to_rate(input.annual_ownership_cost_percent);
    let mut keep_cumulative = Decimal::ZERO;
    let mut move_cumulative = Decimal::ZERO;
    let mut years = Vec::with_capacity(input.horizon_years as usize);

    for year in 1..=input.horizon_years {
        let i = year as usize - 1;
        let keep_value = grow(input.current_home_value, input.current_appreciation_percent, year)?;
        let move_value = grow(input.new_home_price, input.new_appreciation_percent, year)?;
        let keep_opening = grow(input.current_home_value, input.current_appreciation_percent, year - 1)?;
        let move_opening = grow(input.new_home_price, input.new_appreciation_percent, year - 1)?;

        let keep_outflow = keep_payments[i] + keep_opening * ownership_rate;
        let move_outflow = move_payments[i] + move_opening * ownership_rate;
        keep_cumulative += keep_outflow;
        move_cumulative += move_outflow;

        let keep_equity = keep_value * (Decimal::ONE - sell_rate) - keep.balance_after(year * 12);
        let move_balance = new_loan
            .as_ref()
            .map_or(Decimal::ZERO, |s| s.balance_after(year * 12));
        let move_equity = move_value * (Decimal::ONE - sell_rate) - move_balance;

        years.push(BuyVsKeepYear {
            year,
            keep_outflow,
            move_outflow,
            keep_equity,
            move_equity,
            keep_wealth: keep_equity + input.additional_cash - keep_cumulative,
            move_wealth: move_equity + leftover_cash - move_cumulative,
        });
    }

    let keep_wealth: Vec<Money> = years.iter().map(|y| y.keep_wealth).collect();
    let move_wealth: Vec<Money> = years.iter().map(|y| y.move_wealth).collect();
    let breakeven_year = crossover_period(&move_wealth, &keep_wealth);
    let wealth_difference_at_horizon = years
        .last()
        .map(|y| y.move_wealth - y.keep_wealth)
        .unwrap_or(Decimal::ZERO);

    let output = BuyVsKeepOutput {
        keep_monthly_payment: keep.monthly_payment,
        move_monthly_payment: new_loan.as_ref().map_or(Decimal::ZERO, |s| s.monthly_payment),
        sale_proceeds,
        down_payment,
        move_loan_amount,
        transaction_costs: selling_costs + closing_costs,
        years,
        breakeven_year,
        wealth_difference_at_horizon,
        recommendation: if wealth_difference_at_horizon > Decimal::ZERO {
            MoveDecision::Move
        } else {
            MoveDecision::Keep
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Keep vs move: net equity plus cash less cumulative housing outflows for each path",
        &serde_json::json!({
            "horizon_years": input.horizon_years,
            "selling_cost_percent": input.selling_cost_percent.to_string(),
            "closing_cost_percent": input.closing_cost_percent.to_string(),
            "annual_ownership_cost_percent": input.annual_ownership_cost_percent.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// The existing mortgage, re-amortized from today's balance.
fn current_loan_schedule(input: &BuyVsKeepInput) -> MortgageCalcResult<AmortizationSchedule> {
    let r = monthly_rate(input.current_rate_percent);
    if input.current_loan_balance.is_zero() {
        return Amortizer::with_payment(Decimal::ZERO, r, Decimal::ZERO, 1, NoExtra)?.run();
    }
    let payment = level_payment(input.current_loan_balance, r, input.current_remaining_months)?;
    Amortizer::with_payment(input.current_loan_balance, r, payment, input.current_remaining_months, NoExtra)?.run()
}

fn validate_input(input: &BuyVsKeepInput) -> MortgageCalcResult<()> {
    if input.current_home_value <= Decimal::ZERO || input.new_home_price <= Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "home_value".into(),
            reason: "Home values must be positive".into(),
        });
    }
    if input.current_loan_balance < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "current_loan_balance".into(),
            reason: "Balance cannot be negative".into(),
        });
    }
    if input.current_loan_balance > Decimal::ZERO
        && (input.current_remaining_months == 0 || input.current_remaining_months > MAX_TERM_YEARS * 12)
    {
        return Err(MortgageCalcError::InvalidInput {
            field: "current_remaining_months".into(),
            reason: "Remaining term must be between 1 and 600 months".into(),
        });
    }
    if input.current_rate_percent < Decimal::ZERO || input.new_rate_percent < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "rate_percent".into(),
            reason: "Rates cannot be negative".into(),
        });
    }
    if input.additional_cash < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "additional_cash".into(),
            reason: "Cannot be negative".into(),
        });
    }
    crate::amortization::payment::validate_term_years(input.new_term_years)?;
    validate_horizon(input.horizon_years)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> BuyVsKeepInput {
        BuyVsKeepInput {
            current_home_value: dec!(400000),
            current_loan_balance: dec!(200000),
            current_rate_percent: dec!(3),
            current_remaining_months: 300,
            new_home_price: dec!(550000),
            new_rate_percent: dec!(7),
            new_term_years: 30,
            additional_cash: dec!(20000),
            current_appreciation_percent: dec!(3),
            new_appreciation_percent: dec!(3),
            selling_cost_percent: dec!(6),
            closing_cost_percent: dec!(3),
            annual_ownership_cost_percent: dec!(2),
            horizon_years: 10,
        }
    }

    #[test]
    fn test_sale_proceeds_and_down_payment() {
        let out = compare_buy_vs_keep(&sample_input()).unwrap().result;
        // 400k - 24k selling - 200k payoff
        assert_eq!(out.sale_proceeds, dec!(176000));
        // + 20k cash - 16.5k closing
        assert_eq!(out.down_payment, dec!(179500));
        assert_eq!(out.move_loan_amount, dec!(370500));
        assert_eq!(out.transaction_costs, dec!(40500));
        assert_eq!(out.years.len(), 10);
    }

    #[test]
    fn test_cheap_existing_loan_favours_keeping() {
        let out = compare_buy_vs_keep(&sample_input()).unwrap().result;
        assert!(out.move_monthly_payment > out.keep_monthly_payment);
        assert_eq!(out.recommendation, MoveDecision::Keep);
    }

    #[test]
    fn test_paid_off_home_with_cash_purchase() {
        let mut input = sample_input();
        input.current_loan_balance = Decimal::ZERO;
        input.new_home_price = dec!(300000);
        let out = compare_buy_vs_keep(&input).unwrap();
        assert_eq!(out.result.move_loan_amount, Decimal::ZERO);
        assert_eq!(out.result.move_monthly_payment, Decimal::ZERO);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_rejects_when_closing_costs_unfunded() {
        let mut input = sample_input();
        input.current_loan_balance = dec!(390000);
        input.additional_cash = Decimal::ZERO;
        assert!(compare_buy_vs_keep(&input).is_err());
    }
}
