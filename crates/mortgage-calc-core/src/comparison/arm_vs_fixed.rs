use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::payment::validate_horizon;
use crate::amortization::{
    amortize_month, breakeven_period, generate_schedule, level_payment, monthly_rate,
    AmortizationSchedule, Breakeven, LoanTerms, PeriodResult, ScheduleStatus,
};
use crate::error::MortgageCalcError;
use crate::types::*;
use crate::MortgageCalcResult;

/// Input for an adjustable-rate versus fixed-rate comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmVsFixedInput {
    pub principal: Money,
    pub term_years: u32,
    pub fixed_rate_percent: Percent,
    pub arm_initial_rate_percent: Percent,
    /// Years the ARM's teaser rate is locked (5 for a 5/1 ARM)
    #[serde(default = "default_initial_period")]
    pub initial_period_years: u32,
    #[serde(default = "default_adjustment_interval")]
    pub adjustment_interval_months: u32,
    #[serde(default = "default_margin")]
    pub margin_percent: Percent,
    /// Index level assumed at every reset when no path is given
    pub expected_index_percent: Percent,
    /// Index level per reset; the last value carries forward
    #[serde(default)]
    pub index_path: Vec<Percent>,
    #[serde(default = "default_cap")]
    pub initial_adjustment_cap_percent: Percent,
    #[serde(default = "default_cap")]
    pub periodic_cap_percent: Percent,
    #[serde(default = "default_lifetime_cap")]
    pub lifetime_cap_percent: Percent,
    /// Lowest rate the ARM can reset to; defaults to the margin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_percent: Option<Percent>,
    /// Expected years in the home; defaults to the full term
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_years: Option<u32>,
}

fn default_initial_period() -> u32 {
    5
}
fn default_adjustment_interval() -> u32 {
    12
}
fn default_margin() -> Percent {
    dec!(2.75)
}
fn default_cap() -> Percent {
    dec!(2)
}
fn default_lifetime_cap() -> Percent {
    dec!(5)
}

/// A rate change on the ARM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateReset {
    pub month: u32,
    pub rate_percent: Percent,
    pub payment: Money,
}

/// One simulated ARM rate path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmScenario {
    pub resets: Vec<RateReset>,
    pub max_payment: Money,
    pub max_rate_percent: Percent,
    pub total_interest: Money,
    pub total_paid: Money,
    /// Payments through the horizon plus the balance still owed then
    pub cost_at_horizon: Money,
    /// Month cumulative ARM payments catch up with the fixed loan
    pub breakeven_month: Breakeven,
}

/// Output of an ARM versus fixed comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmVsFixedOutput {
    pub fixed_payment: Money,
    pub fixed_total_interest: Money,
    pub fixed_cost_at_horizon: Money,
    pub arm_initial_payment: Money,
    pub initial_monthly_savings: Money,
    pub expected: ArmScenario,
    pub worst_case: ArmScenario,
    pub horizon_months: u32,
    /// Fixed cost at horizon minus expected ARM cost (positive favours the ARM)
    pub horizon_advantage_of_arm: Money,
}

/// Compare a fixed-rate loan with an ARM under expected and worst-case
/// index paths.
pub fn compare_arm_vs_fixed(input: &ArmVsFixedInput) -> MortgageCalcResult<ComputationOutput<ArmVsFixedOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let fixed_terms = LoanTerms::new(input.principal, input.fixed_rate_percent, input.term_years);
    let fixed = generate_schedule(&fixed_terms, None)?;
    let term_months = fixed_terms.term_months();
    let horizon_months = input.horizon_years.unwrap_or(input.term_years) * 12;

    let expected_path = simulate_arm(input, |k| {
        input
            .index_path
            .get(k)
            .or(input.index_path.last())
            .copied()
            .unwrap_or(input.expected_index_percent)
    })?;
    // An index far above every cap walks the rate up as fast as the caps allow
    let worst_index = input.arm_initial_rate_percent + input.lifetime_cap_percent + dec!(100);
    let worst_path = simulate_arm(input, |_| worst_index)?;

    let fixed_stream = fixed.payment_stream(term_months);
    let fixed_cost_at_horizon = cost_at_horizon(&fixed, horizon_months);

    let expected = scenario(&expected_path, &fixed_stream, horizon_months);
    let worst_case = scenario(&worst_path, &fixed_stream, horizon_months);

    if expected_path.schedule.negative_amortization || worst_path.schedule.negative_amortization {
        warnings.push("ARM payment fails to cover interest after a reset".into());
    }
    if horizon_months > input.initial_period_years * 12 {
        warnings.push(format!(
            "Horizon extends past the {}-year initial period; ARM cost depends on the assumed index",
            input.initial_period_years
        ));
    }

    let arm_initial_payment = expected_path.schedule.monthly_payment;
    let output = ArmVsFixedOutput {
        fixed_payment: fixed.monthly_payment,
        fixed_total_interest: fixed.total_interest(),
        fixed_cost_at_horizon,
        arm_initial_payment,
        initial_monthly_savings: fixed.monthly_payment - arm_initial_payment,
        horizon_advantage_of_arm: fixed_cost_at_horizon - expected.cost_at_horizon,
        expected,
        worst_case,
        horizon_months,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "ARM vs fixed: capped index-plus-margin resets, payment re-amortized over remaining term",
        &serde_json::json!({
            "initial_period_years": input.initial_period_years,
            "adjustment_interval_months": input.adjustment_interval_months,
            "margin_percent": input.margin_percent.to_string(),
            "caps": format!(
                "{}/{}/{}",
                input.initial_adjustment_cap_percent, input.periodic_cap_percent, input.lifetime_cap_percent
            ),
        }),
        warnings,
        elapsed,
        output,
    ))
}

struct ArmPath {
    schedule: AmortizationSchedule,
    resets: Vec<RateReset>,
    max_rate_percent: Percent,
}

/// Run the ARM month by month, resetting the rate on schedule and
/// re-amortizing the balance over the months that remain.
fn simulate_arm<I>(input: &ArmVsFixedInput, index_at_reset: I) -> MortgageCalcResult<ArmPath>
where
    I: Fn(usize) -> Percent,
{
    let term_months = input.term_years * 12;
    let initial_months = input.initial_period_years * 12;
    let ceiling = input.arm_initial_rate_percent + input.lifetime_cap_percent;
    let floor = input.floor_percent.unwrap_or(input.margin_percent);

    let mut rate = input.arm_initial_rate_percent;
    let mut balance = input.principal;
    let mut payment = level_payment(balance, monthly_rate(rate), term_months)?;
    let initial_payment = payment;
    let mut resets = Vec::new();
    let mut periods = Vec::with_capacity(term_months as usize);
    let mut negative_amortization = false;
    let mut max_rate_percent = rate;

    for month in 1..=term_months {
        let since_lock = month.saturating_sub(initial_months + 1);
        if month > initial_months && since_lock % input.adjustment_interval_months == 0 {
            let k = (since_lock / input.adjustment_interval_months) as usize;
            let cap = if k == 0 {
                input.initial_adjustment_cap_percent
            } else {
                input.periodic_cap_percent
            };
            let target = index_at_reset(k) + input.margin_percent;
            let next = target
                .clamp(rate - cap, rate + cap)
                .min(ceiling)
                .max(floor.min(ceiling))
                .max(Decimal::ZERO);
            if next != rate {
                rate = next;
                payment = level_payment(balance, monthly_rate(rate), term_months - month + 1)?;
                max_rate_percent = max_rate_percent.max(rate);
                resets.push(RateReset {
                    month,
                    rate_percent: rate,
                    payment,
                });
            }
        }

        let step = amortize_month(balance, monthly_rate(rate), payment, Decimal::ZERO)?;
        negative_amortization |= step.negative_amortization;
        periods.push(PeriodResult {
            month_index: month,
            opening_balance: balance,
            payment: step.interest + step.principal_applied,
            interest_accrued: step.interest,
            principal_applied: step.principal_applied,
            ending_balance: step.new_balance,
        });
        balance = step.new_balance;
        if balance.is_zero() {
            break;
        }
    }

    let status = if balance.is_zero() {
        ScheduleStatus::PaidOff {
            month: periods.len() as u32,
        }
    } else {
        ScheduleStatus::TermExhausted {
            remaining_balance: balance,
        }
    };

    Ok(ArmPath {
        schedule: AmortizationSchedule {
            monthly_payment: initial_payment,
            periods,
            status,
            negative_amortization,
        },
        resets,
        max_rate_percent,
    })
}

fn scenario(path: &ArmPath, fixed_stream: &[Money], horizon_months: u32) -> ArmScenario {
    let arm_stream = path.schedule.payment_stream(fixed_stream.len() as u32);
    ArmScenario {
        resets: path.resets.clone(),
        max_payment: path
            .schedule
            .periods
            .iter()
            .map(|p| p.payment)
            .max()
            .unwrap_or(Decimal::ZERO),
        max_rate_percent: path.max_rate_percent,
        total_interest: path.schedule.total_interest(),
        total_paid: path.schedule.total_paid(),
        cost_at_horizon: cost_at_horizon(&path.schedule, horizon_months),
        breakeven_month: breakeven_period(&arm_stream, fixed_stream),
    }
}

fn cost_at_horizon(schedule: &AmortizationSchedule, horizon_months: u32) -> Money {
    schedule.paid_through(horizon_months) + schedule.balance_after(horizon_months)
}

fn validate_input(input: &ArmVsFixedInput) -> MortgageCalcResult<()> {
    LoanTerms::new(input.principal, input.fixed_rate_percent, input.term_years).validate()?;
    if input.arm_initial_rate_percent < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "arm_initial_rate_percent".into(),
            reason: "Rate cannot be negative".into(),
        });
    }
    if input.initial_period_years >= input.term_years {
        return Err(MortgageCalcError::InvalidInput {
            field: "initial_period_years".into(),
            reason: "Initial fixed period must be shorter than the term".into(),
        });
    }
    if input.adjustment_interval_months == 0 {
        return Err(MortgageCalcError::InvalidInput {
            field: "adjustment_interval_months".into(),
            reason: "Adjustment interval must be at least one month".into(),
        });
    }
    for (field, value) in [
        ("initial_adjustment_cap_percent", input.initial_adjustment_cap_percent),
        ("periodic_cap_percent", input.periodic_cap_percent),
        ("lifetime_cap_percent", input.lifetime_cap_percent),
    ] {
        if value < Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: field.into(),
                reason: "Caps cannot be negative".into(),
            });
        }
    }
    if let Some(h) = input.horizon_years {
        validate_horizon(h)?;
        if h > input.term_years {
            return Err(MortgageCalcError::InvalidInput {
                field: "horizon_years".into(),
                reason: "Horizon cannot exceed the loan term".into(),
            });
        }
    }
    Ok(())
}
