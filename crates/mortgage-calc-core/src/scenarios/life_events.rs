use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::payment::MAX_TERM_YEARS;
use crate::amortization::{
    amortize_month, generate_schedule, level_payment, monthly_rate, yearly_rollups, LoanTerms, PeriodResult,
    ScheduleStatus, YearlyRollup,
};
use crate::error::MortgageCalcError;
use crate::types::*;
use crate::MortgageCalcResult;

fn default_true() -> bool {
    true
}

/// Something that changes the loan from a given month onward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifeEventKind {
    /// One-off principal payment. With `recast` the scheduled payment is
    /// recomputed over the remaining term; otherwise the loan pays off sooner.
    /// A recast requested during forbearance happens when payments resume.
    Windfall {
        amount: Money,
        #[serde(default)]
        recast: bool,
    },
    /// Replace the recurring extra principal payment.
    ExtraPaymentChange { extra_monthly: Money },
    /// Move to a new rate, re-amortizing the balance over the remaining term.
    Refinance { rate_percent: Percent },
    /// Skip payments for `months`; interest capitalizes. The skipped months
    /// extend maturity and the payment is recast when forbearance ends.
    Forbearance {
        months: u32,
        #[serde(default = "default_true")]
        recast: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeEvent {
    /// 1-based month the event takes effect
    pub month: u32,
    #[serde(flatten)]
    pub kind: LifeEventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifeEventsInput {
    #[serde(flatten)]
    pub loan: LoanTerms,
    pub events: Vec<LifeEvent>,
    #[serde(default)]
    pub include_schedule: bool,
}

/// State of the loan right after an event was applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOutcome {
    pub month: u32,
    pub event: LifeEventKind,
    pub balance_before: Money,
    pub scheduled_payment_after: Money,
    pub rate_percent_after: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifeEventsOutput {
    pub baseline_total_interest: Money,
    pub baseline_payoff_month: u32,
    pub total_interest: Money,
    pub total_paid: Money,
    pub payoff_month: u32,
    pub status: ScheduleStatus,
    /// Positive when the events reduce lifetime interest
    pub interest_saved: Money,
    pub months_saved: i64,
    pub negative_amortization: bool,
    /// Months in which the balance grew
    pub negative_amortization_months: Vec<u32>,
    pub timeline: Vec<EventOutcome>,
    pub yearly_rollups: Vec<YearlyRollup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<PeriodResult>>,
}

struct LoanState {
    balance: Money,
    rate_percent: Percent,
    payment: Money,
    extra_monthly: Money,
    maturity: u32,
    forbearance_left: u32,
    recast_after_forbearance: bool,
}

impl LoanState {
    fn recast(&mut self, month: u32) -> MortgageCalcResult<()> {
        // Payment from `month` on retires the balance by maturity
        let remaining = self.maturity.saturating_sub(month - 1).max(1);
        self.payment = level_payment(self.balance, monthly_rate(self.rate_percent), remaining)?;
        Ok(())
    }
}

/// Replay a timeline of life events against the loan month by month and
/// compare the outcome with the untouched baseline.
pub fn simulate_life_events(input: &LifeEventsInput) -> MortgageCalcResult<ComputationOutput<LifeEventsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let baseline = generate_schedule(&input.loan, None)?;

    let mut events = input.events.clone();
    events.sort_by_key(|e| e.month);

    let mut state = LoanState {
        balance: input.loan.principal,
        rate_percent: input.loan.annual_rate_percent,
        payment: baseline.monthly_payment,
        extra_monthly: Decimal::ZERO,
        maturity: input.loan.term_months(),
        forbearance_left: 0,
        recast_after_forbearance: false,
    };

    let max_months = MAX_TERM_YEARS * 12;
    let mut periods: Vec<PeriodResult> = Vec::new();
    let mut timeline: Vec<EventOutcome> = Vec::new();
    let mut negative_amortization_months: Vec<u32> = Vec::new();
    let mut next_event = 0;
    let mut month = 0;
    let mut status = ScheduleStatus::Accruing;

    while status == ScheduleStatus::Accruing {
        if month >= state.maturity {
            status = ScheduleStatus::TermExhausted {
                remaining_balance: state.balance,
            };
            break;
        }
        month += 1;

        let balance_before = state.balance;
        let mut lump = Decimal::ZERO;
        let mut pending_recast = false;
        while next_event < events.len() && events[next_event].month == month {
            let event = &events[next_event];
            match &event.kind {
                LifeEventKind::Windfall { amount, recast } => {
                    lump = lump
                        .checked_add(*amount)
                        .ok_or_else(|| MortgageCalcError::overflow("events.amount", "windfall total"))?;
                    pending_recast |= *recast;
                }
                LifeEventKind::ExtraPaymentChange { extra_monthly } => {
                    state.extra_monthly = *extra_monthly;
                }
                LifeEventKind::Refinance { rate_percent } => {
                    state.rate_percent = *rate_percent;
                    state.recast(month)?;
                }
                LifeEventKind::Forbearance { months, recast } => {
                    state.forbearance_left = state.forbearance_left.saturating_add(*months);
                    state.maturity = state.maturity.saturating_add(*months).min(max_months);
                    state.recast_after_forbearance = *recast;
                }
            }
            timeline.push(EventOutcome {
                month,
                event: event.kind.clone(),
                balance_before,
                scheduled_payment_after: state.payment,
                rate_percent_after: state.rate_percent,
            });
            next_event += 1;
        }

        let r = monthly_rate(state.rate_percent);
        let in_forbearance = state.forbearance_left > 0;
        let (payment, extra) = if in_forbearance {
            (Decimal::ZERO, lump)
        } else {
            let extra = state
                .extra_monthly
                .checked_add(lump)
                .ok_or_else(|| MortgageCalcError::overflow("events", "extra principal"))?;
            (state.payment, extra)
        };

        let step = amortize_month(state.balance, r, payment, extra)?;
        if step.negative_amortization && step.interest > Decimal::ZERO && step.new_balance > state.balance {
            if negative_amortization_months.is_empty() {
                warn!("balance grows from month {} onward", month);
            }
            negative_amortization_months.push(month);
        }

        periods.push(PeriodResult {
            month_index: month,
            opening_balance: state.balance,
            payment: step.interest + step.principal_applied,
            interest_accrued: step.interest,
            principal_applied: step.principal_applied,
            ending_balance: step.new_balance,
        });
        state.balance = step.new_balance;

        if state.balance.is_zero() {
            status = ScheduleStatus::PaidOff { month };
            break;
        }

        if in_forbearance {
            state.recast_after_forbearance |= pending_recast;
            state.forbearance_left -= 1;
            if state.forbearance_left == 0 && state.recast_after_forbearance {
                state.recast(month + 1)?;
                debug!("payment recast to {} after forbearance", state.payment);
            }
        } else if pending_recast {
            state.recast(month + 1)?;
        }
    }

    if let ScheduleStatus::TermExhausted { remaining_balance } = &status {
        warnings.push(format!(
            "Loan not repaid by month {}: {:.2} outstanding",
            state.maturity, remaining_balance
        ));
    }
    if !negative_amortization_months.is_empty() {
        warnings.push(format!(
            "Negative amortization in {} month(s); unpaid interest was added to the balance",
            negative_amortization_months.len()
        ));
    }
    if next_event < events.len() {
        warnings.push(format!(
            "{} event(s) fall after the loan ended and were ignored",
            events.len() - next_event
        ));
    }

    let total_interest: Money = periods.iter().map(|p| p.interest_accrued).sum();
    let total_paid: Money = periods.iter().map(|p| p.payment).sum();
    let payoff_month = match status {
        ScheduleStatus::PaidOff { month } => month,
        _ => periods.len() as u32,
    };

    let output = LifeEventsOutput {
        baseline_total_interest: baseline.total_interest(),
        baseline_payoff_month: baseline.payoff_month(),
        total_interest,
        total_paid,
        payoff_month,
        status,
        interest_saved: baseline.total_interest() - total_interest,
        months_saved: i64::from(baseline.payoff_month()) - i64::from(payoff_month),
        negative_amortization: !negative_amortization_months.is_empty(),
        negative_amortization_months,
        timeline,
        yearly_rollups: yearly_rollups(&periods),
        schedule: if input.include_schedule { Some(periods) } else { None },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Life events: month-by-month replay with recasts, compared against one baseline schedule",
        &serde_json::json!({
            "principal": input.loan.principal.to_string(),
            "annual_rate_percent": input.loan.annual_rate_percent.to_string(),
            "term_years": input.loan.term_years,
            "event_count": input.events.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &LifeEventsInput) -> MortgageCalcResult<()> {
    input.loan.validate()?;
    for event in &input.events {
        if event.month == 0 {
            return Err(MortgageCalcError::InvalidInput {
                field: "events.month".into(),
                reason: "Event months are 1-based".into(),
            });
        }
        let negative = match &event.kind {
            LifeEventKind::Windfall { amount, .. } => *amount < Decimal::ZERO,
            LifeEventKind::ExtraPaymentChange { extra_monthly } => *extra_monthly < Decimal::ZERO,
            LifeEventKind::Refinance { rate_percent } => *rate_percent < Decimal::ZERO,
            LifeEventKind::Forbearance { .. } => false,
        };
        if negative {
            return Err(MortgageCalcError::InvalidInput {
                field: "events".into(),
                reason: format!("Event in month {} has a negative amount or rate", event.month),
            });
        }
        if let LifeEventKind::Forbearance { months, .. } = &event.kind {
            if *months > MAX_TERM_YEARS * 12 {
                return Err(MortgageCalcError::InvalidInput {
                    field: "events.months".into(),
                    reason: format!("Forbearance cannot exceed {} months", MAX_TERM_YEARS * 12),
                });
            }
        }
    }
    Ok(())
}
