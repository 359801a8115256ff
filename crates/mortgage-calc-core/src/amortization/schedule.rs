use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::payment::{monthly_payment, LoanTerms, MAX_TERM_YEARS};
use super::step::amortize_month;
use crate::error::MortgageCalcError;
use crate::types::{Money, Rate};
use crate::MortgageCalcResult;

/// Optional prepayments on top of the scheduled payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraPaymentPolicy {
    /// Added to every scheduled payment
    #[serde(default)]
    pub extra_monthly: Money,
    /// One-time prepayment
    #[serde(default)]
    pub lump_sum: Money,
    /// 1-based month in which `lump_sum` is paid
    #[serde(default = "default_lump_sum_month")]
    pub lump_sum_at_month: u32,
}

fn default_lump_sum_month() -> u32 {
    1
}

impl ExtraPaymentPolicy {
    pub fn monthly(extra_monthly: Money) -> Self {
        ExtraPaymentPolicy {
            extra_monthly,
            lump_sum: Decimal::ZERO,
            lump_sum_at_month: 1,
        }
    }

    pub fn lump_sum(amount: Money, at_month: u32) -> Self {
        ExtraPaymentPolicy {
            extra_monthly: Decimal::ZERO,
            lump_sum: amount,
            lump_sum_at_month: at_month,
        }
    }

    pub fn validate(&self) -> MortgageCalcResult<()> {
        if self.extra_monthly < Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: "extra_monthly".into(),
                reason: "Extra monthly payment cannot be negative".into(),
            });
        }
        if self.lump_sum < Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: "lump_sum".into(),
                reason: "Lump sum cannot be negative".into(),
            });
        }
        if self.lump_sum_at_month == 0 {
            return Err(MortgageCalcError::InvalidInput {
                field: "lump_sum_at_month".into(),
                reason: "Lump sum month is 1-based".into(),
            });
        }
        Ok(())
    }
}

/// Source of extra principal for a given 1-based month.
pub trait ExtraPayments {
    fn extra_for(&self, month: u32) -> Money;
}

impl ExtraPayments for ExtraPaymentPolicy {
    fn extra_for(&self, month: u32) -> Money {
        if month == self.lump_sum_at_month {
            // Saturates; an out-of-range total is rejected by the monthly step
            self.extra_monthly.saturating_add(self.lump_sum)
        } else {
            self.extra_monthly
        }
    }
}

/// Standard amortization with no prepayments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtra;

impl ExtraPayments for NoExtra {
    fn extra_for(&self, _month: u32) -> Money {
        Decimal::ZERO
    }
}

impl<F> ExtraPayments for F
where
    F: Fn(u32) -> Money,
{
    fn extra_for(&self, month: u32) -> Money {
        self(month)
    }
}

/// One simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodResult {
    /// 1-based month
    pub month_index: u32,
    pub opening_balance: Money,
    /// Cash paid this month (interest plus principal applied)
    pub payment: Money,
    pub interest_accrued: Money,
    pub principal_applied: Money,
    pub ending_balance: Money,
}

/// Where the simulation stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ScheduleStatus {
    Accruing,
    PaidOff { month: u32 },
    /// Term ran out with a balance outstanding; only reachable when the
    /// payment stream does not fully amortize the loan.
    TermExhausted { remaining_balance: Money },
}

/// Month-by-month loan simulation. Yields one `PeriodResult` per month and
/// stops at payoff or at the end of the term, whichever is first. The
/// iterator is consumed as it runs and cannot be restarted.
pub struct Amortizer<E: ExtraPayments> {
    balance: Money,
    monthly_rate: Rate,
    payment: Money,
    term_months: u32,
    month: u32,
    extra: E,
    state: ScheduleStatus,
    negative_amortization: bool,
}

impl<E: ExtraPayments> Amortizer<E> {
    /// Simulate `terms` with its level payment.
    pub fn for_terms(terms: &LoanTerms, extra: E) -> MortgageCalcResult<Self> {
        let payment = monthly_payment(terms)?;
        Ok(Amortizer::new(
            terms.principal,
            terms.monthly_rate(),
            payment,
            terms.term_months(),
            extra,
        ))
    }

    /// Simulate an arbitrary scheduled payment against `balance`.
    pub fn with_payment(
        balance: Money,
        monthly_rate: Rate,
        payment: Money,
        term_months: u32,
        extra: E,
    ) -> MortgageCalcResult<Self> {
        if balance < Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: "balance".into(),
                reason: "Balance cannot be negative".into(),
            });
        }
        if monthly_rate < Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: "monthly_rate".into(),
                reason: "Rate cannot be negative".into(),
            });
        }
        if term_months == 0 || term_months > MAX_TERM_YEARS * 12 {
            return Err(MortgageCalcError::InvalidInput {
                field: "term_months".into(),
                reason: format!("Term must be between 1 and {} months", MAX_TERM_YEARS * 12),
            });
        }
        Ok(Amortizer::new(balance, monthly_rate, payment, term_months, extra))
    }

    fn new(balance: Money, monthly_rate: Rate, payment: Money, term_months: u32, extra: E) -> Self {
        let state = if balance.is_zero() {
            ScheduleStatus::PaidOff { month: 0 }
        } else {
            ScheduleStatus::Accruing
        };
        Amortizer {
            balance,
            monthly_rate,
            payment,
            term_months,
            month: 0,
            extra,
            state,
            negative_amortization: false,
        }
    }

    pub fn state(&self) -> &ScheduleStatus {
        &self.state
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn negative_amortization(&self) -> bool {
        self.negative_amortization
    }

    /// Run to completion.
    pub fn run(mut self) -> MortgageCalcResult<AmortizationSchedule> {
        let periods = self.by_ref().collect::<MortgageCalcResult<Vec<_>>>()?;
        debug!(
            "amortization finished after {} months: {:?}",
            periods.len(),
            self.state
        );
        Ok(AmortizationSchedule {
            monthly_payment: self.payment,
            periods,
            status: self.state,
            negative_amortization: self.negative_amortization,
        })
    }
}

impl<E: ExtraPayments> Iterator for Amortizer<E> {
    type Item = MortgageCalcResult<PeriodResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != ScheduleStatus::Accruing {
            return None;
        }
        if self.month >= self.term_months {
            warn!(
                "term of {} months exhausted with balance {} outstanding",
                self.term_months, self.balance
            );
            self.state = ScheduleStatus::TermExhausted {
                remaining_balance: self.balance,
            };
            return None;
        }

        self.month += 1;
        let extra = self.extra.extra_for(self.month);
        let step = match amortize_month(self.balance, self.monthly_rate, self.payment, extra) {
            Ok(step) => step,
            Err(e) => {
                self.state = ScheduleStatus::TermExhausted {
                    remaining_balance: self.balance,
                };
                return Some(Err(e));
            }
        };

        if step.negative_amortization && !self.negative_amortization {
            warn!(
                "payment {} does not cover interest {} in month {}",
                self.payment, step.interest, self.month
            );
        }
        self.negative_amortization |= step.negative_amortization;

        let period = PeriodResult {
            month_index: self.month,
            opening_balance: self.balance,
            payment: step.interest + step.principal_applied,
            interest_accrued: step.interest,
            principal_applied: step.principal_applied,
            ending_balance: step.new_balance,
        };

        self.balance = step.new_balance;
        if self.balance.is_zero() {
            self.state = ScheduleStatus::PaidOff { month: self.month };
        }

        Some(Ok(period))
    }
}

/// A completed simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_payment: Money,
    pub periods: Vec<PeriodResult>,
    pub status: ScheduleStatus,
    pub negative_amortization: bool,
}

impl AmortizationSchedule {
    /// Month of payoff, or the last simulated month if never paid off.
    pub fn payoff_month(&self) -> u32 {
        match self.status {
            ScheduleStatus::PaidOff { month } => month,
            _ => self.periods.len() as u32,
        }
    }

    pub fn is_paid_off(&self) -> bool {
        matches!(self.status, ScheduleStatus::PaidOff { .. })
    }

    pub fn total_interest(&self) -> Money {
        self.periods.iter().map(|p| p.interest_accrued).sum()
    }

    pub fn total_paid(&self) -> Money {
        self.periods.iter().map(|p| p.payment).sum()
    }

    pub fn total_principal(&self) -> Money {
        self.periods.iter().map(|p| p.principal_applied).sum()
    }

    /// Balance at the end of `month` (0 = loan origination). Months after
    /// the last simulated period keep the final balance.
    pub fn balance_after(&self, month: u32) -> Money {
        if month == 0 {
            return self
                .periods
                .first()
                .map(|p| p.opening_balance)
                .unwrap_or(Decimal::ZERO);
        }
        match self.periods.get(month as usize - 1) {
            Some(p) => p.ending_balance,
            None => self
                .periods
                .last()
                .map(|p| p.ending_balance)
                .unwrap_or(Decimal::ZERO),
        }
    }

    /// Cash paid in each month of `horizon_months`, zero after payoff.
    pub fn payment_stream(&self, horizon_months: u32) -> Vec<Money> {
        (1..=horizon_months)
            .map(|m| {
                self.periods
                    .get(m as usize - 1)
                    .map(|p| p.payment)
                    .unwrap_or(Decimal::ZERO)
            })
            .collect()
    }

    /// Interest accrued within the first `months` months.
    pub fn interest_through(&self, months: u32) -> Money {
        self.periods
            .iter()
            .take(months as usize)
            .map(|p| p.interest_accrued)
            .sum()
    }

    /// Cash paid within the first `months` months.
    pub fn paid_through(&self, months: u32) -> Money {
        self.periods.iter().take(months as usize).map(|p| p.payment).sum()
    }
}

/// Simulate `terms` under an optional extra-payment policy.
pub fn generate_schedule(
    terms: &LoanTerms,
    policy: Option<&ExtraPaymentPolicy>,
) -> MortgageCalcResult<AmortizationSchedule> {
    match policy {
        Some(policy) => {
            policy.validate()?;
            Amortizer::for_terms(terms, policy.clone())?.run()
        }
        None => Amortizer::for_terms(terms, NoExtra)?.run(),
    }
}
