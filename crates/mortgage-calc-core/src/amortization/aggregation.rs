use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::schedule::{AmortizationSchedule, PeriodResult, ScheduleStatus};
use crate::types::Money;

/// Headline figures for a completed schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_paid: Money,
    pub payoff_month: u32,
    pub status: ScheduleStatus,
    pub negative_amortization: bool,
    pub yearly_rollups: Vec<YearlyRollup>,
}

/// Twelve months of a schedule rolled together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRollup {
    /// 1-based loan year
    pub year: u32,
    pub payment_total: Money,
    pub principal_total: Money,
    pub interest_total: Money,
    pub ending_balance: Money,
}

/// First period at which one series overtakes another. `Never` means the
/// crossing did not happen inside the simulated horizon; nothing is
/// extrapolated beyond it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakeven {
    At(u32),
    Never,
}

impl Breakeven {
    pub fn period(&self) -> Option<u32> {
        match self {
            Breakeven::At(p) => Some(*p),
            Breakeven::Never => None,
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Breakeven::Never)
    }

    /// Convert a monthly result into loan years (month 13 is year 2).
    pub fn to_years(&self) -> Breakeven {
        match self {
            Breakeven::At(m) => Breakeven::At(m.div_ceil(12)),
            Breakeven::Never => Breakeven::Never,
        }
    }
}

/// Roll monthly periods into loan years. The last year may be partial.
pub fn yearly_rollups(periods: &[PeriodResult]) -> Vec<YearlyRollup> {
    periods
        .chunks(12)
        .enumerate()
        .map(|(i, months)| YearlyRollup {
            year: i as u32 + 1,
            payment_total: months.iter().map(|p| p.payment).sum(),
            principal_total: months.iter().map(|p| p.principal_applied).sum(),
            interest_total: months.iter().map(|p| p.interest_accrued).sum(),
            ending_balance: months
                .last()
                .map(|p| p.ending_balance)
                .unwrap_or(Decimal::ZERO),
        })
        .collect()
}

pub fn summarize(schedule: &AmortizationSchedule) -> ScheduleSummary {
    ScheduleSummary {
        monthly_payment: schedule.monthly_payment,
        total_interest: schedule.total_interest(),
        total_paid: schedule.total_paid(),
        payoff_month: schedule.payoff_month(),
        status: schedule.status.clone(),
        negative_amortization: schedule.negative_amortization,
        yearly_rollups: yearly_rollups(&schedule.periods),
    }
}

/// Sum a monthly series into yearly buckets.
pub fn yearly_totals(monthly: &[Money]) -> Vec<Money> {
    monthly.chunks(12).map(|m| m.iter().copied().sum()).collect()
}

/// Running totals of a series.
pub fn cumulative(series: &[Money]) -> Vec<Money> {
    series
        .iter()
        .scan(Decimal::ZERO, |acc, v| {
            *acc += *v;
            Some(*acc)
        })
        .collect()
}

/// First 1-based period where cumulative `a` >= cumulative `b`. Only the
/// overlapping length of the two series is considered.
pub fn breakeven_period(a: &[Money], b: &[Money]) -> Breakeven {
    let mut cum_a = Decimal::ZERO;
    let mut cum_b = Decimal::ZERO;
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        cum_a += *x;
        cum_b += *y;
        if cum_a >= cum_b {
            return Breakeven::At(i as u32 + 1);
        }
    }
    Breakeven::Never
}

/// First 1-based period where `a[i] >= b[i]`.
pub fn crossover_period(a: &[Money], b: &[Money]) -> Breakeven {
    first_period(
        &a.iter().zip(b.iter()).map(|(x, y)| *x - *y).collect::<Vec<_>>(),
        |d| d >= Decimal::ZERO,
    )
}

/// First 1-based period whose value satisfies `predicate`.
pub fn first_period<P>(series: &[Money], predicate: P) -> Breakeven
where
    P: Fn(Money) -> bool,
{
    series
        .iter()
        .position(|v| predicate(*v))
        .map(|i| Breakeven::At(i as u32 + 1))
        .unwrap_or(Breakeven::Never)
}

/// Months of savings needed to recover an upfront cost, `Never` when the
/// savings never accumulate to the cost within the series.
pub fn recovery_month(upfront_cost: Money, monthly_savings: &[Money]) -> Breakeven {
    if upfront_cost <= Decimal::ZERO {
        return Breakeven::At(0);
    }
    first_period(&cumulative(monthly_savings), |saved| saved >= upfront_cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::{generate_schedule, LoanTerms};
    use rust_decimal_macros::dec;

    #[test]
    fn test_yearly_rollups_partial_final_year() {
        let sched = generate_schedule(&LoanTerms::new(dec!(1800), Decimal::ZERO, 2), None).unwrap();
        let rollups = yearly_rollups(&sched.periods[..18]);
        assert_eq!(rollups.len(), 2);
        assert_eq!(rollups[0].payment_total, dec!(900));
        assert_eq!(rollups[0].ending_balance, dec!(900));
        assert_eq!(rollups[1].principal_total, dec!(450));
        assert_eq!(rollups[1].ending_balance, dec!(450));
    }

    #[test]
    fn test_rollups_sum_to_schedule_totals() {
        let sched = generate_schedule(&LoanTerms::new(dec!(250000), dec!(5), 30), None).unwrap();
        let rollups = yearly_rollups(&sched.periods);
        let interest: Decimal = rollups.iter().map(|r| r.interest_total).sum();
        assert_eq!(interest, sched.total_interest());
        assert_eq!(rollups.last().unwrap().ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_cumulative() {
        assert_eq!(
            cumulative(&[dec!(1), dec!(2), dec!(3)]),
            vec![dec!(1), dec!(3), dec!(6)]
        );
    }

    #[test]
    fn test_breakeven_found() {
        let a = vec![dec!(0), dec!(0), dec!(50), dec!(50)];
        let b = vec![dec!(20), dec!(20), dec!(20), dec!(20)];
        // cum a: 0,0,50,100  cum b: 20,40,60,80
        assert_eq!(breakeven_period(&a, &b), Breakeven::At(4));
    }

    #[test]
    fn test_breakeven_never_is_explicit() {
        let a = vec![dec!(1); 10];
        let b = vec![dec!(2); 10];
        assert_eq!(breakeven_period(&a, &b), Breakeven::Never);
        assert_eq!(breakeven_period(&[], &[]), Breakeven::Never);
    }

    #[test]
    fn test_crossover_period() {
        let a = vec![dec!(1), dec!(2), dec!(3)];
        let b = vec![dec!(2), dec!(2), dec!(2)];
        assert_eq!(crossover_period(&a, &b), Breakeven::At(2));
    }

    #[test]
    fn test_recovery_month() {
        let savings = vec![dec!(100); 24];
        assert_eq!(recovery_month(dec!(1000), &savings), Breakeven::At(10));
        assert_eq!(recovery_month(dec!(5000), &savings), Breakeven::Never);
        assert_eq!(recovery_month(Decimal::ZERO, &savings), Breakeven::At(0));
    }

    #[test]
    fn test_breakeven_serializes_sentinel() {
        assert_eq!(serde_json::to_string(&Breakeven::Never).unwrap(), "\"never\"");
        assert_eq!(serde_json::to_string(&Breakeven::At(7)).unwrap(), "{\"at\":7}");
    }

    #[test]
    fn test_to_years() {
        assert_eq!(Breakeven::At(13).to_years(), Breakeven::At(2));
        assert_eq!(Breakeven::At(12).to_years(), Breakeven::At(1));
        assert_eq!(Breakeven::Never.to_years(), Breakeven::Never);
    }
}
