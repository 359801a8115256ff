//! Month-by-month loan simulation shared by every calculator.
//!
//! Layers, bottom-up: [`payment`] (level payment formula), [`step`] (one
//! month of interest and principal), [`schedule`] (the payoff state
//! machine), [`aggregation`] (rollups and breakeven search), [`series`]
//! (chart-ready output) and [`engine`] (the full amortization run).

pub mod aggregation;
pub mod engine;
pub mod payment;
pub mod schedule;
pub mod series;
pub mod step;

pub use aggregation::{
    breakeven_period, crossover_period, cumulative, first_period, recovery_month, summarize,
    yearly_rollups, yearly_totals, Breakeven, ScheduleSummary, YearlyRollup,
};
pub use engine::{amortize, AmortizationInput, AmortizationOutput};
pub use payment::{level_payment, monthly_payment, monthly_rate, principal_for_payment, LoanTerms};
pub use schedule::{
    generate_schedule, AmortizationSchedule, Amortizer, ExtraPaymentPolicy, ExtraPayments, NoExtra,
    PeriodResult, ScheduleStatus,
};
pub use step::{amortize_month, StepResult};
