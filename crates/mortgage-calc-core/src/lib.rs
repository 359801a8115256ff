pub mod amortization;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "affordability")]
pub mod affordability;

#[cfg(feature = "comparison")]
pub mod comparison;

#[cfg(feature = "refinance")]
pub mod refinance;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::MortgageCalcError;
pub use types::*;

/// Standard result type for all mortgage-calc operations
pub type MortgageCalcResult<T> = Result<T, MortgageCalcError>;
