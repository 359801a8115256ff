pub mod affordability;
pub mod amortization;
pub mod comparison;
pub mod refinance;
pub mod scenarios;
