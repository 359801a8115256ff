use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use mortgage_calc_core::MortgageCalcResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse the JSON input, run the calculator and serialize its output.
fn run<I, O, F>(input_json: &str, calc: F) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(&I) -> MortgageCalcResult<O>,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calc(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn amortize(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::amortization::amortize)
}

// ---------------------------------------------------------------------------
// Affordability
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_dti(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::affordability::dti::calculate_dti)
}

#[napi]
pub fn analyze_pmi_removal(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::affordability::pmi::analyze_pmi_removal)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_rent_vs_buy(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::comparison::rent_vs_buy::compare_rent_vs_buy)
}

#[napi]
pub fn compare_arm_vs_fixed(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::comparison::arm_vs_fixed::compare_arm_vs_fixed)
}

#[napi]
pub fn calculate_tco(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::comparison::tco::calculate_tco)
}

#[napi]
pub fn compare_buy_vs_keep(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::comparison::buy_vs_keep::compare_buy_vs_keep)
}

// ---------------------------------------------------------------------------
// Refinance
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_refinance(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::refinance::refi_breakeven::analyze_refinance)
}

#[napi]
pub fn analyze_points(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::refinance::points::analyze_points)
}

#[napi]
pub fn compare_heloc_vs_refi(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::refinance::heloc_vs_refi::compare_heloc_vs_refi)
}

#[napi]
pub fn analyze_buydown(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::refinance::buydown::analyze_buydown)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_what_if(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::scenarios::what_if::simulate_what_if)
}

#[napi]
pub fn simulate_life_events(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::scenarios::life_events::simulate_life_events)
}

#[napi]
pub fn run_stress_test(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::scenarios::stress_test::run_stress_test)
}

#[napi]
pub fn simulate_equity_paths(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::scenarios::stress_test::simulate_equity_paths)
}

#[napi]
pub fn simulate_rent(input_json: String) -> NapiResult<String> {
    run(&input_json, mortgage_calc_core::scenarios::rent_simulator::simulate_rent)
}
