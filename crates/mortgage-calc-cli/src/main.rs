mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::LevelFilter;
use std::process;

use commands::affordability::{DtiArgs, PmiArgs};
use commands::amortization::AmortizeArgs;
use commands::comparison::{ArmVsFixedArgs, BuyVsKeepArgs, RentVsBuyArgs, TcoArgs};
use commands::refinance::{BuydownArgs, HelocVsRefiArgs, PointsArgs, RefinanceArgs};
use commands::scenarios::{EquityPathsArgs, LifeEventsArgs, RentSimArgs, StressTestArgs, WhatIfArgs};

/// Mortgage amortization and home-finance calculators
#[derive(Parser)]
#[command(
    name = "mcalc",
    version,
    about = "Mortgage amortization and home-finance calculators",
    long_about = "A CLI for mortgage calculations with decimal precision. Supports \
                  amortization schedules, DTI and PMI, rent vs buy, ARM vs fixed, \
                  refinance and points breakeven, buydowns, and scenario simulation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine diagnostics to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Amortization schedule, totals and payoff
    Amortize(AmortizeArgs),
    /// Front-end and back-end debt-to-income ratios
    Dti(DtiArgs),
    /// PMI removal timing and cost
    Pmi(PmiArgs),
    /// Renting versus buying over a horizon
    RentVsBuy(RentVsBuyArgs),
    /// Adjustable-rate versus fixed-rate mortgage
    ArmVsFixed(ArmVsFixedArgs),
    /// Total cost of home ownership
    Tco(TcoArgs),
    /// Keep the current home or sell and buy another
    BuyVsKeep(BuyVsKeepArgs),
    /// Rate-and-term refinance breakeven
    Refinance(RefinanceArgs),
    /// Discount points breakeven
    Points(PointsArgs),
    /// Cash-out refinance versus HELOC
    HelocVsRefi(HelocVsRefiArgs),
    /// Temporary rate buydown (3-2-1, 2-1, 1-0, custom)
    Buydown(BuydownArgs),
    /// Compare prepayment and rate scenarios against the base loan
    WhatIf(WhatIfArgs),
    /// Replay windfalls, refinances and forbearance over the loan
    LifeEvents(LifeEventsArgs),
    /// Rate, income and home-price shocks
    StressTest(StressTestArgs),
    /// Monte Carlo home-price paths and negative equity odds
    EquityPaths(EquityPathsArgs),
    /// Rent growth versus ownership cost
    RentSim(RentSimArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::amortization::run_amortize(args),
        Commands::Dti(args) => commands::affordability::run_dti(args),
        Commands::Pmi(args) => commands::affordability::run_pmi(args),
        Commands::RentVsBuy(args) => commands::comparison::run_rent_vs_buy(args),
        Commands::ArmVsFixed(args) => commands::comparison::run_arm_vs_fixed(args),
        Commands::Tco(args) => commands::comparison::run_tco(args),
        Commands::BuyVsKeep(args) => commands::comparison::run_buy_vs_keep(args),
        Commands::Refinance(args) => commands::refinance::run_refinance(args),
        Commands::Points(args) => commands::refinance::run_points(args),
        Commands::HelocVsRefi(args) => commands::refinance::run_heloc_vs_refi(args),
        Commands::Buydown(args) => commands::refinance::run_buydown(args),
        Commands::WhatIf(args) => commands::scenarios::run_what_if(args),
        Commands::LifeEvents(args) => commands::scenarios::run_life_events(args),
        Commands::StressTest(args) => commands::scenarios::run_stress_test(args),
        Commands::EquityPaths(args) => commands::scenarios::run_equity_paths(args),
        Commands::RentSim(args) => commands::scenarios::run_rent_sim(args),
        Commands::Version => {
            println!("mcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
