use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use loan_amort_core::analysis::{self, LoanAnalysisInput};
use loan_amort_core::loan::LoanParameters;
use loan_amort_core::schedule::{ExtraPayment, LoanSchedule};

use crate::input;

/// Loan parameters shared by every subcommand
#[derive(Args)]
pub struct LoanFlags {
    /// Purchase price of the financed asset
    #[arg(long)]
    pub asset_value: Option<Decimal>,

    /// Down payment percentage of the asset value (0-100)
    #[arg(long, default_value = "0")]
    pub percent_down: Decimal,

    /// Annual interest rate in percent (e.g. 5 for 5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub term_years: Option<u32>,

    /// Override the computed monthly payment
    #[arg(long)]
    pub minimum_payment: Option<Decimal>,

    /// Recurring extra principal payment as AMOUNT:START_MONTH (repeatable)
    #[arg(long = "extra")]
    pub extra: Vec<String>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanFlags,

    /// Emit the standard schedule even when extra payments are given
    #[arg(long)]
    pub ignore_extras: bool,
}

/// Arguments for the lifecycle position lookup
#[derive(Args)]
pub struct PositionArgs {
    #[command(flatten)]
    pub loan: LoanFlags,

    /// Loan origination date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// As-of date (YYYY-MM-DD, defaults in the input file are honored)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for the full analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub loan: LoanFlags,

    /// Loan origination date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// As-of date (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input = resolve_input(&args.loan, None, None)?;
    let engine = build_engine(&analysis_input)?;

    let schedule = if args.ignore_extras {
        engine.standard_schedule()
    } else {
        engine.adjusted_schedule()
    };
    Ok(serde_json::to_value(schedule)?)
}

pub fn run_position(args: PositionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input = resolve_input(&args.loan, args.start_date, args.as_of)?;
    let start_date = analysis_input
        .loan_start_date
        .ok_or("--start-date is required (or loan_start_date in --input)")?;
    let as_of = analysis_input
        .as_of_date
        .ok_or("--as-of is required (or as_of_date in --input)")?;

    let engine = build_engine(&analysis_input)?;
    let position = engine.position_by_date(start_date, as_of);
    Ok(serde_json::to_value(position)?)
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input = resolve_input(&args.loan, args.start_date, args.as_of)?;
    let result = analysis::analyze_loan(&analysis_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Resolve the analysis input: JSON file, then piped stdin, then flags.
fn resolve_input(
    flags: &LoanFlags,
    start_date: Option<NaiveDate>,
    as_of: Option<NaiveDate>,
) -> Result<LoanAnalysisInput, Box<dyn std::error::Error>> {
    let mut resolved: LoanAnalysisInput = if let Some(ref path) = flags.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LoanAnalysisInput {
            parameters: LoanParameters {
                asset_value: flags
                    .asset_value
                    .ok_or("--asset-value is required (or provide --input)")?,
                percentage_put_down: flags.percent_down,
                interest_rate: flags
                    .rate
                    .ok_or("--rate is required (or provide --input)")?,
                term_in_years: flags
                    .term_years
                    .ok_or("--term-years is required (or provide --input)")?,
                minimum_payment: flags.minimum_payment,
            },
            extra_payments: flags
                .extra
                .iter()
                .map(|spec| parse_extra(spec))
                .collect::<Result<Vec<_>, _>>()?,
            loan_start_date: None,
            as_of_date: None,
        }
    };

    // Date flags take precedence over anything in the input file.
    if start_date.is_some() {
        resolved.loan_start_date = start_date;
    }
    if as_of.is_some() {
        resolved.as_of_date = as_of;
    }
    Ok(resolved)
}

fn build_engine(input: &LoanAnalysisInput) -> Result<LoanSchedule, Box<dyn std::error::Error>> {
    let mut engine = LoanSchedule::new(input.parameters.clone())?;
    for extra in &input.extra_payments {
        engine = engine.with_extra_payment(extra.amount, extra.start_month)?;
    }
    Ok(engine)
}

/// Parse an AMOUNT:START_MONTH extra-payment flag.
fn parse_extra(spec: &str) -> Result<ExtraPayment, Box<dyn std::error::Error>> {
    let (amount_str, month_str) = spec
        .split_once(':')
        .ok_or_else(|| format!("invalid --extra '{spec}': expected AMOUNT:START_MONTH"))?;

    let amount: Decimal = amount_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid --extra amount '{amount_str}'"))?;
    let start_month: u32 = month_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid --extra start month '{month_str}'"))?;

    if amount <= dec!(0) {
        return Err(format!("--extra amount must be positive, got '{amount_str}'").into());
    }
    Ok(ExtraPayment {
        amount,
        start_month,
    })
}
