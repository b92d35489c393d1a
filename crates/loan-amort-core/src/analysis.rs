//! One-shot loan analysis for serialized consumers.
//!
//! Bundles both schedules, a payoff summary, and (when dates are supplied)
//! the lifecycle position into the standard computation envelope. This is
//! the surface the CLI and any downstream tooling consume as plain data.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::lifecycle::LifecyclePosition;
use crate::loan::LoanParameters;
use crate::schedule::{ExtraPayment, LoanSchedule, Statement};
use crate::types::{round_cents, with_metadata, ComputationOutput, Money};
use crate::LoanAmortResult;

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Top-level analysis input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysisInput {
    pub parameters: LoanParameters,
    /// Extra principal payments, applied in order.
    #[serde(default)]
    pub extra_payments: Vec<ExtraPayment>,
    /// Loan origination date, for the lifecycle position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_start_date: Option<NaiveDate>,
    /// As-of date, for the lifecycle position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of_date: Option<NaiveDate>,
}

/// Payoff totals for the standard and adjusted trajectories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSummary {
    pub months_to_payoff: u32,
    pub adjusted_months_to_payoff: u32,
    pub total_interest: Money,
    pub adjusted_total_interest: Money,
    pub total_paid: Money,
    pub adjusted_total_paid: Money,
    /// Interest avoided by the extra payments.
    pub interest_saved: Money,
    /// Months shaved off the term by the extra payments.
    pub months_saved: u32,
}

/// Full analysis output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysisOutput {
    pub down_payment: Money,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub summary: LoanSummary,
    pub standard_schedule: Vec<Statement>,
    pub adjusted_schedule: Vec<Statement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<LifecyclePosition>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyse a loan: build the engine, overlay the extra payments, and return
/// both schedules plus the payoff summary in the standard envelope.
pub fn analyze_loan(
    input: &LoanAnalysisInput,
) -> LoanAmortResult<ComputationOutput<LoanAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut engine = LoanSchedule::new(input.parameters.clone())?;
    for extra in &input.extra_payments {
        engine = engine.with_extra_payment(extra.amount, extra.start_month)?;
    }

    let first_month_interest = engine.loan_amount() * input.parameters.monthly_rate();
    if engine.loan_amount() > Decimal::ZERO && engine.monthly_payment() <= first_month_interest {
        warnings.push(format!(
            "Monthly payment {} does not cover first-month interest {}; the balance will not amortize until the final-month clamp",
            engine.monthly_payment(),
            round_cents(first_month_interest)
        ));
    }

    let standard_schedule = engine.standard_schedule();
    let adjusted_schedule = engine.adjusted_schedule();
    let summary = build_summary(&standard_schedule, &adjusted_schedule);

    let position = match (input.loan_start_date, input.as_of_date) {
        (Some(start_date), Some(as_of)) => Some(engine.position_by_date(start_date, as_of)),
        _ => None,
    };

    let output = LoanAnalysisOutput {
        down_payment: engine.down_payment(),
        loan_amount: engine.loan_amount(),
        monthly_payment: engine.monthly_payment(),
        summary,
        standard_schedule,
        adjusted_schedule,
        position,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-Payment Amortization",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn build_summary(standard: &[Statement], adjusted: &[Statement]) -> LoanSummary {
    let total_interest = sum_interest(standard);
    let adjusted_total_interest = sum_interest(adjusted);
    let total_paid = sum_payments(standard);
    let adjusted_total_paid = sum_payments(adjusted);

    LoanSummary {
        months_to_payoff: standard.len() as u32,
        adjusted_months_to_payoff: adjusted.len() as u32,
        total_interest,
        adjusted_total_interest,
        total_paid,
        adjusted_total_paid,
        interest_saved: round_cents(total_interest - adjusted_total_interest),
        months_saved: (standard.len() - adjusted.len()) as u32,
    }
}

fn sum_interest(schedule: &[Statement]) -> Money {
    round_cents(schedule.iter().map(|s| s.amount_toward_interest).sum())
}

fn sum_payments(schedule: &[Statement]) -> Money {
    round_cents(schedule.iter().map(|s| s.payment).sum())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
