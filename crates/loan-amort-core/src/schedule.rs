//! Schedule generation: the monthly balance-reduction loop and the
//! extra-payment overlay.
//!
//! `LoanSchedule` is the engine value. It is logically immutable: adding an
//! extra payment returns a new engine carrying the combined list, and never
//! touches the receiver, so any schedule produced earlier stays reproducible.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanAmortError;
use crate::loan::LoanParameters;
use crate::types::{round_cents, round_ratio, round_two, Money};
use crate::LoanAmortResult;

/// Balance at or below this is treated as paid off.
pub(crate) const PAYOFF_EPSILON: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A recurring principal-only payment beginning at a given month.
///
/// Once triggered it applies to that month and every month after, matching
/// how a recast commitment persists until payoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtraPayment {
    pub amount: Money,
    /// First month (1-based) the payment applies.
    pub start_month: u32,
}

/// One month of the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// 1-based month number.
    pub month: u32,
    pub starting_balance: Money,
    pub payment: Money,
    pub amount_toward_interest: Money,
    pub amount_toward_principal: Money,
    pub ending_balance: Money,
    /// Ending balance over asset value, as a 4-decimal fraction.
    pub loan_to_value: Decimal,
    pub loan_to_value_percentage: Decimal,
    /// Asset value less the ending balance.
    pub equity_value: Money,
    pub equity_percentage: Decimal,
}

/// The amortization engine: loan parameters, derived state, and the ordered
/// list of extra payments.
#[derive(Debug, Clone, Serialize)]
pub struct LoanSchedule {
    parameters: LoanParameters,
    down_payment: Money,
    loan_amount: Money,
    monthly_payment: Money,
    extra_payments: Vec<ExtraPayment>,
}

// ---------------------------------------------------------------------------
// Construction and extra-payment management
// ---------------------------------------------------------------------------

impl LoanSchedule {
    /// Validate the parameters and derive the engine state. The extra-payment
    /// list starts empty.
    pub fn new(parameters: LoanParameters) -> LoanAmortResult<Self> {
        parameters.validate()?;
        let down_payment = parameters.down_payment();
        let loan_amount = parameters.loan_amount();
        let monthly_payment = parameters.standard_monthly_payment();
        Ok(Self {
            parameters,
            down_payment,
            loan_amount,
            monthly_payment,
            extra_payments: Vec::new(),
        })
    }

    pub fn parameters(&self) -> &LoanParameters {
        &self.parameters
    }

    pub fn down_payment(&self) -> Money {
        self.down_payment
    }

    pub fn loan_amount(&self) -> Money {
        self.loan_amount
    }

    pub fn monthly_payment(&self) -> Money {
        self.monthly_payment
    }

    pub fn extra_payments(&self) -> &[ExtraPayment] {
        &self.extra_payments
    }

    pub fn total_months(&self) -> u32 {
        self.parameters.total_months()
    }

    /// Return a new engine carrying all prior extra payments plus this one,
    /// re-sorted ascending by start month. The stable sort keeps payments
    /// with equal start months in insertion order; they are summed when
    /// applied, not deduplicated. The already-derived state is copied, never
    /// recomputed, so an overridden payment survives repeated additions.
    pub fn with_extra_payment(&self, amount: Money, start_month: u32) -> LoanAmortResult<Self> {
        if amount <= Decimal::ZERO {
            return Err(LoanAmortError::InvalidExtraPayment(
                "extra payment amount must be positive".into(),
            ));
        }
        let total_months = self.total_months();
        if start_month < 1 || start_month > total_months {
            return Err(LoanAmortError::InvalidExtraPayment(format!(
                "start_month must be between 1 and {total_months}"
            )));
        }

        let mut extra_payments = self.extra_payments.clone();
        extra_payments.push(ExtraPayment {
            amount,
            start_month,
        });
        extra_payments.sort_by_key(|e| e.start_month);

        Ok(Self {
            parameters: self.parameters.clone(),
            down_payment: self.down_payment,
            loan_amount: self.loan_amount,
            monthly_payment: self.monthly_payment,
            extra_payments,
        })
    }

    // -----------------------------------------------------------------------
    // Schedule generation
    // -----------------------------------------------------------------------

    /// The standard month-by-month schedule, ignoring extra payments.
    pub fn standard_schedule(&self) -> Vec<Statement> {
        self.generate(false)
    }

    /// The schedule with extra payments applied. With none recorded this is
    /// the standard schedule, not an error.
    pub fn adjusted_schedule(&self) -> Vec<Statement> {
        if self.extra_payments.is_empty() {
            self.generate(false)
        } else {
            self.generate(true)
        }
    }

    fn generate(&self, include_extras: bool) -> Vec<Statement> {
        let monthly_rate = self.parameters.monthly_rate();
        let total_months = self.total_months();
        let mut statements = Vec::with_capacity(total_months as usize);
        let mut balance = self.loan_amount;

        for month in 1..=total_months {
            if balance <= PAYOFF_EPSILON {
                break;
            }

            let starting_balance = balance;
            let interest = starting_balance * monthly_rate;

            let mut payment = self.monthly_payment;
            if include_extras {
                // Cumulative: every extra payment whose start month has
                // passed contributes this month.
                payment += self
                    .extra_payments
                    .iter()
                    .filter(|e| e.start_month <= month)
                    .map(|e| e.amount)
                    .sum::<Decimal>();
            }

            // Final-payment clamp: never collect more than the remaining
            // balance plus this month's interest. This is what lands the
            // last row on an exact zero without a special-cased formula.
            if month == total_months || starting_balance + interest <= payment {
                payment = starting_balance + interest;
            }

            let principal = payment - interest;
            let ending_balance = starting_balance - principal;

            statements.push(self.build_statement(
                month,
                starting_balance,
                payment,
                interest,
                ending_balance,
            ));
            balance = ending_balance;
        }

        statements
    }

    fn build_statement(
        &self,
        month: u32,
        starting_balance: Money,
        payment: Money,
        interest: Money,
        ending_balance: Money,
    ) -> Statement {
        let asset_value = self.parameters.asset_value;
        let ltv = ending_balance / asset_value;
        let equity = asset_value - ending_balance;

        Statement {
            month,
            starting_balance: round_cents(starting_balance),
            payment: round_cents(payment),
            amount_toward_interest: round_cents(interest),
            amount_toward_principal: round_cents(payment - interest),
            ending_balance: round_cents(ending_balance),
            loan_to_value: round_ratio(ltv),
            loan_to_value_percentage: round_two(ltv * dec!(100)),
            equity_value: round_cents(equity),
            equity_percentage: round_two(equity / asset_value * dec!(100)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.02);

    fn standard_params() -> LoanParameters {
        LoanParameters {
            asset_value: dec!(300_000),
            percentage_put_down: dec!(20),
            interest_rate: dec!(5),
            term_in_years: 30,
            minimum_payment: None,
        }
    }

    fn standard_engine() -> LoanSchedule {
        LoanSchedule::new(standard_params()).unwrap()
    }

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    // -----------------------------------------------------------------------
    // 1. Month 1 starts at the loan amount
    // -----------------------------------------------------------------------
    #[test]
    fn test_month_one_starting_balance() {
        let schedule = standard_engine().standard_schedule();
        assert_eq!(schedule[0].month, 1);
        assert_eq!(schedule[0].starting_balance, dec!(240_000.00));
    }

    // -----------------------------------------------------------------------
    // 2. Length bounded by the term; final balance lands on zero
    // -----------------------------------------------------------------------
    #[test]
    fn test_schedule_length_and_final_balance() {
        let schedule = standard_engine().standard_schedule();
        assert!(schedule.len() <= 360);
        let last = schedule.last().unwrap();
        assert!(last.ending_balance >= Decimal::ZERO);
        assert!(last.ending_balance <= PAYOFF_EPSILON);
    }

    // -----------------------------------------------------------------------
    // 3. Per-row identity: interest + principal = payment
    // -----------------------------------------------------------------------
    #[test]
    fn test_row_payment_identity() {
        for row in standard_engine().standard_schedule() {
            assert_close(
                row.amount_toward_interest + row.amount_toward_principal,
                row.payment,
                TOL,
                &format!("month {} payment split", row.month),
            );
        }
    }

    // -----------------------------------------------------------------------
    // 4. Aggregate identity across the whole schedule
    // -----------------------------------------------------------------------
    #[test]
    fn test_aggregate_payment_identity() {
        let schedule = standard_engine().standard_schedule();
        let total_split: Decimal = schedule
            .iter()
            .map(|r| r.amount_toward_interest + r.amount_toward_principal)
            .sum();
        let total_payment: Decimal = schedule.iter().map(|r| r.payment).sum();
        assert_close(total_split, total_payment, dec!(0.1), "aggregate identity");
    }

    // -----------------------------------------------------------------------
    // 5. Balance decreases monotonically
    // -----------------------------------------------------------------------
    #[test]
    fn test_balance_monotonically_decreasing() {
        let schedule = standard_engine().standard_schedule();
        for window in schedule.windows(2) {
            assert!(
                window[1].ending_balance < window[0].ending_balance,
                "month {}: balance {} should fall below {}",
                window[1].month,
                window[1].ending_balance,
                window[0].ending_balance
            );
        }
    }

    // -----------------------------------------------------------------------
    // 6. LTV and equity derivation on the first row
    // -----------------------------------------------------------------------
    #[test]
    fn test_ltv_and_equity() {
        let schedule = standard_engine().standard_schedule();
        let first = &schedule[0];
        // Ending balance ~239,711.63 over 300,000 asset value.
        assert_close(
            first.loan_to_value,
            first.ending_balance / dec!(300_000),
            dec!(0.0001),
            "month 1 LTV",
        );
        assert_eq!(
            first.equity_value,
            round_cents(dec!(300_000) - first.ending_balance)
        );
        assert_close(
            first.loan_to_value_percentage + first.equity_percentage,
            dec!(100),
            dec!(0.02),
            "LTV% and equity% are complements",
        );
    }

    // -----------------------------------------------------------------------
    // 7. Adjusted schedule with no extras equals the standard schedule
    // -----------------------------------------------------------------------
    #[test]
    fn test_adjusted_without_extras_is_standard() {
        let engine = standard_engine();
        assert_eq!(engine.adjusted_schedule(), engine.standard_schedule());
    }

    // -----------------------------------------------------------------------
    // 8. An extra payment shortens the schedule and raises the payment
    // -----------------------------------------------------------------------
    #[test]
    fn test_extra_payment_shortens_schedule() {
        let engine = standard_engine();
        let baseline = engine.standard_schedule();

        let adjusted = engine
            .with_extra_payment(dec!(500), 1)
            .unwrap()
            .adjusted_schedule();

        assert!(adjusted.len() < baseline.len());
        // Well short of the clamp region, every payment carries the extra.
        for row in adjusted.iter().take(12) {
            assert_eq!(row.payment, baseline[0].payment + dec!(500.00));
        }
        let last = adjusted.last().unwrap();
        assert!(last.ending_balance <= PAYOFF_EPSILON);
    }

    // -----------------------------------------------------------------------
    // 9. An extra payment starting mid-term applies from that month onward
    // -----------------------------------------------------------------------
    #[test]
    fn test_extra_payment_applies_from_start_month() {
        let engine = standard_engine().with_extra_payment(dec!(250), 13).unwrap();
        let schedule = engine.adjusted_schedule();
        let standard_payment = engine.monthly_payment();

        assert_eq!(schedule[11].payment, standard_payment);
        assert_eq!(schedule[12].payment, standard_payment + dec!(250.00));
        assert_eq!(schedule[13].payment, standard_payment + dec!(250.00));
    }

    // -----------------------------------------------------------------------
    // 10. Duplicate start months are additive, not deduplicated
    // -----------------------------------------------------------------------
    #[test]
    fn test_duplicate_start_months_are_summed() {
        let engine = standard_engine()
            .with_extra_payment(dec!(100), 12)
            .unwrap()
            .with_extra_payment(dec!(100), 12)
            .unwrap();
        assert_eq!(engine.extra_payments().len(), 2);

        let schedule = engine.adjusted_schedule();
        assert_eq!(schedule[11].payment, engine.monthly_payment() + dec!(200.00));
    }

    // -----------------------------------------------------------------------
    // 11. The extra-payment list stays sorted by start month
    // -----------------------------------------------------------------------
    #[test]
    fn test_extra_payments_sorted_by_start_month() {
        let engine = standard_engine()
            .with_extra_payment(dec!(50), 24)
            .unwrap()
            .with_extra_payment(dec!(75), 6)
            .unwrap()
            .with_extra_payment(dec!(25), 12)
            .unwrap();

        let months: Vec<u32> = engine.extra_payments().iter().map(|e| e.start_month).collect();
        assert_eq!(months, vec![6, 12, 24]);
    }

    // -----------------------------------------------------------------------
    // 12. Adding an extra payment never mutates the receiver
    // -----------------------------------------------------------------------
    #[test]
    fn test_with_extra_payment_does_not_mutate_receiver() {
        let engine = standard_engine();
        let before = engine.standard_schedule();
        let before_adjusted = engine.adjusted_schedule();

        let _derived = engine.with_extra_payment(dec!(500), 1).unwrap();

        assert_eq!(engine.extra_payments().len(), 0);
        assert_eq!(engine.standard_schedule(), before);
        assert_eq!(engine.adjusted_schedule(), before_adjusted);
    }

    // -----------------------------------------------------------------------
    // 13. Extra-payment validation
    // -----------------------------------------------------------------------
    #[test]
    fn test_extra_payment_validation() {
        let engine = standard_engine();

        assert!(matches!(
            engine.with_extra_payment(Decimal::ZERO, 1),
            Err(LoanAmortError::InvalidExtraPayment(_))
        ));
        assert!(matches!(
            engine.with_extra_payment(dec!(-10), 1),
            Err(LoanAmortError::InvalidExtraPayment(_))
        ));

        for bad_month in [0, 361] {
            match engine.with_extra_payment(dec!(100), bad_month) {
                Err(LoanAmortError::InvalidExtraPayment(msg)) => {
                    assert!(
                        msg.contains("1 and 360"),
                        "message should state the valid range: {msg}"
                    );
                }
                other => panic!("expected InvalidExtraPayment, got {other:?}"),
            }
        }
    }

    // -----------------------------------------------------------------------
    // 14. Zero-rate loan: no interest, principal equals payment
    // -----------------------------------------------------------------------
    #[test]
    fn test_zero_rate_schedule() {
        let mut params = standard_params();
        params.interest_rate = Decimal::ZERO;
        let schedule = LoanSchedule::new(params).unwrap().standard_schedule();

        for row in &schedule {
            assert_eq!(row.amount_toward_interest, Decimal::ZERO);
            assert_eq!(row.amount_toward_principal, row.payment);
        }
        let last = schedule.last().unwrap();
        assert!(last.ending_balance <= PAYOFF_EPSILON);
        assert!(schedule.len() <= 360);
    }

    // -----------------------------------------------------------------------
    // 15. Payment override drives the loop (shorter payoff when higher)
    // -----------------------------------------------------------------------
    #[test]
    fn test_minimum_payment_override_in_schedule() {
        let mut params = standard_params();
        params.minimum_payment = Some(dec!(2000));
        let schedule = LoanSchedule::new(params).unwrap().standard_schedule();

        assert_eq!(schedule[0].payment, dec!(2000.00));
        assert!(schedule.len() < 360);
        assert!(schedule.last().unwrap().ending_balance <= PAYOFF_EPSILON);
    }

    // -----------------------------------------------------------------------
    // 16. 100% down: nothing financed, empty schedule
    // -----------------------------------------------------------------------
    #[test]
    fn test_full_down_payment_empty_schedule() {
        let mut params = standard_params();
        params.percentage_put_down = dec!(100);
        let engine = LoanSchedule::new(params).unwrap();

        assert_eq!(engine.loan_amount(), Decimal::ZERO);
        assert!(engine.standard_schedule().is_empty());
        assert!(engine.adjusted_schedule().is_empty());
    }

    // -----------------------------------------------------------------------
    // 17. A huge extra payment collapses the loan to a single clamped month
    // -----------------------------------------------------------------------
    #[test]
    fn test_oversized_extra_payment_clamps_to_one_month() {
        let engine = standard_engine()
            .with_extra_payment(dec!(500_000), 1)
            .unwrap();
        let schedule = engine.adjusted_schedule();

        assert_eq!(schedule.len(), 1);
        let only = &schedule[0];
        // Clamp: payment = starting balance + interest, ending exactly zero.
        assert_eq!(only.ending_balance, dec!(0.00));
        assert_eq!(
            only.payment,
            only.starting_balance + only.amount_toward_interest
        );
    }

    // -----------------------------------------------------------------------
    // 18. Derived state survives cloning through with_extra_payment
    // -----------------------------------------------------------------------
    #[test]
    fn test_derived_state_copied_not_recomputed() {
        let mut params = standard_params();
        params.minimum_payment = Some(dec!(1500));
        let engine = LoanSchedule::new(params).unwrap();
        let derived = engine
            .with_extra_payment(dec!(100), 1)
            .unwrap()
            .with_extra_payment(dec!(100), 2)
            .unwrap();

        assert_eq!(derived.monthly_payment(), engine.monthly_payment());
        assert_eq!(derived.loan_amount(), engine.loan_amount());
        assert_eq!(derived.down_payment(), engine.down_payment());
    }
}
