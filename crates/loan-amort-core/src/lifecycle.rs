//! Lifecycle position: where a loan sits in its schedule on a given date.
//!
//! The month difference is whole-months only (year and month components,
//! day-of-month ignored). This is a deliberate simplification, not a
//! calendar-accurate day count.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::schedule::{LoanSchedule, Statement};
use crate::types::{round_two, Money};

/// A loan's position within its (adjusted) schedule at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecyclePosition {
    /// 1-based month currently in progress. 0 when the schedule is empty.
    pub current_month: u32,
    /// Raw whole-month difference between the two dates; may be negative
    /// when the as-of date precedes the loan start.
    pub months_elapsed: i32,
    pub months_remaining: u32,
    pub years_remaining: Decimal,
    pub percentage_complete: Decimal,
    pub percentage_remaining: Decimal,
    /// The statement for the current month, if the schedule has one.
    pub statement: Option<Statement>,
    pub current_balance: Money,
}

/// Whole-month difference between two dates, ignoring day-of-month.
fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32)
}

impl LoanSchedule {
    /// Locate the loan's position in its adjusted schedule given the loan
    /// start date and the as-of date. Out-of-range dates clamp to the first
    /// and last scheduled months.
    pub fn position_by_date(
        &self,
        loan_start_date: NaiveDate,
        current_date: NaiveDate,
    ) -> LifecyclePosition {
        let schedule = self.adjusted_schedule();
        let months_elapsed = months_between(loan_start_date, current_date);

        if schedule.is_empty() {
            // Nothing financed: no statements to point at.
            return LifecyclePosition {
                current_month: 0,
                months_elapsed,
                months_remaining: 0,
                years_remaining: Decimal::ZERO,
                percentage_complete: dec!(100),
                percentage_remaining: Decimal::ZERO,
                statement: None,
                current_balance: self.loan_amount(),
            };
        }

        let schedule_len = schedule.len() as i32;
        let clamped = months_elapsed.clamp(0, schedule_len - 1);
        let current_month = clamped as u32 + 1;
        let months_remaining = schedule_len as u32 - current_month;

        let percentage_complete = round_two(
            Decimal::from(clamped) / Decimal::from(schedule_len) * dec!(100),
        );
        let statement = schedule.into_iter().nth(clamped as usize);
        let current_balance = statement
            .as_ref()
            .map(|s| s.ending_balance)
            .unwrap_or_else(|| self.loan_amount());

        LifecyclePosition {
            current_month,
            months_elapsed,
            months_remaining,
            years_remaining: round_two(Decimal::from(months_remaining) / dec!(12)),
            percentage_complete,
            percentage_remaining: dec!(100) - percentage_complete,
            statement,
            current_balance,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::LoanParameters;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn standard_engine() -> LoanSchedule {
        LoanSchedule::new(LoanParameters {
            asset_value: dec!(300_000),
            percentage_put_down: dec!(20),
            interest_rate: dec!(5),
            term_in_years: 30,
            minimum_payment: None,
        })
        .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // -----------------------------------------------------------------------
    // 1. Whole-month difference ignores day-of-month
    // -----------------------------------------------------------------------
    #[test]
    fn test_months_between_ignores_days() {
        assert_eq!(months_between(date(2020, 1, 1), date(2022, 6, 15)), 29);
        assert_eq!(months_between(date(2020, 1, 31), date(2020, 2, 1)), 1);
        assert_eq!(months_between(date(2020, 5, 1), date(2020, 5, 31)), 0);
        assert_eq!(months_between(date(2021, 3, 1), date(2020, 12, 1)), -3);
    }

    // -----------------------------------------------------------------------
    // 2. Reference scenario: 29 months into a 30-year loan
    // -----------------------------------------------------------------------
    #[test]
    fn test_position_reference_scenario() {
        let engine = standard_engine();
        let position = engine.position_by_date(date(2020, 1, 1), date(2022, 6, 15));

        assert_eq!(position.months_elapsed, 29);
        assert_eq!(position.current_month, 30);
        assert_eq!(position.months_remaining, 330);
        assert_eq!(position.years_remaining, dec!(27.5));
        assert_eq!(position.percentage_complete, dec!(8.06));
        assert_eq!(position.percentage_remaining, dec!(91.94));

        let statement = position.statement.expect("statement for month 30");
        assert_eq!(statement.month, 30);
        assert_eq!(position.current_balance, statement.ending_balance);
    }

    // -----------------------------------------------------------------------
    // 3. An as-of date before the loan start clamps to month 1
    // -----------------------------------------------------------------------
    #[test]
    fn test_position_before_start_clamps_to_first_month() {
        let engine = standard_engine();
        let position = engine.position_by_date(date(2020, 1, 1), date(2019, 6, 1));

        assert_eq!(position.months_elapsed, -7);
        assert_eq!(position.current_month, 1);
        assert_eq!(position.percentage_complete, dec!(0.00));
        assert_eq!(position.statement.unwrap().month, 1);
    }

    // -----------------------------------------------------------------------
    // 4. Dates past payoff clamp to the last scheduled month
    // -----------------------------------------------------------------------
    #[test]
    fn test_position_after_payoff_clamps_to_last_month() {
        let engine = standard_engine();
        let schedule_len = engine.adjusted_schedule().len() as u32;
        let position = engine.position_by_date(date(2020, 1, 1), date(2095, 1, 1));

        assert_eq!(position.current_month, schedule_len);
        assert_eq!(position.months_remaining, 0);
        assert_eq!(position.years_remaining, dec!(0));
        let statement = position.statement.unwrap();
        assert_eq!(statement.month, schedule_len);
        assert!(position.current_balance <= dec!(0.01));
    }

    // -----------------------------------------------------------------------
    // 5. Position tracks the adjusted schedule when extras exist
    // -----------------------------------------------------------------------
    #[test]
    fn test_position_uses_adjusted_schedule() {
        let engine = standard_engine().with_extra_payment(dec!(500), 1).unwrap();
        let adjusted_len = engine.adjusted_schedule().len() as u32;
        let position = engine.position_by_date(date(2020, 1, 1), date(2095, 1, 1));

        assert!(adjusted_len < 360);
        assert_eq!(position.current_month, adjusted_len);
    }

    // -----------------------------------------------------------------------
    // 6. Empty schedule: statement is None, balance falls back to loan amount
    // -----------------------------------------------------------------------
    #[test]
    fn test_position_empty_schedule() {
        let engine = LoanSchedule::new(LoanParameters {
            asset_value: dec!(300_000),
            percentage_put_down: dec!(100),
            interest_rate: dec!(5),
            term_in_years: 30,
            minimum_payment: None,
        })
        .unwrap();

        let position = engine.position_by_date(date(2020, 1, 1), date(2021, 1, 1));
        assert_eq!(position.current_month, 0);
        assert!(position.statement.is_none());
        assert_eq!(position.current_balance, engine.loan_amount());
    }
}
