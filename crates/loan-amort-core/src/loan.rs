//! Loan parameters: validation bounds and derived values.
//!
//! `LoanParameters` is the immutable input to the engine. Validation is
//! eager and ordered; every failure names the offending field. Derived
//! values (down payment, loan amount, standard monthly payment) are
//! computed here and rounded to cents.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanAmortError;
use crate::types::{round_cents, Money, Rate};
use crate::LoanAmortResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lower bound on asset value (exclusive).
pub const MIN_ASSET_VALUE: Decimal = dec!(0);

/// Upper bound on asset value (inclusive).
pub const MAX_ASSET_VALUE: Decimal = dec!(100_000_000);

/// Upper bound on the annual interest rate, in percent.
pub const MAX_INTEREST_RATE: Decimal = dec!(30);

/// Shortest supported term, in years.
pub const MIN_TERM_YEARS: u32 = 1;

/// Longest supported term, in years.
pub const MAX_TERM_YEARS: u32 = 50;

// ---------------------------------------------------------------------------
// Input type
// ---------------------------------------------------------------------------

/// Parameters describing a fixed-rate, monthly-pay loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    /// Purchase price of the financed asset.
    pub asset_value: Money,
    /// Down payment as a percentage of the asset value (0-100).
    pub percentage_put_down: Decimal,
    /// Annual interest rate in percent units (e.g. 5 = 5%).
    pub interest_rate: Rate,
    /// Loan term in whole years.
    pub term_in_years: u32,
    /// Optional payment override replacing the annuity formula.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_payment: Option<Money>,
}

impl LoanParameters {
    /// Validate all fields, in declaration order. The first violation wins.
    pub fn validate(&self) -> LoanAmortResult<()> {
        if self.asset_value <= MIN_ASSET_VALUE || self.asset_value > MAX_ASSET_VALUE {
            return Err(LoanAmortError::InvalidParameter {
                field: "asset_value".into(),
                reason: format!(
                    "Asset value must be greater than {MIN_ASSET_VALUE} and at most {MAX_ASSET_VALUE}"
                ),
            });
        }
        if self.percentage_put_down < Decimal::ZERO || self.percentage_put_down > dec!(100) {
            return Err(LoanAmortError::InvalidParameter {
                field: "percentage_put_down".into(),
                reason: "Percentage put down must be between 0 and 100".into(),
            });
        }
        if self.interest_rate < Decimal::ZERO || self.interest_rate > MAX_INTEREST_RATE {
            return Err(LoanAmortError::InvalidParameter {
                field: "interest_rate".into(),
                reason: format!("Interest rate must be between 0 and {MAX_INTEREST_RATE} percent"),
            });
        }
        if self.term_in_years < MIN_TERM_YEARS || self.term_in_years > MAX_TERM_YEARS {
            return Err(LoanAmortError::InvalidParameter {
                field: "term_in_years".into(),
                reason: format!("Term must be between {MIN_TERM_YEARS} and {MAX_TERM_YEARS} years"),
            });
        }
        if let Some(min_payment) = self.minimum_payment {
            if min_payment <= Decimal::ZERO {
                return Err(LoanAmortError::InvalidParameter {
                    field: "minimum_payment".into(),
                    reason: "Minimum payment override must be positive".into(),
                });
            }
        }
        Ok(())
    }

    /// Total number of scheduled months.
    pub fn total_months(&self) -> u32 {
        self.term_in_years * 12
    }

    /// Monthly interest rate as a decimal fraction.
    pub fn monthly_rate(&self) -> Rate {
        self.interest_rate / dec!(100) / dec!(12)
    }

    /// Down payment, rounded to cents.
    pub fn down_payment(&self) -> Money {
        round_cents(self.asset_value * self.percentage_put_down / dec!(100))
    }

    /// Amount financed: asset value less the down payment, rounded to cents.
    pub fn loan_amount(&self) -> Money {
        round_cents(self.asset_value - self.down_payment())
    }

    /// The level monthly payment. Uses the override when provided, otherwise
    /// the closed-form annuity formula.
    pub fn standard_monthly_payment(&self) -> Money {
        match self.minimum_payment {
            Some(payment) => round_cents(payment),
            None => annuity_payment(self.loan_amount(), self.monthly_rate(), self.total_months()),
        }
    }
}

/// Level payment for an amortising loan:
/// `P = L * r * (1+r)^n / ((1+r)^n - 1)`.
/// Zero-rate loans pay straight-line `L / n` (no compounding).
fn annuity_payment(loan_amount: Money, monthly_rate: Rate, total_months: u32) -> Money {
    if total_months == 0 {
        return Decimal::ZERO;
    }
    if monthly_rate.is_zero() {
        return round_cents(loan_amount / Decimal::from(total_months));
    }
    let factor = (Decimal::ONE + monthly_rate).powd(Decimal::from(total_months));
    round_cents(loan_amount * monthly_rate * factor / (factor - Decimal::ONE))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
