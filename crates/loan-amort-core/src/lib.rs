pub mod analysis;
pub mod error;
pub mod lifecycle;
pub mod loan;
pub mod schedule;
pub mod types;

pub use error::LoanAmortError;
pub use lifecycle::LifecyclePosition;
pub use loan::LoanParameters;
pub use schedule::{ExtraPayment, LoanSchedule, Statement};
pub use types::*;

/// Standard result type for all loan-amort operations
pub type LoanAmortResult<T> = Result<T, LoanAmortError>;
