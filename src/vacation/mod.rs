//! Vacation rules: day counting, entitlement/accrual and the request workflow.
//!
//! Nothing in here touches the database; callers load the rows, apply these
//! functions and persist the result.

pub mod accrual;
pub mod calendar;
pub mod workflow;
