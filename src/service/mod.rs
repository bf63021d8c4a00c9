//! Business logic. Pure calculations are plain functions; operations that
//! touch the database take the pool and own their transaction.

pub mod calendar;
pub mod leave;
pub mod leave_type;
pub mod ledger;
pub mod payroll;
pub mod reconciler;
pub mod span;
