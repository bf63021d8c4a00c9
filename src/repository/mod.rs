//! SQL access. Every function takes `&mut MySqlConnection` so it can run on a
//! pooled connection or inside an open transaction (`&mut *tx`).

pub mod audit;
pub mod employee;
pub mod holiday;
pub mod leave;
pub mod leave_balance;
pub mod leave_type;
pub mod payroll;
pub mod settings;

/// A write referenced a row that does not exist (MySQL 1452). Duplicate keys
/// share SQLSTATE 23000 with this, so match on the error kind instead.
pub fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_foreign_key_violation(),
        _ => false,
    }
}
