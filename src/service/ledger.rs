//! Leave balance ledger.
//!
//! One row per (employee, leave type, year). `closing` is never taken from
//! input: every write path derives it from
//! `opening + accrued - used + adjusted`.
//!
//! Mutations lock the row with `SELECT … FOR UPDATE` and must run inside a
//! transaction that stays open until the caller's last write commits. Rows
//! are created with an upsert on the unique key (employee_id, leave_type_id,
//! year), so two callers racing to create the same row queue on it instead of
//! failing.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::leave_balance::{
    AdjustmentOutcome, BalanceSnapshot, LeaveAdjustment, LeaveBalance,
};
use crate::model::leave_type::LeaveType;
use crate::repository::{self, audit::AuditAction};

pub fn closing_for(opening: Decimal, accrued: Decimal, used: Decimal, adjusted: Decimal) -> Decimal {
    opening + accrued - used + adjusted
}

/// New `adjusted` and `closing` after adding a signed quantity.
pub fn adjust(balance: &LeaveBalance, quantity: Decimal) -> AdjustmentOutcome {
    let new_adjusted = balance.adjusted + quantity;
    AdjustmentOutcome {
        new_adjusted,
        new_closing: closing_for(balance.opening, balance.accrued, balance.used, new_adjusted),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Usage {
    pub used: Decimal,
    pub closing: Decimal,
}

/// New `used` and `closing` after consuming `days`.
pub fn consume(balance: &LeaveBalance, days: Decimal) -> Usage {
    let used = balance.used + days;
    Usage {
        used,
        closing: closing_for(balance.opening, balance.accrued, used, balance.adjusted),
    }
}

/// New `used` and `closing` after giving back `days` charged earlier.
/// `None` when more would be returned than was ever used.
pub fn release(balance: &LeaveBalance, days: Decimal) -> Option<Usage> {
    let used = balance.used - days;
    if used < Decimal::ZERO {
        return None;
    }
    Some(Usage {
        used,
        closing: closing_for(balance.opening, balance.accrued, used, balance.adjusted),
    })
}

pub fn ensure_available(balance: &LeaveBalance, days: Decimal) -> AppResult<()> {
    if days > balance.closing {
        return Err(AppError::InsufficientBalance {
            requested: days,
            available: balance.closing,
        });
    }
    Ok(())
}

/// Amount to shift existing balances by when an entitlement changes.
pub fn entitlement_delta(old_default: Decimal, new_default: Decimal) -> Option<Decimal> {
    let delta = new_default - old_default;
    (!delta.is_zero()).then_some(delta)
}

/// One entry per leave type. Types with no ledger row report their default
/// entitlement as both opening and closing.
pub fn snapshot(types: &[LeaveType], balances: &[LeaveBalance]) -> Vec<BalanceSnapshot> {
    let by_type: HashMap<u64, &LeaveBalance> =
        balances.iter().map(|b| (b.leave_type_id, b)).collect();

    types
        .iter()
        .map(|lt| match by_type.get(&lt.id) {
            Some(b) => BalanceSnapshot {
                leave_type_id: lt.id,
                leave_type: lt.name.clone(),
                opening: b.opening,
                accrued: b.accrued,
                used: b.used,
                adjusted: b.adjusted,
                closing: b.closing,
            },
            None => BalanceSnapshot {
                leave_type_id: lt.id,
                leave_type: lt.name.clone(),
                opening: lt.default_entitlement,
                accrued: Decimal::ZERO,
                used: Decimal::ZERO,
                adjusted: Decimal::ZERO,
                closing: lt.default_entitlement,
            },
        })
        .collect()
}

/// Fetches the ledger row under lock, creating it from the leave type's
/// current entitlement when absent. `conn` must be inside a transaction.
pub async fn get_or_create(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type_id: u64,
    year: i32,
) -> AppResult<LeaveBalance> {
    let created =
        match repository::leave_balance::seed_from_type(conn, employee_id, leave_type_id, year)
            .await
        {
            Ok(rows) => rows,
            Err(e) if repository::is_foreign_key_violation(&e) => {
                warn!(employee_id, leave_type_id, year, "Leave balance for unknown employee");
                return Err(AppError::not_found("employee"));
            }
            Err(e) => return Err(e.into()),
        };

    // No row after the upsert means the leave type does not exist.
    let balance =
        repository::leave_balance::find_for_update(conn, employee_id, leave_type_id, year)
            .await?
            .ok_or_else(|| AppError::not_found("leave type"))?;

    if created == 1 {
        info!(
            balance_id = balance.id,
            employee_id,
            leave_type_id,
            year,
            entitlement = %balance.opening,
            "Leave balance created"
        );
    }
    Ok(balance)
}

/// Adds `quantity` to `adjusted`, rederives `closing` and appends the audit
/// row. `balance` must have been read under lock on the same transaction.
pub async fn apply_adjustment(
    conn: &mut MySqlConnection,
    balance: &LeaveBalance,
    quantity: Decimal,
    reason: &str,
    actor_id: u64,
) -> AppResult<AdjustmentOutcome> {
    let outcome = adjust(balance, quantity);

    let updated = repository::leave_balance::update_adjustment(
        conn,
        balance.id,
        outcome.new_adjusted,
        outcome.new_closing,
    )
    .await?;
    if updated == 0 {
        // Cannot happen while the row lock is held.
        return Err(AppError::Internal(format!(
            "leave balance {} vanished during adjustment",
            balance.id
        )));
    }

    repository::leave_balance::insert_adjustment(
        conn,
        balance.employee_id,
        balance.leave_type_id,
        quantity,
        reason,
        actor_id,
        balance.year,
    )
    .await?;

    Ok(outcome)
}

/// Charges approved leave against a locked balance.
pub async fn record_usage(
    conn: &mut MySqlConnection,
    balance: &LeaveBalance,
    days: Decimal,
) -> AppResult<Usage> {
    let usage = consume(balance, days);
    let updated =
        repository::leave_balance::update_usage(conn, balance.id, usage.used, usage.closing)
            .await?;
    if updated == 0 {
        return Err(AppError::Internal(format!(
            "leave balance {} vanished while recording usage",
            balance.id
        )));
    }
    Ok(usage)
}

/// Credits withdrawn leave back to the row it was charged to. The row is
/// locked here; it must already exist since approval created or charged it.
pub async fn release_usage(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type_id: u64,
    year: i32,
    days: Decimal,
) -> AppResult<Usage> {
    let balance =
        repository::leave_balance::find_for_update(conn, employee_id, leave_type_id, year)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "no {year} balance of leave type {leave_type_id} for employee {employee_id} to credit"
                ))
            })?;

    let usage = release(&balance, days).ok_or_else(|| {
        AppError::InvalidState(format!(
            "cannot credit {days} days to balance {} with {} used",
            balance.id, balance.used
        ))
    })?;

    let updated =
        repository::leave_balance::update_usage(conn, balance.id, usage.used, usage.closing)
            .await?;
    if updated == 0 {
        return Err(AppError::Internal(format!(
            "leave balance {} vanished while crediting usage",
            balance.id
        )));
    }
    Ok(usage)
}

/// Re-bases every balance of the type and year on a new entitlement, keeping
/// what each employee has already used or been adjusted by. Batch update,
/// not row-locked.
pub async fn propagate_entitlement_change(
    conn: &mut MySqlConnection,
    leave_type_id: u64,
    old_default: Decimal,
    new_default: Decimal,
    year: i32,
) -> AppResult<u64> {
    let Some(delta) = entitlement_delta(old_default, new_default) else {
        return Ok(0);
    };

    let rows = repository::leave_balance::shift_entitlement(conn, leave_type_id, delta, year).await?;
    info!(
        leave_type_id,
        year,
        old = %old_default,
        new = %new_default,
        rows,
        "Leave balances re-based on new entitlement"
    );
    Ok(rows)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustBalance {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    /// Signed day count.
    #[schema(example = "-1.5", value_type = String)]
    pub quantity: Decimal,
    #[schema(example = "Carry-over correction")]
    pub reason: String,
    /// Defaults to the current year.
    #[schema(example = 2025)]
    pub year: Option<i32>,
}

/// Manual balance correction in one transaction: lock or create the row,
/// adjust it, log it.
pub async fn adjust_balance(
    pool: &MySqlPool,
    employee_id: u64,
    input: &AdjustBalance,
    year: i32,
    actor_id: u64,
) -> AppResult<AdjustmentOutcome> {
    if input.quantity.is_zero() {
        return Err(AppError::Validation("quantity must not be zero".into()));
    }
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation("reason is required".into()));
    }

    let mut tx = pool.begin().await?;

    if !repository::employee::exists(&mut *tx, employee_id).await? {
        return Err(AppError::not_found("employee"));
    }

    let balance = get_or_create(&mut *tx, employee_id, input.leave_type_id, year).await?;
    let outcome = apply_adjustment(&mut *tx, &balance, input.quantity, reason, actor_id).await?;
    repository::audit::record(&mut *tx, actor_id, AuditAction::Adjustment, "leave_balance").await?;

    tx.commit().await?;

    info!(
        employee_id,
        leave_type_id = input.leave_type_id,
        year,
        quantity = %input.quantity,
        new_closing = %outcome.new_closing,
        "Leave balance adjusted"
    );
    Ok(outcome)
}

pub async fn balance_snapshot(
    pool: &MySqlPool,
    employee_id: u64,
    year: i32,
) -> AppResult<Vec<BalanceSnapshot>> {
    let mut conn = pool.acquire().await?;
    let types = repository::leave_type::list(&mut conn).await?;
    let balances = repository::leave_balance::for_employee_year(&mut conn, employee_id, year).await?;
    Ok(snapshot(&types, &balances))
}

pub async fn adjustment_history(
    pool: &MySqlPool,
    employee_id: u64,
    year: i32,
) -> AppResult<Vec<LeaveAdjustment>> {
    let mut conn = pool.acquire().await?;
    Ok(repository::leave_balance::adjustments_for_employee_year(&mut conn, employee_id, year).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    fn seeded(entitlement: Decimal) -> LeaveBalance {
        LeaveBalance {
            id: 1,
            employee_id: 10,
            leave_type_id: 2,
            year: 2025,
            opening: entitlement,
            accrued: Decimal::ZERO,
            used: Decimal::ZERO,
            adjusted: Decimal::ZERO,
            closing: entitlement,
        }
    }

    fn leave_type(id: u64, name: &str, entitlement: i64) -> LeaveType {
        LeaveType {
            id,
            name: name.into(),
            is_paid: true,
            default_entitlement: d(entitlement, 0),
        }
    }

    #[test]
    fn positive_adjustment_raises_closing() {
        let outcome = adjust(&seeded(d(18, 0)), d(2, 0));
        assert_eq!(outcome.new_adjusted, d(2, 0));
        assert_eq!(outcome.new_closing, d(20, 0));
    }

    #[test]
    fn negative_adjustment_accounts_for_usage() {
        let mut balance = seeded(d(18, 0));
        balance.used = d(3, 0);
        balance.closing = d(15, 0);
        let outcome = adjust(&balance, d(-15, 1));
        assert_eq!(outcome.new_adjusted, d(-15, 1));
        assert_eq!(outcome.new_closing, d(135, 1));
    }

    #[test]
    fn usage_is_subtracted_from_closing() {
        let usage = consume(&seeded(d(18, 0)), d(25, 1));
        assert_eq!(usage.used, d(25, 1));
        assert_eq!(usage.closing, d(155, 1));
    }

    #[test]
    fn release_gives_back_charged_days() {
        let charged = consume(&seeded(d(18, 0)), d(25, 1));
        let mut balance = seeded(d(18, 0));
        balance.used = charged.used;
        balance.closing = charged.closing;

        let usage = release(&balance, d(25, 1)).unwrap();
        assert!(usage.used.is_zero());
        assert_eq!(usage.closing, d(18, 0));
    }

    #[test]
    fn release_beyond_used_is_refused() {
        let mut balance = seeded(d(18, 0));
        balance.used = d(1, 0);
        balance.closing = d(17, 0);
        assert_eq!(release(&balance, d(2, 0)), None);
    }

    #[test]
    fn requesting_more_than_closing_is_insufficient() {
        let balance = seeded(d(2, 0));
        assert!(ensure_available(&balance, d(2, 0)).is_ok());
        let err = ensure_available(&balance, d(25, 1)).unwrap_err();
        assert_eq!(err.kind(), "insufficient_balance");
    }

    #[test]
    fn entitlement_change_shifts_opening_and_closing_alike() {
        let delta = entitlement_delta(d(18, 0), d(20, 0)).unwrap();
        let mut balance = seeded(d(18, 0));
        balance.used = d(3, 0);
        balance.closing = d(15, 0);
        assert_eq!(balance.opening + delta, d(20, 0));
        assert_eq!(balance.closing + delta, d(17, 0));
        assert_eq!(
            closing_for(balance.opening + delta, balance.accrued, balance.used, balance.adjusted),
            d(17, 0)
        );
    }

    #[test]
    fn unchanged_entitlement_is_a_no_op() {
        assert_eq!(entitlement_delta(d(18, 0), d(18, 0)), None);
    }

    #[test]
    fn snapshot_falls_back_to_default_entitlement() {
        let types = vec![leave_type(1, "Annual", 18), leave_type(2, "Sick", 10)];
        let mut annual = seeded(d(18, 0));
        annual.leave_type_id = 1;
        annual.used = d(3, 0);
        annual.closing = d(15, 0);

        let snap = snapshot(&types, &[annual]);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].closing, d(15, 0));
        assert_eq!(snap[0].used, d(3, 0));
        assert_eq!(snap[1].leave_type, "Sick");
        assert_eq!(snap[1].opening, d(10, 0));
        assert_eq!(snap[1].closing, d(10, 0));
        assert!(snap[1].used.is_zero());
    }

    #[derive(Debug, Clone)]
    enum Step {
        Adjust(i64),
        Use(i64),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (-40i64..40).prop_map(Step::Adjust),
            (1i64..10).prop_map(Step::Use),
        ]
    }

    proptest! {
        #[test]
        fn closing_always_matches_formula(
            entitlement in 0i64..60,
            steps in prop::collection::vec(step(), 0..30),
        ) {
            let mut balance = seeded(d(entitlement, 0));
            for s in steps {
                match s {
                    // Half-day granularity.
                    Step::Adjust(halves) => {
                        let outcome = adjust(&balance, d(halves * 5, 1));
                        balance.adjusted = outcome.new_adjusted;
                        balance.closing = outcome.new_closing;
                    }
                    Step::Use(halves) => {
                        let usage = consume(&balance, d(halves * 5, 1));
                        balance.used = usage.used;
                        balance.closing = usage.closing;
                    }
                }
                prop_assert_eq!(
                    balance.closing,
                    balance.opening + balance.accrued - balance.used + balance.adjusted
                );
            }
        }
    }
}
