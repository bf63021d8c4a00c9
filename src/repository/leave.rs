use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::MySqlConnection;

use crate::model::leave_request::{
    ApprovedLeaveSpan, LeaveListingRow, LeaveRow, LeaveScope, LeaveStatus,
};

const COLUMNS: &str = "id, employee_id, leave_type_id, timing_id, start_date, end_date, days, \
                       status, reason, charged_days";

const LISTING: &str = r#"
    SELECT
        l.id,
        l.employee_id,
        CONCAT(e.first_name, ' ', e.last_name) AS employee,
        lt.name AS leave_type,
        lt.is_paid,
        l.timing_id,
        l.start_date,
        l.end_date,
        l.days,
        l.status,
        l.reason,
        l.created_at AS applied_at
    FROM leave_requests l
    JOIN employees e ON l.employee_id = e.id
    JOIN leave_types lt ON l.leave_type_id = lt.id
"#;

pub struct NewLeave<'a> {
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub timing_id: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Decimal,
    pub reason: &'a str,
}

pub async fn insert(conn: &mut MySqlConnection, leave: &NewLeave<'_>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, leave_type_id, timing_id, start_date, end_date, days, status, reason)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(leave.employee_id)
    .bind(leave.leave_type_id)
    .bind(leave.timing_id)
    .bind(leave.start_date)
    .bind(leave.end_date)
    .bind(leave.days)
    .bind(LeaveStatus::Pending.as_ref())
    .bind(leave.reason)
    .execute(conn)
    .await?;
    Ok(result.last_insert_id())
}

pub async fn find(conn: &mut MySqlConnection, leave_id: u64) -> Result<Option<LeaveRow>, sqlx::Error> {
    let query = format!("SELECT {COLUMNS} FROM leave_requests WHERE id = ?");
    sqlx::query_as::<_, LeaveRow>(&query)
        .bind(leave_id)
        .fetch_optional(conn)
        .await
}

pub async fn find_for_update(
    conn: &mut MySqlConnection,
    leave_id: u64,
) -> Result<Option<LeaveRow>, sqlx::Error> {
    let query = format!("SELECT {COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE");
    sqlx::query_as::<_, LeaveRow>(&query)
        .bind(leave_id)
        .fetch_optional(conn)
        .await
}

/// Ids of the employee's pending or approved leaves intersecting
/// `[start, end]`, optionally ignoring one leave (the one being edited).
pub async fn overlapping(
    conn: &mut MySqlConnection,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
    exclude_id: Option<u64>,
) -> Result<Vec<u64>, sqlx::Error> {
    sqlx::query_scalar::<_, u64>(
        r#"
        SELECT id
        FROM leave_requests
        WHERE employee_id = ?
        AND status IN (?, ?)
        AND start_date <= ?
        AND end_date >= ?
        AND id <> ?
        "#,
    )
    .bind(employee_id)
    .bind(LeaveStatus::Pending.as_ref())
    .bind(LeaveStatus::Approved.as_ref())
    .bind(end)
    .bind(start)
    .bind(exclude_id.unwrap_or(0))
    .fetch_all(conn)
    .await
}

/// Rewrites a pending leave owned by `employee_id`. Zero rows means it is not
/// pending, not theirs, or gone.
pub async fn update_pending(
    conn: &mut MySqlConnection,
    leave_id: u64,
    leave: &NewLeave<'_>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET leave_type_id = ?, timing_id = ?, start_date = ?, end_date = ?,
            days = ?, reason = ?, updated_at = NOW()
        WHERE id = ?
        AND employee_id = ?
        AND status = ?
        "#,
    )
    .bind(leave.leave_type_id)
    .bind(leave.timing_id)
    .bind(leave.start_date)
    .bind(leave.end_date)
    .bind(leave.days)
    .bind(leave.reason)
    .bind(leave_id)
    .bind(leave.employee_id)
    .bind(LeaveStatus::Pending.as_ref())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Moves a pending leave to `status`, recording what was charged to the
/// ledger (zero unless an approved paid leave).
pub async fn decide(
    conn: &mut MySqlConnection,
    leave_id: u64,
    status: LeaveStatus,
    decided_by: u64,
    charged_days: Decimal,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, decided_by = ?, charged_days = ?, updated_at = NOW()
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(status.as_ref())
    .bind(decided_by)
    .bind(charged_days)
    .bind(leave_id)
    .bind(LeaveStatus::Pending.as_ref())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Approved → Withdrawn. Clears `charged_days`; the caller credits them back.
pub async fn withdraw(
    conn: &mut MySqlConnection,
    leave_id: u64,
    withdrawn_by: u64,
    reason: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, decided_by = ?, charged_days = 0, withdrawal_reason = ?,
            updated_at = NOW()
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(LeaveStatus::Withdrawn.as_ref())
    .bind(withdrawn_by)
    .bind(reason)
    .bind(leave_id)
    .bind(LeaveStatus::Approved.as_ref())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Leaves in scope starting on or after `from`, earliest first.
pub async fn list_from(
    conn: &mut MySqlConnection,
    scope: LeaveScope,
    from: NaiveDate,
) -> Result<Vec<LeaveListingRow>, sqlx::Error> {
    const ORDER: &str = "ORDER BY l.start_date ASC, l.created_at DESC";

    match scope {
        LeaveScope::Own(employee_id) => {
            let query = format!("{LISTING} WHERE l.employee_id = ? AND l.start_date >= ? {ORDER}");
            sqlx::query_as::<_, LeaveListingRow>(&query)
                .bind(employee_id)
                .bind(from)
                .fetch_all(conn)
                .await
        }
        LeaveScope::Team(manager_id) => {
            let query = format!(
                "{LISTING} WHERE (e.manager_id = ? OR l.employee_id = ?) AND l.start_date >= ? {ORDER}"
            );
            sqlx::query_as::<_, LeaveListingRow>(&query)
                .bind(manager_id)
                .bind(manager_id)
                .bind(from)
                .fetch_all(conn)
                .await
        }
        LeaveScope::All => {
            let query = format!("{LISTING} WHERE l.start_date >= ? {ORDER}");
            sqlx::query_as::<_, LeaveListingRow>(&query)
                .bind(from)
                .fetch_all(conn)
                .await
        }
    }
}

/// Approved leaves of the employee whose span intersects `[first, last]`.
pub async fn approved_spans(
    conn: &mut MySqlConnection,
    employee_id: u64,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<Vec<ApprovedLeaveSpan>, sqlx::Error> {
    sqlx::query_as::<_, ApprovedLeaveSpan>(
        r#"
        SELECT l.start_date, l.end_date, l.days, lt.is_paid
        FROM leave_requests l
        JOIN leave_types lt ON l.leave_type_id = lt.id
        WHERE l.employee_id = ?
        AND l.status = ?
        AND l.start_date <= ?
        AND l.end_date >= ?
        ORDER BY l.start_date
        "#,
    )
    .bind(employee_id)
    .bind(LeaveStatus::Approved.as_ref())
    .bind(last)
    .bind(first)
    .fetch_all(conn)
    .await
}
