use chrono::NaiveDate;
use sqlx::MySqlConnection;

use crate::model::holiday::Holiday;

pub async fn between(
    conn: &mut MySqlConnection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Holiday>, sqlx::Error> {
    sqlx::query_as::<_, Holiday>(
        r#"
        SELECT id, name, date, day, type
        FROM holidays
        WHERE date BETWEEN ? AND ?
        ORDER BY date
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(conn)
    .await
}
