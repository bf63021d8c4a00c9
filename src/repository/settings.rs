use sqlx::MySqlConnection;

/// Latest configured working days per month, if any row exists.
pub async fn working_days_per_month(conn: &mut MySqlConnection) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        r#"
        SELECT working_days_per_month
        FROM company_settings
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(conn)
    .await
}
