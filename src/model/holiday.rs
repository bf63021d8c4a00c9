use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Company holiday. Administered elsewhere; read-only input to the calendar.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Holiday {
    pub id: u64,
    pub name: String,
    pub date: NaiveDate,
    /// Weekday name derived when the holiday was stored.
    pub day: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
}
