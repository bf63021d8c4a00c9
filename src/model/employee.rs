use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The slice of an employee record payroll needs. The directory itself is
/// owned elsewhere; this is read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PayrollEmployee {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub salary: Decimal,
    pub hire_date: NaiveDate,
}

impl PayrollEmployee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(hire_date: NaiveDate) -> PayrollEmployee {
        PayrollEmployee {
            id: 1,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            salary: Decimal::new(22000, 0),
            hire_date,
        }
    }

    #[test]
    fn full_name_joins_first_and_last() {
        let e = employee(NaiveDate::from_ymd_opt(2025, 3, 28).unwrap());
        assert_eq!(e.full_name(), "Jane Doe");
    }
}
