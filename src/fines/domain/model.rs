use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::checkout::domain::model::LoanEntity;
use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

// FineEntity is assessed once, when an overdue loan is returned. Payment is tracked
// elsewhere so payment_date stays empty here.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FineEntity {
    pub fine_id: String,
    pub loan_id: String,
    pub patron_id: i64,
    pub isbn: String,
    pub amount: Decimal,
    pub fine_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
}

impl FineEntity {
    pub fn new(loan: &LoanEntity, amount: Decimal, now: NaiveDateTime) -> Self {
        Self {
            fine_id: Uuid::new_v4().to_string(),
            loan_id: loan.loan_id.to_string(),
            patron_id: loan.patron_id,
            isbn: loan.isbn.to_string(),
            amount,
            fine_date: now.date(),
            payment_date: None,
            created_at: now,
        }
    }
}

impl Identifiable for FineEntity {
    fn id(&self) -> String {
        self.fine_id.to_string()
    }

    fn version(&self) -> i64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use crate::checkout::domain::model::LoanEntity;
    use crate::fines::domain::model::FineEntity;

    #[tokio::test]
    async fn test_should_build_fine_for_loan() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let now = today.and_hms_opt(10, 0, 0).unwrap();
        let loan = LoanEntity::new("main", "isbn", 7, today, 14, now);
        let fine = FineEntity::new(&loan, dec!(0.75), now);
        assert_eq!(loan.loan_id, fine.loan_id);
        assert_eq!(7, fine.patron_id);
        assert_eq!(today, fine.fine_date);
        assert!(fine.payment_date.is_none());
    }
}
