use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::fines::domain::model::FineEntity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineDto {
    pub fine_id: String,
    pub loan_id: String,
    pub patron_id: i64,
    pub isbn: String,
    pub amount: Decimal,
    pub fine_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
}

impl From<&FineEntity> for FineDto {
    fn from(other: &FineEntity) -> FineDto {
        FineDto {
            fine_id: other.fine_id.to_string(),
            loan_id: other.loan_id.to_string(),
            patron_id: other.patron_id,
            isbn: other.isbn.to_string(),
            amount: other.amount,
            fine_date: other.fine_date,
            payment_date: other.payment_date,
        }
    }
}
