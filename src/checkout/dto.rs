use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::checkout::domain::model::LoanEntity;
use crate::core::domain::Identifiable;
use crate::core::library::LoanStatus;
use crate::fines::domain::model::FineEntity;

// LoanDto is the loan as seen by callers of the checkout service.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LoanDto {
    pub loan_id: String,
    pub version: i64,
    pub branch_id: String,
    pub isbn: String,
    pub patron_id: i64,
    pub loan_status: LoanStatus,
    pub checkout_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl Identifiable for LoanDto {
    fn id(&self) -> String {
        self.loan_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl From<&LoanEntity> for LoanDto {
    fn from(other: &LoanEntity) -> LoanDto {
        LoanDto {
            loan_id: other.loan_id.to_string(),
            version: other.version,
            branch_id: other.branch_id.to_string(),
            isbn: other.isbn.to_string(),
            patron_id: other.patron_id,
            loan_status: other.loan_status,
            checkout_date: other.checkout_date,
            due_date: other.due_date,
            return_date: other.return_date,
        }
    }
}

// ActiveLoanDto is an open loan joined with the title of its book.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ActiveLoanDto {
    pub loan_id: String,
    pub isbn: String,
    pub title: String,
    pub checkout_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl ActiveLoanDto {
    pub fn new(loan: &LoanEntity, title: &str) -> Self {
        Self {
            loan_id: loan.loan_id.to_string(),
            isbn: loan.isbn.to_string(),
            title: title.to_string(),
            checkout_date: loan.checkout_date,
            due_date: loan.due_date,
        }
    }
}

// ReturnReceipt reports the outcome of a return. inventory_clamped is set when the
// returned copy did not fit under total_copies, which means the counters were already
// inconsistent before the return.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub loan: LoanDto,
    pub fine_assessed: bool,
    pub fine_amount: Decimal,
    pub days_late: i64,
    pub inventory_clamped: bool,
}

impl ReturnReceipt {
    pub fn new(loan: &LoanEntity, fine: Option<&FineEntity>, days_late: i64, inventory_clamped: bool) -> Self {
        Self {
            loan: LoanDto::from(loan),
            fine_assessed: fine.is_some(),
            fine_amount: fine.map(|f| f.amount).unwrap_or(Decimal::ZERO),
            days_late,
            inventory_clamped,
        }
    }
}
