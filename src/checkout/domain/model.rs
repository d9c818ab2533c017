use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::core::library::LoanStatus;
use crate::utils::date::{days_between, serializer};

// LoanEntity records one copy of a book lent to a patron. A loan is open while
// return_date is empty; closed loans are kept as history and never deleted.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LoanEntity {
    pub loan_id: String,
    pub version: i64,
    pub branch_id: String,
    pub isbn: String,
    pub patron_id: i64,
    pub loan_status: LoanStatus,
    pub checkout_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl LoanEntity {
    pub fn new(branch_id: &str, isbn: &str, patron_id: i64, today: NaiveDate,
               loan_period_days: i64, now: NaiveDateTime) -> Self {
        Self {
            loan_id: Uuid::new_v4().to_string(),
            version: 0,
            branch_id: branch_id.to_string(),
            isbn: isbn.to_string(),
            patron_id,
            loan_status: LoanStatus::Open,
            checkout_date: today,
            due_date: today + Duration::days(loan_period_days),
            return_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    // whole days past the due date, zero when returned on or before it
    pub fn days_late(&self, today: NaiveDate) -> i64 {
        days_between(self.due_date, today).max(0)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && self.due_date < today
    }

    pub fn close(&mut self, today: NaiveDate, now: NaiveDateTime) {
        self.return_date = Some(today);
        self.loan_status = LoanStatus::Returned;
        self.updated_at = now;
    }
}

impl Identifiable for LoanEntity {
    fn id(&self) -> String {
        self.loan_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// open loans of the same isbn and patron are served oldest first
pub(crate) fn earliest_open(loans: Vec<LoanEntity>) -> Option<LoanEntity> {
    loans.into_iter()
        .filter(LoanEntity::is_open)
        .min_by(|a, b| a.checkout_date.cmp(&b.checkout_date).then_with(|| a.loan_id.cmp(&b.loan_id)))
}
