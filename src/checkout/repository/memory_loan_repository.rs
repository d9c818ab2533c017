use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::NaiveDate;
use crate::checkout::domain::model::LoanEntity;
use crate::checkout::repository::LoanRepository;
use crate::core::library::{LibraryError, LibraryResult, LoanStatus, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::date::DAY_FMT;
use crate::utils::ddb::LOANS_TABLE;
use crate::utils::memory::{paginate, MemoryDatabase};

#[derive(Debug)]
pub struct MemoryLoanRepository {
    db: Arc<MemoryDatabase>,
}

impl MemoryLoanRepository {
    pub(crate) fn new(db: Arc<MemoryDatabase>) -> Self {
        Self {
            db,
        }
    }

    fn find(&self, predicate: &HashMap<String, String>) -> LibraryResult<Vec<LoanEntity>> {
        let mut loans: Vec<LoanEntity> = self.db.scan(LOANS_TABLE, predicate)?;
        loans.sort_by(|a, b| a.checkout_date.cmp(&b.checkout_date).then_with(|| a.loan_id.cmp(&b.loan_id)));
        Ok(loans)
    }
}

#[async_trait]
impl Repository<LoanEntity> for MemoryLoanRepository {
    async fn create(&self, entity: &LoanEntity) -> LibraryResult<usize> {
        self.db.insert(LOANS_TABLE, entity.loan_id.as_str(), entity).map(|_| 1)
    }

    async fn get(&self, id: &str) -> LibraryResult<LoanEntity> {
        self.db.get(LOANS_TABLE, id)?.ok_or_else(||
            LibraryError::not_found(format!("loan not found for {}", id).as_str()))
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>> {
        Ok(paginate(self.find(predicate)?, page, page_size))
    }
}

#[async_trait]
impl LoanRepository for MemoryLoanRepository {
    async fn find_open_loans(&self, patron_id: i64) -> LibraryResult<Vec<LoanEntity>> {
        self.find(&HashMap::from([
            ("patron_id".to_string(), patron_id.to_string()),
            ("loan_status".to_string(), LoanStatus::Open.to_string()),
        ]))
    }

    async fn find_by_isbn(&self, isbn: &str) -> LibraryResult<Vec<LoanEntity>> {
        self.find(&HashMap::from([("isbn".to_string(), isbn.to_string())]))
    }

    async fn query_overdue(&self, today: NaiveDate,
                           page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>> {
        let mut loans = self.find(&HashMap::from([
            ("loan_status".to_string(), LoanStatus::Open.to_string()),
            ("due_date:<".to_string(), today.format(DAY_FMT).to_string()),
        ]))?;
        loans.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.loan_id.cmp(&b.loan_id)));
        Ok(paginate(loans, page, page_size))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use chrono::{Duration, NaiveDate};
    use crate::checkout::domain::model::LoanEntity;
    use crate::checkout::repository::LoanRepository;
    use crate::checkout::repository::memory_loan_repository::MemoryLoanRepository;
    use crate::core::library::LibraryError;
    use crate::core::repository::Repository;
    use crate::utils::memory::MemoryDatabase;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_should_create_get_loans() {
        let loans_repo = MemoryLoanRepository::new(Arc::new(MemoryDatabase::new()));
        let loan = LoanEntity::new("main", "isbn", 1, day(1), 14, day(1).and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(1, loans_repo.create(&loan).await.expect("should create loan"));
        assert_eq!(loan, loans_repo.get(loan.loan_id.as_str()).await.expect("should get loan"));
        assert!(matches!(loans_repo.create(&loan).await, Err(LibraryError::DuplicateKey { .. })));
    }

    #[tokio::test]
    async fn test_should_find_open_and_overdue_loans() {
        let loans_repo = MemoryLoanRepository::new(Arc::new(MemoryDatabase::new()));
        let now = day(1).and_hms_opt(9, 0, 0).unwrap();
        for i in 0..5 {
            let loan = LoanEntity::new("main", format!("isbn_{}", i).as_str(), 1, day(1 + i), 14, now);
            loans_repo.create(&loan).await.expect("should create loan");
        }
        let mut closed = LoanEntity::new("main", "isbn_0", 1, day(1), 14, now);
        closed.close(day(3), now);
        loans_repo.create(&closed).await.expect("should create loan");
        loans_repo.create(&LoanEntity::new("main", "isbn_0", 2, day(1), 14, now)).await.expect("should create loan");

        let open = loans_repo.find_open_loans(1).await.expect("should find loans");
        assert_eq!(5, open.len());
        assert_eq!(day(1), open[0].checkout_date);
        assert_eq!(3, loans_repo.find_by_isbn("isbn_0").await.expect("should find loans").len());

        // due dates are Jan 15..19 for patron 1 and Jan 15 for patron 2
        let overdue = loans_repo.query_overdue(day(1) + Duration::days(17), None, 10).await.expect("should query");
        assert_eq!(4, overdue.records.len());
        assert!(overdue.records.iter().all(|l| l.is_open()));
        assert_eq!(day(15), overdue.records[0].due_date);
        let page = loans_repo.query_overdue(day(1) + Duration::days(17), None, 3).await.expect("should query");
        assert_eq!(3, page.records.len());
        assert!(page.next_page.is_some());
    }
}
