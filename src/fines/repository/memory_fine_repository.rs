use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::fines::domain::model::FineEntity;
use crate::fines::repository::FineRepository;
use crate::utils::ddb::FINES_TABLE;
use crate::utils::memory::{paginate, MemoryDatabase};

#[derive(Debug)]
pub struct MemoryFineRepository {
    db: Arc<MemoryDatabase>,
}

impl MemoryFineRepository {
    pub(crate) fn new(db: Arc<MemoryDatabase>) -> Self {
        Self {
            db,
        }
    }

    fn find(&self, attr: &str, value: String) -> LibraryResult<Vec<FineEntity>> {
        let mut fines: Vec<FineEntity> = self.db.scan(FINES_TABLE, &HashMap::from([(attr.to_string(), value)]))?;
        fines.sort_by(|a, b| a.fine_date.cmp(&b.fine_date).then_with(|| a.fine_id.cmp(&b.fine_id)));
        Ok(fines)
    }
}

#[async_trait]
impl Repository<FineEntity> for MemoryFineRepository {
    async fn create(&self, entity: &FineEntity) -> LibraryResult<usize> {
        self.db.insert(FINES_TABLE, entity.fine_id.as_str(), entity).map(|_| 1)
    }

    async fn get(&self, id: &str) -> LibraryResult<FineEntity> {
        self.db.get(FINES_TABLE, id)?.ok_or_else(||
            LibraryError::not_found(format!("fine not found for {}", id).as_str()))
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<FineEntity>> {
        let records = self.db.scan(FINES_TABLE, predicate)?;
        Ok(paginate(records, page, page_size))
    }
}

#[async_trait]
impl FineRepository for MemoryFineRepository {
    async fn fines_for_loan(&self, loan_id: &str) -> LibraryResult<Vec<FineEntity>> {
        self.find("loan_id", loan_id.to_string())
    }

    async fn fines_for_patron(&self, patron_id: i64) -> LibraryResult<Vec<FineEntity>> {
        self.find("patron_id", patron_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use crate::checkout::domain::model::LoanEntity;
    use crate::core::repository::Repository;
    use crate::fines::domain::model::FineEntity;
    use crate::fines::repository::FineRepository;
    use crate::fines::repository::memory_fine_repository::MemoryFineRepository;
    use crate::utils::memory::MemoryDatabase;

    #[tokio::test]
    async fn test_should_find_fines_by_loan_and_patron() {
        let fines_repo = MemoryFineRepository::new(Arc::new(MemoryDatabase::new()));
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let now = today.and_hms_opt(9, 0, 0).unwrap();
        let loan1 = LoanEntity::new("main", "isbn_1", 1, today, 14, now);
        let loan2 = LoanEntity::new("main", "isbn_2", 1, today, 14, now);
        let loan3 = LoanEntity::new("main", "isbn_1", 2, today, 14, now);
        for (loan, amount) in [(&loan1, dec!(0.25)), (&loan2, dec!(1.00)), (&loan3, dec!(0.50))] {
            let size = fines_repo.create(&FineEntity::new(loan, amount, now)).await.expect("should create fine");
            assert_eq!(1, size);
        }
        let by_loan = fines_repo.fines_for_loan(loan2.loan_id.as_str()).await.expect("should find fines");
        assert_eq!(1, by_loan.len());
        assert_eq!(dec!(1.00), by_loan[0].amount);
        let by_patron = fines_repo.fines_for_patron(1).await.expect("should find fines");
        assert_eq!(2, by_patron.len());
        let loaded = fines_repo.get(by_loan[0].fine_id.as_str()).await.expect("should get fine");
        assert_eq!(by_loan[0], loaded);
    }
}
