use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use rand::Rng;
use tracing::{error, info, warn};
use crate::books::domain::Book;
use crate::books::repository::BookRepository;
use crate::checkout::domain::CirculationService;
use crate::checkout::domain::model::LoanEntity;
use crate::checkout::dto::{ActiveLoanDto, LoanDto, ReturnReceipt};
use crate::checkout::repository::{CirculationStore, CirculationTransaction, LoanRepository};
use crate::core::domain::Configuration;
use crate::core::events::DomainEvent;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::fines::domain::FinePolicy;
use crate::fines::domain::model::FineEntity;
use crate::fines::dto::FineDto;
use crate::fines::repository::FineRepository;
use crate::gateway::events::EventPublisher;
use crate::utils::date::Clock;

const MAX_BACKOFF_MILLIS: u64 = 200;

// ReturnOutcome is what a committed return changed
struct ReturnOutcome {
    loan: LoanEntity,
    fine: Option<FineEntity>,
    days_late: i64,
    inventory_clamped: bool,
}

// CirculationServiceImpl runs checkout and return as single store transactions. It
// keeps no mutable state of its own, so one instance serves any number of callers.
pub(crate) struct CirculationServiceImpl {
    branch_id: String,
    loan_period_days: i64,
    max_tx_retries: u32,
    fine_policy: FinePolicy,
    store: Box<dyn CirculationStore>,
    loan_repository: Box<dyn LoanRepository>,
    fine_repository: Box<dyn FineRepository>,
    book_repository: Box<dyn BookRepository>,
    events_publisher: Box<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl CirculationServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(config: &Configuration, store: Box<dyn CirculationStore>,
                      loan_repository: Box<dyn LoanRepository>, fine_repository: Box<dyn FineRepository>,
                      book_repository: Box<dyn BookRepository>, events_publisher: Box<dyn EventPublisher>,
                      clock: Arc<dyn Clock>) -> Self {
        Self {
            branch_id: config.branch_id.to_string(),
            loan_period_days: config.loan_period_days,
            max_tx_retries: config.max_tx_retries,
            fine_policy: FinePolicy::from_config(config),
            store,
            loan_repository,
            fine_repository,
            book_repository,
            events_publisher,
            clock,
        }
    }

    // Re-runs the whole unit of work while the store reports a retryable conflict.
    async fn with_retries<T, F, Fut>(&self, operation: &str, mut attempt: F) -> LibraryResult<T>
        where F: FnMut() -> Fut, Fut: Future<Output=LibraryResult<T>> {
        let mut retries = 0;
        loop {
            match attempt().await {
                Err(err) if err.retryable() => {
                    if retries >= self.max_tx_retries {
                        warn!("{} gave up after {} attempts: {}", operation, retries + 1, err);
                        return Err(LibraryError::transaction_failed(
                            format!("{} gave up after {} attempts: {}", operation, retries + 1, err).as_str(),
                            Some("RetriesExhausted".to_string()), true));
                    }
                    retries += 1;
                    let delay = backoff_delay(retries);
                    warn!("{} conflicted, retry {} in {:?}: {}", operation, retries, delay, err);
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn try_checkout(&self, isbn: &str, patron_id: i64) -> LibraryResult<LoanEntity> {
        let mut tx = self.store.begin().await?;
        match self.checkout_in(tx.as_mut(), isbn, patron_id).await {
            Ok(loan) => {
                tx.commit().await?;
                Ok(loan)
            }
            Err(err) => {
                tx.rollback().await;
                Err(err)
            }
        }
    }

    async fn checkout_in(&self, tx: &mut dyn CirculationTransaction,
                         isbn: &str, patron_id: i64) -> LibraryResult<LoanEntity> {
        let now = self.clock.now();
        let mut book = tx.lock_book(isbn).await?.ok_or_else(||
            LibraryError::not_found(format!("book {} is not in the catalog", isbn).as_str()))?;
        if !book.is_available() {
            return Err(LibraryError::out_of_stock(
                format!("no copies of {} are available", isbn).as_str()));
        }
        if tx.lock_open_loan(isbn, patron_id).await?.is_some() {
            return Err(LibraryError::duplicate_key(
                format!("patron {} already borrowed {}", patron_id, isbn).as_str()));
        }
        book.take_copy(now)?;
        tx.update_book(&book).await?;
        let loan = LoanEntity::new(self.branch_id.as_str(), isbn, patron_id,
                                   now.date(), self.loan_period_days, now);
        tx.insert_loan(&loan).await?;
        Ok(loan)
    }

    async fn try_return(&self, isbn: &str, patron_id: i64) -> LibraryResult<ReturnOutcome> {
        let mut tx = self.store.begin().await?;
        match self.return_in(tx.as_mut(), isbn, patron_id).await {
            Ok(outcome) => {
                tx.commit().await?;
                Ok(outcome)
            }
            Err(err) => {
                tx.rollback().await;
                Err(err)
            }
        }
    }

    async fn return_in(&self, tx: &mut dyn CirculationTransaction,
                       isbn: &str, patron_id: i64) -> LibraryResult<ReturnOutcome> {
        let now = self.clock.now();
        let today = now.date();
        let book = tx.lock_book(isbn).await?;
        let mut loan = tx.lock_open_loan(isbn, patron_id).await?.ok_or_else(||
            LibraryError::no_active_loan(format!("patron {} has no open loan for {}", patron_id, isbn).as_str()))?;
        let mut book = match book {
            Some(book) => book,
            None => {
                error!("open loan {} references missing book {}", loan.loan_id, isbn);
                return Err(LibraryError::invariant_violation(
                    format!("open loan {} references missing book {}", loan.loan_id, isbn).as_str()));
            }
        };

        let days_late = loan.days_late(today);
        let fine = self.fine_policy.assess(days_late).map(|amount| FineEntity::new(&loan, amount, now));
        if let Some(fine) = &fine {
            tx.insert_fine(fine).await?;
        }
        loan.close(today, now);
        tx.close_loan(&loan).await?;

        let inventory_clamped = !book.restore_copy(now);
        if inventory_clamped {
            error!("return of loan {} found {} already at {} of {} copies, clamped",
                loan.loan_id, isbn, book.available_copies, book.total_copies);
        }
        tx.update_book(&book).await?;
        Ok(ReturnOutcome { loan, fine, days_late, inventory_clamped })
    }

    // Events go out after commit; a failed publish never undoes the transition.
    async fn publish(&self, event: serde_json::Result<DomainEvent>) {
        match event {
            Ok(event) => {
                if let Err(err) = self.events_publisher.publish(&event).await {
                    warn!("failed to publish {} {}: {}", event.name, event.key, err);
                }
            }
            Err(err) => {
                warn!("failed to build event: {}", err);
            }
        }
    }

    fn event_metadata(&self, isbn: &str, patron_id: i64) -> HashMap<String, String> {
        HashMap::from([
            ("branch_id".to_string(), self.branch_id.to_string()),
            ("isbn".to_string(), isbn.to_string()),
            ("patron_id".to_string(), patron_id.to_string()),
        ])
    }
}

fn validate_request(isbn: &str, patron_id: i64) -> LibraryResult<()> {
    if isbn.trim().is_empty() {
        return Err(LibraryError::validation("isbn must not be empty", Some("400".to_string())));
    }
    if patron_id <= 0 {
        return Err(LibraryError::validation(
            format!("patron id must be positive but was {}", patron_id).as_str(), Some("400".to_string())));
    }
    Ok(())
}

fn backoff_delay(retry: u32) -> Duration {
    let cap = (10u64 << retry.min(5)).min(MAX_BACKOFF_MILLIS);
    Duration::from_millis(rand::thread_rng().gen_range(cap / 2..=cap))
}

#[async_trait]
impl CirculationService for CirculationServiceImpl {
    async fn checkout(&self, isbn: &str, patron_id: i64) -> LibraryResult<LoanDto> {
        validate_request(isbn, patron_id)?;
        let loan = self.with_retries("checkout", move || self.try_checkout(isbn, patron_id)).await?;
        info!("patron {} checked out {} due {}", patron_id, isbn, loan.due_date);
        let dto = LoanDto::from(&loan);
        self.publish(DomainEvent::added(
            "loan_opened", "checkout", loan.loan_id.as_str(), &self.event_metadata(isbn, patron_id), &dto)).await;
        Ok(dto)
    }

    async fn returned(&self, isbn: &str, patron_id: i64) -> LibraryResult<ReturnReceipt> {
        validate_request(isbn, patron_id)?;
        let outcome = self.with_retries("return", move || self.try_return(isbn, patron_id)).await?;
        info!("patron {} returned {} {} days late", patron_id, isbn, outcome.days_late);
        let receipt = ReturnReceipt::new(&outcome.loan, outcome.fine.as_ref(),
                                         outcome.days_late, outcome.inventory_clamped);
        let metadata = self.event_metadata(isbn, patron_id);
        self.publish(DomainEvent::updated(
            "loan_closed", "checkout", outcome.loan.loan_id.as_str(), &metadata, &receipt)).await;
        if let Some(fine) = &outcome.fine {
            self.publish(DomainEvent::added(
                "fine_assessed", "fines", fine.fine_id.as_str(), &metadata, &FineDto::from(fine))).await;
        }
        Ok(receipt)
    }

    async fn active_loans_for(&self, patron_id: i64) -> LibraryResult<Vec<ActiveLoanDto>> {
        let loans = self.loan_repository.find_open_loans(patron_id).await?;
        let mut active = Vec::with_capacity(loans.len());
        for loan in &loans {
            let title = match self.book_repository.get(loan.isbn.as_str()).await {
                Ok(book) => book.title,
                Err(LibraryError::NotFound { .. }) => {
                    warn!("open loan {} references missing book {}", loan.loan_id, loan.isbn);
                    String::new()
                }
                Err(err) => return Err(err),
            };
            active.push(ActiveLoanDto::new(loan, title.as_str()));
        }
        Ok(active)
    }

    async fn active_loan_count(&self, patron_id: i64) -> LibraryResult<usize> {
        Ok(self.loan_repository.find_open_loans(patron_id).await?.len())
    }

    async fn loans_for_isbn(&self, isbn: &str) -> LibraryResult<Vec<LoanDto>> {
        let loans = self.loan_repository.find_by_isbn(isbn).await?;
        Ok(loans.iter().map(LoanDto::from).collect())
    }

    async fn overdue_loans(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>> {
        let res = self.loan_repository.query_overdue(self.clock.today(), page, page_size).await?;
        let records = res.records.iter().map(LoanDto::from).collect();
        Ok(PaginatedResult::new(page, page_size, res.next_page, records))
    }

    async fn fines_for_patron(&self, patron_id: i64) -> LibraryResult<Vec<FineDto>> {
        let fines = self.fine_repository.fines_for_patron(patron_id).await?;
        Ok(fines.iter().map(FineDto::from).collect())
    }

    async fn fines_for_loan(&self, loan_id: &str) -> LibraryResult<Vec<FineDto>> {
        let fines = self.fine_repository.fines_for_loan(loan_id).await?;
        Ok(fines.iter().map(FineDto::from).collect())
    }
}
