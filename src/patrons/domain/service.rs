use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use tracing::{info, warn};
use crate::checkout::repository::LoanRepository;
use crate::core::domain::Configuration;
use crate::core::events::DomainEvent;
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::events::EventPublisher;
use crate::patrons::domain::model::PatronEntity;
use crate::patrons::domain::PatronService;
use crate::patrons::dto::{PatronDto, PatronSummary};
use crate::patrons::normalize_email;
use crate::patrons::repository::PatronRepository;
use crate::utils::date::Clock;

pub(crate) struct PatronServiceImpl {
    branch_id: String,
    patron_repository: Box<dyn PatronRepository>,
    loan_repository: Box<dyn LoanRepository>,
    events_publisher: Box<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl PatronServiceImpl {
    pub(crate) fn new(config: &Configuration, patron_repository: Box<dyn PatronRepository>,
                      loan_repository: Box<dyn LoanRepository>,
                      events_publisher: Box<dyn EventPublisher>, clock: Arc<dyn Clock>) -> Self {
        PatronServiceImpl {
            branch_id: config.branch_id.to_string(),
            patron_repository,
            loan_repository,
            events_publisher,
            clock,
        }
    }

    async fn summarize(&self, patron: &PatronEntity) -> LibraryResult<PatronSummary> {
        let active_loans = self.loan_repository.find_open_loans(patron.patron_id).await?.len();
        Ok(PatronSummary { patron: PatronDto::from(patron), active_loans })
    }
}

#[async_trait]
impl PatronService for PatronServiceImpl {
    async fn register_patron(&self, first_name: &str, last_name: &str, email: &str) -> LibraryResult<PatronDto> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(LibraryError::validation("email must not be empty", Some("400".to_string())));
        }
        if self.patron_repository.find_by_email(email.as_str()).await?.is_some() {
            return Err(LibraryError::duplicate_key(
                format!("patron with email {} already exists", email).as_str()));
        }
        let patron_id = self.patron_repository.next_id().await?;
        let patron = PatronEntity::new(patron_id, first_name, last_name, email.as_str(), self.clock.now());
        self.patron_repository.create(&patron).await?;
        info!("registered patron {}", patron.patron_id);

        let dto = PatronDto::from(&patron);
        let metadata = HashMap::from([("branch_id".to_string(), self.branch_id.to_string())]);
        match DomainEvent::added("patron_registered", "patrons", dto.patron_id.to_string().as_str(), &metadata, &dto) {
            Ok(event) => {
                if let Err(err) = self.events_publisher.publish(&event).await {
                    warn!("failed to publish patron_registered {}: {}", dto.patron_id, err);
                }
            }
            Err(err) => warn!("failed to build patron_registered event: {}", err),
        }
        Ok(dto)
    }

    async fn find_patron_by_id(&self, patron_id: i64) -> LibraryResult<PatronSummary> {
        let patron = self.patron_repository.get(patron_id.to_string().as_str()).await?;
        self.summarize(&patron).await
    }

    async fn find_patron_by_email(&self, email: &str) -> LibraryResult<PatronSummary> {
        match self.patron_repository.find_by_email(email).await? {
            Some(patron) => self.summarize(&patron).await,
            None => Err(LibraryError::not_found(format!("patron not found for {}", email).as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use chrono::Utc;
    use crate::checkout::domain::model::LoanEntity;
    use crate::checkout::factory::create_loan_repository;
    use crate::core::domain::Configuration;
    use crate::core::library::LibraryError;
    use crate::core::repository::{Repository, StoreHandle};
    use crate::gateway::logs::LogPublisher;
    use crate::patrons::domain::PatronService;
    use crate::patrons::domain::service::PatronServiceImpl;
    use crate::patrons::factory::create_patron_repository;
    use crate::utils::date::SystemClock;

    fn patron_service(handle: &StoreHandle, publisher: &LogPublisher) -> PatronServiceImpl {
        PatronServiceImpl::new(&Configuration::new("test"), create_patron_repository(handle),
                               create_loan_repository(handle), Box::new(publisher.clone()), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn test_should_register_patrons_sequentially() {
        let publisher = LogPublisher::new();
        let patron_svc = patron_service(&StoreHandle::memory(), &publisher);
        let ada = patron_svc.register_patron("Ada", "Lovelace", "ada@example.org").await.expect("should register");
        let bob = patron_svc.register_patron("Bob", "Smith", "bob@example.org").await.expect("should register");
        assert_eq!(1, ada.patron_id);
        assert_eq!(2, bob.patron_id);
        assert_eq!(vec!["patron_registered".to_string(), "patron_registered".to_string()], publisher.published_names());
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_or_empty_email() {
        let patron_svc = patron_service(&StoreHandle::memory(), &LogPublisher::new());
        patron_svc.register_patron("Ada", "Lovelace", "ada@example.org").await.expect("should register");
        let res = patron_svc.register_patron("Ada", "Byron", " ADA@example.org").await;
        assert!(matches!(res, Err(LibraryError::DuplicateKey { .. })));
        let res = patron_svc.register_patron("No", "Email", "  ").await;
        assert!(matches!(res, Err(LibraryError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_should_find_patron_with_active_loans() {
        let handle = StoreHandle::memory();
        let patron_svc = patron_service(&handle, &LogPublisher::new());
        let ada = patron_svc.register_patron("Ada", "Lovelace", "ada@example.org").await.expect("should register");

        let now = Utc::now().naive_utc();
        let loans = create_loan_repository(&handle);
        loans.create(&LoanEntity::new("test", "isbn_1", ada.patron_id, now.date(), 14, now)).await.expect("should create loan");
        loans.create(&LoanEntity::new("test", "isbn_2", ada.patron_id, now.date(), 14, now)).await.expect("should create loan");

        let summary = patron_svc.find_patron_by_email("ada@example.org").await.expect("should find patron");
        assert_eq!(ada, summary.patron);
        assert_eq!(2, summary.active_loans);
        let summary = patron_svc.find_patron_by_id(ada.patron_id).await.expect("should find patron");
        assert_eq!(2, summary.active_loans);

        assert!(matches!(patron_svc.find_patron_by_email("nobody@example.org").await, Err(LibraryError::NotFound { .. })));
        assert!(matches!(patron_svc.find_patron_by_id(99).await, Err(LibraryError::NotFound { .. })));
    }
}
