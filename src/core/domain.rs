use std::path::{Path, PathBuf};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::core::library::LibraryResult;
use crate::core::repository::RepositoryStore;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "CIRCULATION_ENV";
const CONFIG_DIR_ENV: &str = "CIRCULATION_CONFIG_DIR";

// Identifiable defines common traits that can be shared by persistent objects
pub trait Identifiable: Sync + Send {
    fn id(&self) -> String;
    fn version(&self) -> i64;
}

// Configuration abstracts config options for the circulation desk of a branch
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Configuration {
    pub branch_id: String,
    pub loan_period_days: i64,
    pub fine_rate_per_day: Decimal,
    pub cache_freshness_days: i64,
    pub max_tx_retries: u32,
    pub store: RepositoryStore,
    #[serde(default)]
    pub catalog_seed_path: Option<String>,
    #[serde(default)]
    pub events_topic_arn: Option<String>,
}

impl Configuration {
    pub fn new(branch_id: &str) -> Self {
        Configuration {
            branch_id: branch_id.to_string(),
            loan_period_days: 14,
            fine_rate_per_day: Decimal::new(25, 2),
            cache_freshness_days: 7,
            max_tx_retries: 5,
            store: RepositoryStore::Memory,
            catalog_seed_path: None,
            events_topic_arn: None,
        }
    }

    /// Layers `config/base.toml`, `config/<CIRCULATION_ENV>.toml` and `CIRCULATION_*`
    /// environment variables over the defaults of [`Configuration::new`].
    pub fn load(branch_id: &str) -> LibraryResult<Self> {
        // a missing `.env` is fine
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));
        Self::load_from(branch_id, config_dir.as_path(), environment.as_str())
    }

    pub(crate) fn load_from(branch_id: &str, config_dir: &Path, environment: &str) -> LibraryResult<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Config::try_from(&Configuration::new(branch_id))?)
            .add_source(config::File::from(config_dir.join("base.toml")).required(false))
            .add_source(config::File::from(config_dir.join(format!("{}.toml", environment))).required(false))
            .add_source(config::Environment::with_prefix("CIRCULATION").try_parsing(true))
            .build()?;
        let config: Configuration = cfg.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> LibraryResult<()> {
        if self.loan_period_days <= 0 {
            return Err(crate::core::library::LibraryError::validation(
                format!("loan_period_days must be positive but was {}", self.loan_period_days).as_str(), None));
        }
        if self.fine_rate_per_day.is_sign_negative() {
            return Err(crate::core::library::LibraryError::validation(
                format!("fine_rate_per_day must not be negative but was {}", self.fine_rate_per_day).as_str(), None));
        }
        if self.cache_freshness_days < 0 {
            return Err(crate::core::library::LibraryError::validation(
                format!("cache_freshness_days must not be negative but was {}", self.cache_freshness_days).as_str(), None));
        }
        Ok(())
    }
}
