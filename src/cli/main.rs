//! Circulation desk from the command line.
//!
//! ```bash
//! circulation sync 9780441013593
//! circulation add-copies 9780441013593 3
//! circulation register ada@example.org --first-name Ada --last-name Lovelace
//! circulation checkout 9780441013593 1
//! circulation return 9780441013593 1
//! circulation loans 1
//! circulation overdue --page-size 20
//! ```
//!
//! The memory store only lives for one invocation; point `CIRCULATION_STORE` (or
//! `--store`) at a local DynamoDB to keep state between commands.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use circulation::catalog::command::add_copies_cmd::{AddCopiesCommand, AddCopiesCommandRequest};
use circulation::catalog::command::search_books_cmd::{SearchBooksCommand, SearchBooksCommandRequest};
use circulation::catalog::command::sync_book_cmd::{SyncBookCommand, SyncBookCommandRequest};
use circulation::catalog::factory::create_catalog_service;
use circulation::checkout::command::active_loans_cmd::{ActiveLoansCommand, ActiveLoansCommandRequest};
use circulation::checkout::command::checkout_book_cmd::{CheckoutBookCommand, CheckoutBookCommandRequest};
use circulation::checkout::command::return_book_cmd::{ReturnBookCommand, ReturnBookCommandRequest};
use circulation::checkout::domain::CirculationService;
use circulation::checkout::factory::create_circulation_service;
use circulation::core::command::Command;
use circulation::core::domain::Configuration;
use circulation::core::repository::{RepositoryStore, StoreHandle};
use circulation::patrons::command::find_patron_cmd::{FindPatronCommand, FindPatronCommandRequest};
use circulation::patrons::command::get_patron_cmd::{GetPatronCommand, GetPatronCommandRequest};
use circulation::patrons::command::register_patron_cmd::{RegisterPatronCommand, RegisterPatronCommandRequest};
use circulation::patrons::factory::create_patron_service;
use circulation::utils::logs::setup_cli_tracing;

/// Library circulation desk: catalog, patrons, checkouts and returns
#[derive(Parser)]
#[command(name = "circulation")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Branch whose configuration is loaded
    #[arg(long, default_value = "main", global = true)]
    branch: String,

    /// Overrides the configured store
    #[arg(long, global = true)]
    store: Option<StoreArg>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a title to the catalog from upstream metadata
    Sync {
        isbn: String,
    },

    /// Add copies of a catalogued title
    AddCopies {
        isbn: String,
        count: i64,
    },

    /// Lend a copy to a patron
    Checkout {
        isbn: String,
        patron_id: i64,
    },

    /// Take a copy back, assessing a fine when overdue
    Return {
        isbn: String,
        patron_id: i64,
    },

    /// Show the open loans of a patron
    Loans {
        patron_id: i64,
    },

    /// Register a new patron
    Register {
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },

    /// Look up a patron by id or email
    Patron {
        #[arg(long, conflicts_with = "email")]
        id: Option<i64>,
        #[arg(long)]
        email: Option<String>,
    },

    /// Search available titles by isbn or title
    Search {
        term: String,
    },

    /// List loans past their due date
    Overdue {
        #[arg(long)]
        page: Option<String>,
        #[arg(long, default_value_t = 50)]
        page_size: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreArg {
    Memory,
    LocalDynamodb,
    Dynamodb,
}

impl StoreArg {
    fn to_store(self) -> RepositoryStore {
        match self {
            StoreArg::Memory => RepositoryStore::Memory,
            StoreArg::LocalDynamodb => RepositoryStore::LocalDynamoDB,
            StoreArg::Dynamodb => RepositoryStore::DynamoDB,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_cli_tracing(cli.verbose);

    let mut config = Configuration::load(cli.branch.as_str()).context("failed to load configuration")?;
    if let Some(store) = cli.store {
        config.store = store.to_store();
    }
    let handle = StoreHandle::connect(config.store).await.context("failed to connect store")?;

    match cli.command {
        Commands::Sync { isbn } => {
            let cmd = SyncBookCommand::new(create_catalog_service(&config, &handle).await);
            print_json(&cmd.execute(SyncBookCommandRequest::new(isbn.as_str())).await?)?;
        }

        Commands::AddCopies { isbn, count } => {
            let cmd = AddCopiesCommand::new(create_catalog_service(&config, &handle).await);
            print_json(&cmd.execute(AddCopiesCommandRequest::new(isbn.as_str(), count)).await?)?;
        }

        Commands::Checkout { isbn, patron_id } => {
            let cmd = CheckoutBookCommand::new(create_circulation_service(&config, &handle).await);
            print_json(&cmd.execute(CheckoutBookCommandRequest::new(isbn.as_str(), patron_id)).await?)?;
        }

        Commands::Return { isbn, patron_id } => {
            let cmd = ReturnBookCommand::new(create_circulation_service(&config, &handle).await);
            print_json(&cmd.execute(ReturnBookCommandRequest::new(isbn.as_str(), patron_id)).await?)?;
        }

        Commands::Loans { patron_id } => {
            let cmd = ActiveLoansCommand::new(create_circulation_service(&config, &handle).await);
            print_json(&cmd.execute(ActiveLoansCommandRequest::new(patron_id)).await?)?;
        }

        Commands::Register { email, first_name, last_name } => {
            let cmd = RegisterPatronCommand::new(create_patron_service(&config, &handle).await);
            let req = RegisterPatronCommandRequest::new(first_name.as_str(), last_name.as_str(), email.as_str());
            print_json(&cmd.execute(req).await?)?;
        }

        Commands::Patron { id, email } => {
            match (id, email) {
                (Some(patron_id), _) => {
                    let cmd = GetPatronCommand::new(create_patron_service(&config, &handle).await);
                    print_json(&cmd.execute(GetPatronCommandRequest::new(patron_id)).await?)?;
                }
                (None, Some(email)) => {
                    let cmd = FindPatronCommand::new(create_patron_service(&config, &handle).await);
                    print_json(&cmd.execute(FindPatronCommandRequest::new(email.as_str())).await?)?;
                }
                (None, None) => bail!("either --id or --email is required"),
            }
        }

        Commands::Search { term } => {
            let cmd = SearchBooksCommand::new(create_catalog_service(&config, &handle).await);
            print_json(&cmd.execute(SearchBooksCommandRequest::new(term.as_str())).await?)?;
        }

        Commands::Overdue { page, page_size } => {
            let svc = create_circulation_service(&config, &handle).await;
            let res = svc.overdue_loans(page.as_deref(), page_size).await?;
            print_json(&res.records)?;
            if let Some(next_page) = res.next_page {
                eprintln!("more results with --page '{}'", next_page);
            }
        }
    }

    Ok(())
}
