use tracing_subscriber::EnvFilter;

const LOG_LEVEL_ENV: &str = "CIRCULATION_LOG";

// json logs for the lambda services, level comes from CIRCULATION_LOG (info by default)
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        // disable printing the name of the module in every log line.
        .with_target(false)
        // this needs to be set to false, otherwise ANSI color codes will
        // show up in a confusing manner in CloudWatch logs.
        .with_ansi(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .json()
        .init();
}

// human readable logs on stderr for the command line tool
pub fn setup_cli_tracing(verbose: bool) {
    let filter = if verbose { EnvFilter::new("debug") } else { env_filter() };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}
