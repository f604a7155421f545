use finicky_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Per-run log file if possible, stdout otherwise.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stdout();
        tracing::warn!("file logging unavailable, using stdout: {:#}", err);
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("finicky error: {:#}", err);
        std::process::exit(1);
    }
}
