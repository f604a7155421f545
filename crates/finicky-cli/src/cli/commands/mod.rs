//! CLI command handlers, one per file.

mod check;
mod resolve;
mod run;
mod test_url;

pub use check::run_check;
pub use resolve::run_resolve;
pub use run::run_daemon;
pub use test_url::run_test_url;
