//! PayArc command-line entry point

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    payarc::cli::run_cli().await
}
