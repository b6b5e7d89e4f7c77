//! unitbind - Assemble per-unit study PDFs from a book directory.

use clap::Parser;
use std::process;

use unitbind::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = unitbind::run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}
