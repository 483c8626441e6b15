use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use bank_account::account::AccountError;
use bank_account::bin_utils::Service;
use bank_account::command::Balance;
use bank_account::oracle::RandomBalanceOracle;
use tracing_subscriber::EnvFilter;

fn balance_arg(args: &[String], index: usize, name: &str) -> Result<Balance> {
    match args.get(index) {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid {name} balance `{value}`")),
        None => Ok(0),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let filename = args
        .get(1)
        .context("Expected a script file name as the first argument")?;
    let primary_balance = balance_arg(&args, 2, "primary")?;
    let counterparty_balance = balance_arg(&args, 3, "counterparty")?;
    let file = File::open(filename).with_context(|| format!("Failed to open `{filename}`"))?;

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        primary_balance,
        counterparty_balance,
        oracle: Arc::new(RandomBalanceOracle::default()),
        error_printer: Box::new(|line, err| match err {
            AccountError::Command(err) => eprintln!("Error at line {line}: {err}"),
            // rejected by the account itself, the script is still valid
            err => tracing::info!(line, %err, "operation rejected"),
        }),
    };
    service.run().await
}
