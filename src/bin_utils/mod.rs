//! Drives a pair of accounts from an operation script. It could live in its own
//! crate next to the binary, but the integration tests use it too, so it stays here.

use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use csv_parser::{AccountRole, CsvOperationParser, Step};
use csv_printer::{BalanceRow, print_balances};

use crate::account::{Account, AccountError};
use crate::command::Balance;
use crate::oracle::BalanceOracle;

pub mod csv_parser;
pub mod csv_printer;

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub primary_balance: Balance,
    pub counterparty_balance: Balance,
    pub oracle: Arc<dyn BalanceOracle>,
    pub error_printer: Box<dyn FnMut(u64, AccountError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub async fn run(mut self) -> Result<()> {
        let primary = Account::with_oracle(self.primary_balance, self.oracle.clone());
        let counterparty = Account::with_oracle(self.counterparty_balance, self.oracle.clone());

        let parser =
            CsvOperationParser::new(self.input).context("Failed to read operation script header")?;
        for row in parser {
            let (line, operation) = row.context("Failed to parse operation script")?;
            let step = Step::try_from(operation)
                .with_context(|| format!("Invalid operation at line {line}"))?;

            let result = match step {
                Step::Deposit(amount) => primary.deposit(amount),
                Step::Withdraw(amount) => primary.withdraw(amount),
                Step::Transfer { amount, target } => {
                    let target = match target {
                        AccountRole::Primary => &primary,
                        AccountRole::Counterparty => &counterparty,
                    };
                    primary.transfer(amount, target)
                }
                Step::Sync => primary.synchronize_balance().await,
            };
            if let Err(err) = result {
                (self.error_printer)(line, err);
            }
        }

        print_balances(
            self.output,
            [
                BalanceRow::snapshot(AccountRole::Primary, &primary),
                BalanceRow::snapshot(AccountRole::Counterparty, &counterparty),
            ],
        )
    }
}
