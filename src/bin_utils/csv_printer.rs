use std::io::Write;

use anyhow::Context;
use csv::Writer;
use serde::Serialize;

use crate::account::{Account, AccountId};
use crate::command::Balance;

use super::csv_parser::AccountRole;

#[derive(Debug, Serialize)]
pub struct BalanceRow {
    pub account: AccountRole,
    pub id: AccountId,
    pub balance: Balance,
}

impl BalanceRow {
    pub fn snapshot(role: AccountRole, account: &Account) -> Self {
        Self {
            account: role,
            id: account.id(),
            balance: account.balance(),
        }
    }
}

/// Writes one `account,id,balance` row per account.
pub fn print_balances<W>(output: &mut W, rows: impl IntoIterator<Item = BalanceRow>) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for row in rows {
        writer
            .serialize(&row)
            .with_context(|| format!("Failed to write balance of {:?} account", row.account))?;
    }
    writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::from_utf8;

    use super::*;

    #[test]
    fn print_header_and_rows() {
        let primary = Account::new(50);
        let counterparty = Account::new(400);
        let mut output = Vec::new();
        print_balances(
            &mut output,
            [
                BalanceRow::snapshot(AccountRole::Primary, &primary),
                BalanceRow::snapshot(AccountRole::Counterparty, &counterparty),
            ],
        )
        .unwrap();

        let text = from_utf8(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "account,id,balance".to_string(),
                format!("primary,{},50", primary.id()),
                format!("counterparty,{},400", counterparty.id()),
            ]
        );
    }
}
