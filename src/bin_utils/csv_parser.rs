use std::io::Read;

use csv::{StringRecord, StringRecordsIntoIter, Trim};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::Balance;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Deposit,
    Withdraw,
    Transfer,
    Sync,
}

/// Which of the two session accounts a row refers to
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Primary,
    Counterparty,
}

#[derive(Debug, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub amount: Option<Balance>,
    pub target: Option<AccountRole>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Deposit(Balance),
    Withdraw(Balance),
    Transfer { amount: Balance, target: AccountRole },
    Sync,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Amount is required for {kind:?}")]
    AmountRequired { kind: OperationKind },
    #[error("Target account is required for Transfer")]
    TargetRequired,
}

impl TryFrom<Operation> for Step {
    type Error = ScriptError;

    fn try_from(operation: Operation) -> Result<Self, Self::Error> {
        let kind = operation.kind;
        let amount = || operation.amount.ok_or(ScriptError::AmountRequired { kind });
        match kind {
            OperationKind::Deposit => Ok(Step::Deposit(amount()?)),
            OperationKind::Withdraw => Ok(Step::Withdraw(amount()?)),
            OperationKind::Transfer => Ok(Step::Transfer {
                amount: amount()?,
                target: operation.target.ok_or(ScriptError::TargetRequired)?,
            }),
            OperationKind::Sync => Ok(Step::Sync),
        }
    }
}

/// Parses an operation script in CSV format, yielding each row together with
/// the line it was read from.
pub struct CsvOperationParser<R> {
    headers: StringRecord,
    records: StringRecordsIntoIter<R>,
}

impl<R> CsvOperationParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);
        let headers = reader.headers()?.clone();

        Ok(Self {
            headers,
            records: reader.into_records(),
        })
    }
}

impl<R> Iterator for CsvOperationParser<R>
where
    R: Read,
{
    type Item = Result<(u64, Operation), csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(err) => return Some(Err(err)),
        };
        let line = record.position().map_or(0, |pos| pos.line());
        Some(
            record
                .deserialize(Some(&self.headers))
                .map(|operation| (line, operation)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_operations() {
        let script = "type, amount, target\n\
                      deposit, 50\n\
                      withdraw, 10,\n\
                      transfer, 20, counterparty\n\
                      sync\n";
        let rows: Vec<_> = CsvOperationParser::new(script.as_bytes())
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows.iter().map(|(line, _)| *line).collect::<Vec<_>>(),
            vec![2, 3, 4, 5]
        );

        let steps: Vec<Step> = rows
            .into_iter()
            .map(|(_, op)| Step::try_from(op).unwrap())
            .collect();
        assert_eq!(
            steps,
            vec![
                Step::Deposit(50),
                Step::Withdraw(10),
                Step::Transfer {
                    amount: 20,
                    target: AccountRole::Counterparty
                },
                Step::Sync,
            ]
        );
    }

    #[test]
    fn missing_columns() {
        let op = Operation {
            kind: OperationKind::Withdraw,
            amount: None,
            target: None,
        };
        assert_eq!(
            Step::try_from(op).unwrap_err(),
            ScriptError::AmountRequired {
                kind: OperationKind::Withdraw
            }
        );

        let op = Operation {
            kind: OperationKind::Transfer,
            amount: Some(5),
            target: None,
        };
        assert_eq!(Step::try_from(op).unwrap_err(), ScriptError::TargetRequired);
    }

    #[test]
    fn malformed_row() {
        let script = "type, amount, target\ndeposit, -5\n";
        let mut parser = CsvOperationParser::new(script.as_bytes()).unwrap();
        assert!(parser.next().unwrap().is_err());
        assert!(parser.next().is_none());
    }
}
