use thiserror::Error;

pub type Balance = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceAction {
    Deposit,
    Withdraw,
    Transfer,
}

#[derive(Debug, Clone, Copy)]
pub struct BalanceCommand {
    pub action: BalanceAction,
    pub amount: Balance,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountCommandError {
    #[error("Amount must be positive for {action:?}")]
    ZeroAmount { action: BalanceAction },
}

impl BalanceCommand {
    pub fn parse(action: BalanceAction, amount: Balance) -> Result<Self, AccountCommandError> {
        if amount == 0 {
            return Err(AccountCommandError::ZeroAmount { action });
        }
        Ok(Self { action, amount })
    }
}
