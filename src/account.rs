use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::command::{AccountCommandError, Balance, BalanceAction, BalanceCommand};
use crate::oracle::{BalanceOracle, RandomBalanceOracle};

static NEXT_ACCOUNT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountId(u64);

impl AccountId {
    fn next() -> Self {
        Self(NEXT_ACCOUNT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AccountEventKind {
    Deposited,
    Withdrawn,
    /// Balance replaced by the value reported by the oracle
    Synchronized,
}

#[derive(Debug, Clone, Copy)]
pub struct AccountEvent {
    amount: Balance,
    kind: AccountEventKind,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Insufficient funds: cannot withdraw more than {balance}")]
    InsufficientFunds { balance: Balance },
    #[error("Transfer failed")]
    TransferFailed,
    #[error("Synchronization failed")]
    SynchronizationFailed,
    #[error("Balance overflow: cannot deposit {amount} on top of {balance}")]
    BalanceOverflow { balance: Balance, amount: Balance },
    #[error(transparent)]
    Command(#[from] AccountCommandError),
}

#[derive(Debug, Default)]
struct AccountState {
    balance: Balance,
}

impl AccountState {
    fn apply(&mut self, event: &AccountEvent) {
        match event.kind {
            AccountEventKind::Deposited => {
                self.balance += event.amount;
            }
            AccountEventKind::Withdrawn => {
                self.balance -= event.amount;
            }
            AccountEventKind::Synchronized => {
                self.balance = event.amount;
            }
        }
    }

    fn handle_credit(&self, command: &BalanceCommand) -> Result<AccountEvent, AccountError> {
        if self.balance.checked_add(command.amount).is_none() {
            return Err(AccountError::BalanceOverflow {
                balance: self.balance,
                amount: command.amount,
            });
        }
        Ok(AccountEvent {
            amount: command.amount,
            kind: AccountEventKind::Deposited,
        })
    }

    fn handle_debit(&self, command: &BalanceCommand) -> Result<AccountEvent, AccountError> {
        if self.balance >= command.amount {
            Ok(AccountEvent {
                amount: command.amount,
                kind: AccountEventKind::Withdrawn,
            })
        } else {
            Err(AccountError::InsufficientFunds {
                balance: self.balance,
            })
        }
    }

    fn handle_synchronize(&self, balance: Balance) -> AccountEvent {
        AccountEvent {
            amount: balance,
            kind: AccountEventKind::Synchronized,
        }
    }
}

struct AccountInner {
    id: AccountId,
    state: Mutex<AccountState>,
    oracle: Arc<dyn BalanceOracle>,
}

/// Handle to a single account.
///
/// Cloning the handle does not copy the account: every clone shares the same
/// id and balance, so `account.transfer(n, &account.clone())` is a
/// self-transfer. Handles are `Send + Sync` and each account serializes its
/// own mutations behind a mutex.
#[derive(Clone)]
pub struct Account {
    inner: Arc<AccountInner>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id())
            .field("balance", &self.balance())
            .finish()
    }
}

impl Account {
    /// Creates an account reconciled against [`RandomBalanceOracle`].
    pub fn new(initial_balance: Balance) -> Self {
        Self::with_oracle(initial_balance, Arc::new(RandomBalanceOracle::default()))
    }

    pub fn with_oracle(initial_balance: Balance, oracle: Arc<dyn BalanceOracle>) -> Self {
        Self {
            inner: Arc::new(AccountInner {
                id: AccountId::next(),
                state: Mutex::new(AccountState {
                    balance: initial_balance,
                }),
                oracle,
            }),
        }
    }

    pub fn id(&self) -> AccountId {
        self.inner.id
    }

    pub fn balance(&self) -> Balance {
        self.lock().balance
    }

    pub fn deposit(&self, amount: Balance) -> Result<(), AccountError> {
        let command = BalanceCommand::parse(BalanceAction::Deposit, amount)?;
        let mut state = self.lock();
        let event = state.handle_credit(&command)?;
        state.apply(&event);
        debug!(account.id = %self.id(), amount, balance = state.balance, "deposited");
        Ok(())
    }

    pub fn withdraw(&self, amount: Balance) -> Result<(), AccountError> {
        let command = BalanceCommand::parse(BalanceAction::Withdraw, amount)?;
        let mut state = self.lock();
        let event = state.handle_debit(&command)?;
        state.apply(&event);
        debug!(account.id = %self.id(), amount, balance = state.balance, "withdrawn");
        Ok(())
    }

    /// Moves `amount` from this account into `target`.
    ///
    /// Both sides are validated before either is applied, and both locks are
    /// held until the end, so a failure never leaves only one side changed.
    pub fn transfer(&self, amount: Balance, target: &Account) -> Result<(), AccountError> {
        if Arc::ptr_eq(&self.inner, &target.inner) {
            return Err(AccountError::TransferFailed);
        }
        let command = BalanceCommand::parse(BalanceAction::Transfer, amount)?;
        let (mut source, mut destination) = self.lock_pair(target);

        let debit = source.handle_debit(&command)?;
        let credit = destination.handle_credit(&command)?;
        source.apply(&debit);
        destination.apply(&credit);

        debug!(
            account.id = %self.id(),
            counterparty.id = %target.id(),
            amount,
            balance = source.balance,
            counterparty.balance = destination.balance,
            "transferred"
        );
        Ok(())
    }

    /// Asks the oracle for the authoritative balance without touching the
    /// account.
    pub async fn fetch_balance(&self) -> Option<Balance> {
        self.inner.oracle.fetch_balance().await
    }

    /// Overwrites the balance with the oracle's value.
    ///
    /// The account is not locked while the oracle is awaited.
    pub async fn synchronize_balance(&self) -> Result<(), AccountError> {
        let Some(balance) = self.fetch_balance().await else {
            warn!(account.id = %self.id(), "balance oracle returned no data");
            return Err(AccountError::SynchronizationFailed);
        };
        let mut state = self.lock();
        let event = state.handle_synchronize(balance);
        state.apply(&event);
        debug!(account.id = %self.id(), balance, "synchronized");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, AccountState> {
        // the balance is only ever assigned validated values, so a poisoned
        // lock still guards a consistent state
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks `self` and `other` in ascending id order, returned as
    /// `(self, other)`.
    fn lock_pair<'a>(
        &'a self,
        other: &'a Account,
    ) -> (MutexGuard<'a, AccountState>, MutexGuard<'a, AccountState>) {
        if self.id() < other.id() {
            let first = self.lock();
            let second = other.lock();
            (first, second)
        } else {
            let second = other.lock();
            let first = self.lock();
            (first, second)
        }
    }
}
