use std::thread;

use bank_account::account::{Account, AccountError};

#[test]
fn opposite_transfers_keep_total() {
    let a = Account::new(10_000);
    let b = Account::new(10_000);

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let (source, target) = if i % 2 == 0 {
                (a.clone(), b.clone())
            } else {
                (b.clone(), a.clone())
            };
            thread::spawn(move || {
                for amount in 1..=500 {
                    match source.transfer(amount % 37 + 1, &target) {
                        Ok(()) | Err(AccountError::InsufficientFunds { .. }) => {}
                        Err(err) => panic!("unexpected error: {err}"),
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(a.balance() + b.balance(), 20_000);
}

#[test]
fn concurrent_withdrawals_never_overdraw() {
    let account = Account::new(1_000);

    let workers: Vec<_> = (0..10)
        .map(|_| {
            let account = account.clone();
            thread::spawn(move || {
                let mut withdrawn = 0;
                for _ in 0..50 {
                    if account.withdraw(3).is_ok() {
                        withdrawn += 3;
                    }
                }
                withdrawn
            })
        })
        .collect();
    let withdrawn: u64 = workers.into_iter().map(|w| w.join().unwrap()).sum();

    // 1000 is not a multiple of 3, so one unit is always left behind
    assert_eq!(withdrawn, 999);
    assert_eq!(account.balance(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn synchronize_while_transferring() {
    use std::sync::Arc;

    use bank_account::oracle::StaticBalanceOracle;

    let a = Account::with_oracle(500, Arc::new(StaticBalanceOracle(Some(42))));
    let b = Account::new(500);

    let transfers = {
        let (a, b) = (a.clone(), b.clone());
        tokio::task::spawn_blocking(move || {
            for _ in 0..100 {
                let _ = a.transfer(1, &b);
            }
        })
    };
    let sync = {
        let a = a.clone();
        tokio::spawn(async move { a.synchronize_balance().await })
    };
    transfers.await.unwrap();
    sync.await.unwrap().unwrap();

    assert!(a.balance() <= 500);
    assert!(b.balance() >= 500);
}
